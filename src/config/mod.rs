pub mod deployment;
pub mod loader;
pub mod types;

pub use deployment::*;
pub use loader::*;
pub use types::*;

use self::types as cfg;

pub(crate) fn default_network() -> String {
    "testnet".to_string()
}

pub(crate) fn default_logging_level() -> String {
    "info".to_string()
}

pub(crate) fn default_logging_profile() -> cfg::LoggingProfile {
    cfg::LoggingProfile::Lean
}

pub(crate) fn default_timezone_offset_hours() -> i8 {
    0
}

pub(crate) fn default_gas_budget() -> u64 {
    crate::flows::offramp::DEFAULT_GAS_BUDGET
}

pub(crate) fn default_request_timeout_ms() -> u64 {
    30_000
}

pub(crate) fn default_min_balance_mist() -> u64 {
    1_000_000_000
}

pub(crate) fn default_funding_max_attempts() -> u32 {
    5
}

pub(crate) fn default_funding_initial_backoff_ms() -> u64 {
    1_000
}

pub(crate) fn default_funding_max_backoff_ms() -> u64 {
    8_000
}

impl Default for cfg::AppConfig {
    fn default() -> Self {
        Self {
            global: cfg::GlobalConfig::default(),
            execution: cfg::ExecutionConfig::default(),
            funding: cfg::FundingConfig::default(),
        }
    }
}

impl Default for cfg::GlobalConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            logging: cfg::LoggingConfig::default(),
        }
    }
}

impl Default for cfg::LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_logging_level(),
            json: false,
            profile: default_logging_profile(),
            timezone_offset_hours: default_timezone_offset_hours(),
        }
    }
}

impl Default for cfg::ExecutionConfig {
    fn default() -> Self {
        Self {
            gas_budget: default_gas_budget(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for cfg::FundingConfig {
    fn default() -> Self {
        Self {
            min_balance_mist: default_min_balance_mist(),
            max_attempts: default_funding_max_attempts(),
            initial_backoff_ms: default_funding_initial_backoff_ms(),
            max_backoff_ms: default_funding_max_backoff_ms(),
        }
    }
}
