use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub funding: FundingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    /// 网络别名（mainnet/testnet/devnet/localnet）或全节点 URL。
    #[serde(default = "super::default_network")]
    pub network: String,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingProfile {
    Lean,
    Verbose,
}

impl Default for LoggingProfile {
    fn default() -> Self {
        Self::Lean
    }
}

impl LoggingProfile {
    pub fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "super::default_logging_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    #[serde(default = "super::default_logging_profile")]
    pub profile: LoggingProfile,
    #[serde(default = "super::default_timezone_offset_hours")]
    pub timezone_offset_hours: i8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "super::default_gas_budget")]
    pub gas_budget: u64,
    #[serde(default = "super::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// 测试网络的领水策略：有界重试 + 指数退避。
#[derive(Debug, Clone, Deserialize)]
pub struct FundingConfig {
    #[serde(default = "super::default_min_balance_mist")]
    pub min_balance_mist: u64,
    #[serde(default = "super::default_funding_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "super::default_funding_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "super::default_funding_max_backoff_ms")]
    pub max_backoff_ms: u64,
}
