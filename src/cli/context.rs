use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use time::{UtcOffset, macros::format_description};
use tracing::{info, warn};
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{
    AppConfig, ExecutionConfig, LoggingConfig, LoggingProfile, OfframpTargets,
    load_deployment_state,
};
use crate::sui::{FaucetClient, Network, SigningIdentity, SuiRpcClient};

const QUIET_TARGETS: &[(&str, &str)] = &[("hyper", "warn"), ("rustls", "warn")];
const VERBOSE_TARGETS: &[&str] = &["ptb", "flows", "sui::rpc", "sui::tx", "faucet"];

/// lean 压低 HTTP 栈日志（`level` 中已显式指定的模块除外）；verbose 打开构造与提交细节。
fn profile_directives(config: &LoggingConfig) -> Vec<String> {
    let mut directives = Vec::new();
    if matches!(config.profile, LoggingProfile::Lean) {
        directives.extend(
            QUIET_TARGETS
                .iter()
                .filter(|(module, _)| !config.level.contains(module))
                .map(|(module, level)| format!("{module}={level}")),
        );
    }
    if config.profile.is_verbose() {
        directives.extend(VERBOSE_TARGETS.iter().map(|module| format!("{module}=debug")));
    }
    directives
}

/// 日志统一写 stderr，stdout 只留给 PTB 清单与回执。
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let mut filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    for directive in profile_directives(config) {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    let offset = UtcOffset::from_hms(config.timezone_offset_hours, 0, 0).map_err(|err| {
        anyhow!("日志时区偏移 {} 非法: {err}", config.timezone_offset_hours)
    })?;
    let timer = OffsetTime::new(
        offset,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"),
    );

    let builder = fmt()
        .with_timer(timer)
        .with_writer(std::io::stderr)
        .with_env_filter(filter);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    installed.map_err(|err| anyhow!(err.to_string()))
}

/// 网络优先级：命令行 `--network` > 部署状态中的节点 URL > 配置 `global.network`。
pub fn resolve_network(
    cli_network: Option<&str>,
    fallback_url: Option<&str>,
    config: &AppConfig,
) -> Result<Network> {
    let (source, raw) = match (cli_network, fallback_url) {
        (Some(value), _) => ("--network", value),
        (None, Some(url)) => ("deployment", url),
        (None, None) => ("config", config.global.network.as_str()),
    };
    let network = raw
        .parse::<Network>()
        .map_err(|err| anyhow!("解析网络失败（来源 {source}）: {err}"))?;
    info!(
        target: "cli",
        source,
        network = %network,
        fullnode = network.fullnode_url(),
        "已选定网络"
    );
    Ok(network)
}

pub fn load_identity(private_key: Option<&str>, env_name: &str) -> Result<SigningIdentity> {
    let encoded = private_key
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("缺少签名私钥：请设置 {env_name} 或传入 --private-key"))?;
    SigningIdentity::from_base64(encoded).with_context(|| format!("解析 {env_name} 失败"))
}

/// 私钥缺省时生成临时身份，适用于本地网络配合 faucet 使用。
pub fn load_or_generate_identity(private_key: Option<&str>) -> Result<SigningIdentity> {
    match private_key.map(str::trim).filter(|value| !value.is_empty()) {
        Some(encoded) => {
            SigningIdentity::from_base64(encoded).context("解析 PRIVATE_KEY_B64 失败")
        }
        None => {
            let identity = SigningIdentity::generate();
            warn!(
                target: "cli",
                address = %identity.address(),
                "未提供 PRIVATE_KEY_B64，已生成临时密钥"
            );
            Ok(identity)
        }
    }
}

pub fn build_rpc_client(network: &Network, execution: &ExecutionConfig) -> Result<SuiRpcClient> {
    SuiRpcClient::new(
        network.fullnode_url(),
        Duration::from_millis(execution.request_timeout_ms),
    )
    .context("初始化 Sui RPC 客户端失败")
}

pub fn build_faucet_client(network: &Network, execution: &ExecutionConfig) -> Result<FaucetClient> {
    let host = network
        .faucet_url()
        .ok_or_else(|| anyhow!("网络 {network} 没有可用的 faucet"))?;
    FaucetClient::new(host, Duration::from_millis(execution.request_timeout_ms))
        .context("初始化 faucet 客户端失败")
}

/// 部署状态文件存在时以其为准，否则回退到环境变量。
pub fn resolve_offramp_targets(state_path: &Path) -> Result<OfframpTargets> {
    if state_path.exists() {
        let state = load_deployment_state(state_path)?;
        return OfframpTargets::from_state(&state)
            .with_context(|| format!("部署状态 {} 不完整", state_path.display()));
    }
    warn!(
        target: "cli",
        path = %state_path.display(),
        "未找到部署状态文件，改从环境变量读取"
    );
    OfframpTargets::from_env(|key| std::env::var(key).ok()).context("环境变量配置不完整")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_network_overrides_deployment_and_config() {
        let config = AppConfig::default();
        let network = resolve_network(Some("devnet"), Some("http://127.0.0.1:9000"), &config)
            .expect("network");
        assert_eq!(network, Network::Devnet);

        let network =
            resolve_network(None, Some("http://10.0.0.5:9000"), &config).expect("network");
        assert!(matches!(network, Network::Custom(_)));

        let network = resolve_network(None, None, &config).expect("network");
        assert_eq!(network, Network::Testnet);
    }

    #[test]
    fn state_file_node_url_can_be_funded_from_local_faucet() {
        let config = AppConfig::default();
        let network =
            resolve_network(None, Some("http://127.0.0.1:9000"), &config).expect("network");
        assert_eq!(network, Network::Localnet);
        let faucet =
            build_faucet_client(&network, &config.execution).expect("localnet faucet client");
        assert_eq!(faucet.host(), "http://127.0.0.1:9123");
    }

    #[test]
    fn env_targets_default_to_localnet_unless_overridden() {
        let config = AppConfig::default();
        let targets = OfframpTargets::from_env(|key| match key {
            "CCIP_PACKAGE_ID" => Some("0x1".to_string()),
            "OFFRAMP_PACKAGE_ID" => Some("0x2".to_string()),
            "CCIP_OBJECT_REF" => Some("0x3".to_string()),
            "OFFRAMP_STATE" => Some("0x4".to_string()),
            _ => None,
        })
        .expect("env targets");

        let network =
            resolve_network(None, targets.network_url.as_deref(), &config).expect("network");
        assert_eq!(network, Network::Localnet);

        let network = resolve_network(Some("devnet"), targets.network_url.as_deref(), &config)
            .expect("network");
        assert_eq!(network, Network::Devnet);
    }

    #[test]
    fn lean_profile_keeps_explicit_levels() {
        let mut logging = AppConfig::default().global.logging;
        logging.profile = LoggingProfile::Lean;
        logging.level = "info,hyper=debug".to_string();
        assert_eq!(profile_directives(&logging), vec!["rustls=warn".to_string()]);

        logging.profile = LoggingProfile::Verbose;
        let directives = profile_directives(&logging);
        assert!(directives.contains(&"sui::rpc=debug".to_string()));
        assert!(!directives.iter().any(|d| d.starts_with("rustls")));
    }

    #[test]
    fn missing_key_names_the_variable() {
        let err = load_identity(None, "SUI_PRIVATE_KEY").expect_err("missing key");
        assert!(err.to_string().contains("SUI_PRIVATE_KEY"));
        assert!(load_identity(Some("  "), "SUI_PRIVATE_KEY").is_err());
    }

    #[test]
    fn mainnet_has_no_faucet() {
        let execution = ExecutionConfig::default();
        assert!(build_faucet_client(&Network::Mainnet, &execution).is_err());
        let faucet = build_faucet_client(&Network::Localnet, &execution).expect("localnet faucet");
        assert_eq!(faucet.host(), "http://127.0.0.1:9123");
    }

    #[test]
    fn existing_state_file_takes_precedence() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("state.json");
        std::fs::write(
            &path,
            r#"{"ccip_package_id":"0x1","offramp_package_id":"0x2",
                "ccip_object_ref_object_id":"0x3","offramp_state_object_id":"0x4"}"#,
        )
        .expect("write state");
        let targets = resolve_offramp_targets(&path).expect("targets");
        assert_eq!(targets.offramp_state.to_string(), format!("0x{:064x}", 4));
    }
}
