use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_STATE_PATH;
use crate::flows::PoolKind;
use crate::flows::onramp::DEFAULT_COIN_TYPE;

#[derive(Parser, Debug)]
#[command(name = "ccip-cli", version, about = "Sui CCIP 可编程交易块构造与提交工具")]
pub struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径（默认查找 ccip.toml 或 config/ccip.toml）"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "NETWORK",
        help = "mainnet / testnet / devnet / localnet 或全节点 URL，覆盖配置中的 global.network"
    )]
    pub network: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 构造并提交 onramp ccip_send PTB
    #[command(name = "send", visible_aliases = ["s", "onramp"])]
    Send(SendArgs),
    /// 构造并提交 offramp 完成 PTB（init_execute → finish_execute）
    #[command(name = "execute", visible_alias = "offramp")]
    Execute(ExecuteArgs),
    /// 查看签名地址与 SUI 余额
    Balance(AccountArgs),
    /// 余额不足时向 faucet 领水并等待到账
    Fund(AccountArgs),
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[arg(long, value_name = "OBJECT_ID", help = "CCIPObjectRef 共享对象")]
    pub ccip_object_ref: String,
    #[arg(long, value_name = "OBJECT_ID", help = "OnRampState 共享对象")]
    pub onramp_state: String,
    #[arg(long, value_name = "OBJECT_ID", help = "手续费代币的 CoinMetadata")]
    pub fee_token_metadata: String,
    #[arg(long, value_name = "OBJECT_ID", help = "用于支付手续费的 Coin 对象")]
    pub fee_token_coin: String,
    #[arg(long, value_name = "U64", help = "目标链 selector，十进制或 0x 十六进制")]
    pub dest_chain_selector: String,
    #[arg(long, value_name = "BYTES", help = "目标链接收方，0x 十六进制或 base64")]
    pub receiver: String,
    #[arg(long, value_name = "BYTES", help = "消息负载，0x 十六进制或 base64，缺省为空")]
    pub data: Option<String>,
    #[arg(
        long = "onramp-pkg",
        value_name = "PACKAGE_ID",
        env = "SUI_ONRAMP_PACKAGE_ID",
        help = "onramp 包 ID"
    )]
    pub onramp_package: String,
    #[arg(
        long = "pool-pkg",
        value_name = "PACKAGE_ID",
        env = "SUI_TOKEN_POOL_ID",
        help = "token pool 包 ID"
    )]
    pub pool_package: String,
    #[arg(long, value_name = "TYPE", default_value = DEFAULT_COIN_TYPE, help = "转移代币的 Move 类型")]
    pub coin_type: String,
    #[arg(long, value_name = "OBJECT_ID", help = "token pool 状态对象")]
    pub managed_token_state: Option<String>,
    #[arg(long, value_name = "KIND", help = "token pool 类型：burn_mint 或 lock_release")]
    pub pool_kind: PoolKind,
    #[arg(long, value_name = "BYTES", help = "ccip_send extra_args，缺省为空")]
    pub extra_args: Option<String>,
    #[command(flatten)]
    pub submit: SubmitArgs,
    #[arg(
        long,
        value_name = "BASE64",
        env = "SUI_PRIVATE_KEY",
        hide_env_values = true,
        help = "签名私钥（base64，32 字节或带 0x00 标记的 33 字节）"
    )]
    pub private_key: Option<String>,
}

#[derive(Args, Debug)]
pub struct ExecuteArgs {
    #[arg(
        long,
        value_name = "FILE",
        default_value = DEFAULT_STATE_PATH,
        help = "部署状态文件；不存在时改从环境变量读取包与对象 ID"
    )]
    pub state: PathBuf,
    #[arg(long, value_name = "U64", help = "源链 selector，缺省为 2")]
    pub source_chain_selector: Option<String>,
    #[arg(long, value_name = "BYTES", help = "32 字节消息 ID，缺省全零")]
    pub message_id: Option<String>,
    #[arg(long, value_name = "BYTES", help = "消息负载，缺省为 \"Hello World\"")]
    pub data: Option<String>,
    #[arg(long, help = "跳过提交前按 [funding] 策略进行的自动领水")]
    pub no_fund: bool,
    #[command(flatten)]
    pub submit: SubmitArgs,
    #[arg(
        long,
        value_name = "BASE64",
        env = "PRIVATE_KEY_B64",
        hide_env_values = true,
        help = "签名私钥（base64）；缺省时生成临时密钥"
    )]
    pub private_key: Option<String>,
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    #[arg(long, value_name = "MIST", help = "gas 预算，覆盖配置中的 execution.gas_budget")]
    pub gas_budget: Option<u64>,
    #[arg(long, help = "只构造并打印 PTB，不签名提交")]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct AccountArgs {
    #[arg(
        long,
        value_name = "BASE64",
        env = "SUI_PRIVATE_KEY",
        hide_env_values = true,
        help = "签名私钥（base64）"
    )]
    pub private_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn send_accepts_alias_and_pool_kind() {
        let cli = Cli::try_parse_from([
            "ccip-cli",
            "onramp",
            "--ccip-object-ref",
            "0x1",
            "--onramp-state",
            "0x2",
            "--fee-token-metadata",
            "0x3",
            "--fee-token-coin",
            "0x4",
            "--dest-chain-selector",
            "16015286601757825753",
            "--receiver",
            "0x11",
            "--onramp-pkg",
            "0xa",
            "--pool-pkg",
            "0xb",
            "--pool-kind",
            "lock_release",
            "--dry-run",
        ])
        .expect("parse send");
        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.pool_kind, PoolKind::LockRelease);
        assert_eq!(args.coin_type, DEFAULT_COIN_TYPE);
        assert!(args.submit.dry_run);
    }

    #[test]
    fn unknown_pool_kind_is_rejected_by_parser() {
        let result = Cli::try_parse_from([
            "ccip-cli",
            "send",
            "--ccip-object-ref",
            "0x1",
            "--onramp-state",
            "0x2",
            "--fee-token-metadata",
            "0x3",
            "--fee-token-coin",
            "0x4",
            "--dest-chain-selector",
            "1",
            "--receiver",
            "0x11",
            "--onramp-pkg",
            "0xa",
            "--pool-pkg",
            "0xb",
            "--pool-kind",
            "mint_only",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn execute_defaults_to_state_file() {
        let cli = Cli::try_parse_from(["ccip-cli", "--network", "localnet", "offramp", "--no-fund"])
            .expect("parse execute");
        assert_eq!(cli.network.as_deref(), Some("localnet"));
        let Command::Execute(args) = cli.command else {
            panic!("expected execute");
        };
        assert_eq!(args.state, PathBuf::from(DEFAULT_STATE_PATH));
        assert!(args.no_fund);
        assert!(args.submit.gas_budget.is_none());
    }
}
