use anyhow::{Context, Result};
use tracing::info;

use crate::cli::args::{AccountArgs, Cli, Command, ExecuteArgs, SendArgs, SubmitArgs};
use crate::cli::context::{
    build_faucet_client, build_rpc_client, load_identity, load_or_generate_identity,
    resolve_network, resolve_offramp_targets,
};
use crate::cli::report::{print_batch, print_receipt};
use crate::config::AppConfig;
use crate::flows::offramp::{DEFAULT_PAYLOAD, DEFAULT_SOURCE_CHAIN_SELECTOR, MESSAGE_ID_LENGTH};
use crate::flows::{
    CompletionParams, SendBatch, SendParams, build_completion_batch, build_send_batch,
};
use crate::ptb::{Batch, TypeTag, parse_bytes, parse_object_id, parse_optional_bytes, parse_u64};
use crate::sui::{
    ExecutionClient, FundingPolicy, Network, SigningIdentity, SubmitError, ensure_funded,
};

const SEND_KEY_ENV: &str = "SUI_PRIVATE_KEY";

pub async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let network_override = cli.network.as_deref();
    match cli.command {
        Command::Send(args) => run_send(args, network_override, &config).await,
        Command::Execute(args) => run_execute(args, network_override, &config).await,
        Command::Balance(args) => run_balance(args, network_override, &config).await,
        Command::Fund(args) => run_fund(args, network_override, &config).await,
    }
}

pub fn send_params_from_args(args: &SendArgs) -> Result<SendParams> {
    let pool_state = args
        .managed_token_state
        .as_deref()
        .map(|value| parse_object_id("managed_token_state", value))
        .transpose()?;
    Ok(SendParams {
        onramp_package: parse_object_id("onramp_pkg", &args.onramp_package)?,
        pool_package: parse_object_id("pool_pkg", &args.pool_package)?,
        coin_type: TypeTag::parse(&args.coin_type)?,
        ccip_object_ref: parse_object_id("ccip_object_ref", &args.ccip_object_ref)?,
        onramp_state: parse_object_id("onramp_state", &args.onramp_state)?,
        fee_token_metadata: parse_object_id("fee_token_metadata", &args.fee_token_metadata)?,
        fee_token_coin: parse_object_id("fee_token_coin", &args.fee_token_coin)?,
        pool_state,
        dest_chain_selector: parse_u64("dest_chain_selector", &args.dest_chain_selector)?,
        receiver: parse_bytes("receiver", &args.receiver)?,
        data: parse_optional_bytes("data", args.data.as_deref())?,
        extra_args: parse_optional_bytes("extra_args", args.extra_args.as_deref())?,
        pool_kind: args.pool_kind,
    })
}

pub fn completion_params_from_args(
    args: &ExecuteArgs,
    targets: &crate::config::OfframpTargets,
    sender: &SigningIdentity,
) -> Result<CompletionParams> {
    let source_chain_selector = match args.source_chain_selector.as_deref() {
        Some(raw) => parse_u64("source_chain_selector", raw)?,
        None => DEFAULT_SOURCE_CHAIN_SELECTOR,
    };
    let message_id = match args.message_id.as_deref() {
        Some(raw) => parse_bytes("message_id", raw)?,
        None => vec![0u8; MESSAGE_ID_LENGTH],
    };
    let data = match args.data.as_deref() {
        Some(raw) => parse_bytes("data", raw)?,
        None => DEFAULT_PAYLOAD.to_vec(),
    };
    Ok(CompletionParams {
        ccip_package: targets.ccip_package,
        offramp_package: targets.offramp_package,
        offramp_state: targets.offramp_state,
        source_chain_selector,
        message_id,
        sender: sender.address().as_bytes().to_vec(),
        data,
    })
}

fn build_send(args: &SendArgs) -> Result<SendBatch> {
    let params = send_params_from_args(args)?;
    let built = build_send_batch(&params)?;
    info!(
        target: "cli",
        pool_kind = %params.pool_kind,
        lock_or_burn = built.lock_or_burn.index(),
        send = built.send.index(),
        "onramp PTB 构造完成"
    );
    Ok(built)
}

async fn run_send(args: SendArgs, network: Option<&str>, config: &AppConfig) -> Result<()> {
    if args.submit.dry_run {
        let built = build_send(&args)?;
        return finish_dry_run(built.batch, &args.submit, config);
    }

    let identity = load_identity(args.private_key.as_deref(), SEND_KEY_ENV)?;
    let built = build_send(&args)?;
    let network = resolve_network(network, None, config)?;
    let client = build_rpc_client(&network, &config.execution)?;
    submit(&client, built.batch, &args.submit, config, &identity).await
}

async fn run_execute(args: ExecuteArgs, network: Option<&str>, config: &AppConfig) -> Result<()> {
    let targets = resolve_offramp_targets(&args.state)?;
    let identity = load_or_generate_identity(args.private_key.as_deref())?;
    info!(
        target: "cli",
        address = %identity.address(),
        ccip_package = %targets.ccip_package,
        offramp_package = %targets.offramp_package,
        ccip_object_ref = %targets.ccip_object_ref,
        offramp_state = %targets.offramp_state,
        receiver_package = ?targets.receiver_package,
        "offramp 目标已解析"
    );

    let params = completion_params_from_args(&args, &targets, &identity)?;
    let built = build_completion_batch(&params)?;

    if args.submit.dry_run {
        return finish_dry_run(built.batch, &args.submit, config);
    }

    let network = resolve_network(network, targets.network_url.as_deref(), config)?;
    let client = build_rpc_client(&network, &config.execution)?;

    if should_fund(args.no_fund, &network) {
        let faucet = build_faucet_client(&network, &config.execution)?;
        let policy = FundingPolicy::from(&config.funding);
        let balance = ensure_funded(&client, &faucet, identity.address(), &policy)
            .await
            .context("领水失败，终止提交")?;
        info!(target: "cli", balance, "余额已满足要求");
    } else if !args.no_fund {
        info!(target: "cli", network = %network, "该网络没有 faucet，跳过领水");
    }

    submit(&client, built.batch, &args.submit, config, &identity).await
}

async fn run_balance(args: AccountArgs, network: Option<&str>, config: &AppConfig) -> Result<()> {
    let identity = load_identity(args.private_key.as_deref(), SEND_KEY_ENV)?;
    let network = resolve_network(network, None, config)?;
    let client = build_rpc_client(&network, &config.execution)?;
    let balance = client.balance(identity.address()).await?;
    println!("address: {}", identity.address());
    println!("balance: {balance} MIST");
    Ok(())
}

async fn run_fund(args: AccountArgs, network: Option<&str>, config: &AppConfig) -> Result<()> {
    let identity = load_identity(args.private_key.as_deref(), SEND_KEY_ENV)?;
    let network = resolve_network(network, None, config)?;
    let client = build_rpc_client(&network, &config.execution)?;
    let faucet = build_faucet_client(&network, &config.execution)?;
    let policy = FundingPolicy::from(&config.funding);
    let balance = ensure_funded(&client, &faucet, identity.address(), &policy).await?;
    println!("address: {}", identity.address());
    println!("balance: {balance} MIST");
    Ok(())
}

/// 有 faucet 的网络默认在提交前补足余额。
fn should_fund(no_fund: bool, network: &Network) -> bool {
    !no_fund && network.faucet_url().is_some()
}

fn gas_budget(options: &SubmitArgs, config: &AppConfig) -> u64 {
    options.gas_budget.unwrap_or(config.execution.gas_budget)
}

fn finish_dry_run(batch: Batch, options: &SubmitArgs, config: &AppConfig) -> Result<()> {
    let sealed = batch.finalize(gas_budget(options, config))?;
    print_batch(&sealed);
    info!(target: "cli", batch = sealed.batch_id(), "dry-run 模式，未提交交易");
    Ok(())
}

async fn submit<C>(
    client: &C,
    batch: Batch,
    options: &SubmitArgs,
    config: &AppConfig,
    identity: &SigningIdentity,
) -> Result<()>
where
    C: ExecutionClient + ?Sized,
{
    let sealed = batch.finalize(gas_budget(options, config))?;
    match client.submit(sealed, identity).await {
        Ok(receipt) => {
            print_receipt(&receipt);
            Ok(())
        }
        Err(err) => {
            if let SubmitError::Execution { receipt, .. } = &err {
                print_receipt(receipt);
            }
            Err(err).context("PTB 提交失败")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use async_trait::async_trait;

    use super::*;
    use crate::config::OfframpTargets;
    use crate::flows::PoolKind;
    use crate::ptb::{BuildError, EncodingError, ObjectId, SubmittableBatch};
    use crate::sui::{ExecutionReceipt, ExecutionStatus, GasSummary};

    struct AbortingClient;

    #[async_trait]
    impl ExecutionClient for AbortingClient {
        async fn submit(
            &self,
            batch: SubmittableBatch,
            _identity: &SigningIdentity,
        ) -> Result<ExecutionReceipt, SubmitError> {
            ExecutionReceipt {
                digest: format!("batch-{}", batch.batch_id()),
                status: ExecutionStatus::Failure("MoveAbort(offramp, 3)".to_string()),
                gas: GasSummary::default(),
                events: Vec::new(),
            }
            .into_result()
        }

        async fn balance(&self, _owner: ObjectId) -> Result<u64, SubmitError> {
            Ok(0)
        }
    }

    fn send_args() -> SendArgs {
        SendArgs {
            ccip_object_ref: "0x1c".to_string(),
            onramp_state: "0x1d".to_string(),
            fee_token_metadata: "0x1e".to_string(),
            fee_token_coin: "0x1f".to_string(),
            dest_chain_selector: "0xde41ba4fc9d91ad9".to_string(),
            receiver: "0x11223344".to_string(),
            data: None,
            onramp_package: "0x0a".to_string(),
            pool_package: "0x0b".to_string(),
            coin_type: "0x2::sui::SUI".to_string(),
            managed_token_state: Some("0x20".to_string()),
            pool_kind: PoolKind::BurnMint,
            extra_args: Some(String::new()),
            submit: SubmitArgs {
                gas_budget: None,
                dry_run: true,
            },
            private_key: None,
        }
    }

    #[test]
    fn send_args_are_decoded_into_params() {
        let params = send_params_from_args(&send_args()).expect("params");
        assert_eq!(params.dest_chain_selector, 16_015_286_601_757_825_753);
        assert_eq!(params.receiver, vec![0x11, 0x22, 0x33, 0x44]);
        assert!(params.data.is_empty());
        assert!(params.extra_args.is_empty());
        assert_eq!(params.pool_state, Some(ObjectId::from_low_u16(0x20)));

        let built = build_send_batch(&params).expect("send batch");
        assert_eq!(built.batch.move_calls().count(), 3);
    }

    #[test]
    fn malformed_selector_is_an_encoding_error() {
        let mut args = send_args();
        args.dest_chain_selector = "0xzz".to_string();
        let err = send_params_from_args(&args).expect_err("bad selector");
        let encoding = err.downcast_ref::<EncodingError>().expect("encoding error");
        assert_eq!(encoding.parameter, "dest_chain_selector");
    }

    #[test]
    fn missing_pool_state_fails_before_any_call() {
        let mut args = send_args();
        args.managed_token_state = None;
        let params = send_params_from_args(&args).expect("params");
        assert_eq!(
            build_send_batch(&params).unwrap_err(),
            BuildError::MissingPoolState { kind: "burn_mint" }
        );
    }

    #[test]
    fn execute_defaults_match_receiver_scenario() {
        let identity = SigningIdentity::generate();
        let targets = OfframpTargets {
            ccip_package: ObjectId::from_low_u16(1),
            offramp_package: ObjectId::from_low_u16(2),
            receiver_package: None,
            ccip_object_ref: ObjectId::from_low_u16(3),
            offramp_state: ObjectId::from_low_u16(4),
            network_url: None,
        };
        let args = ExecuteArgs {
            state: PathBuf::from("state.json"),
            source_chain_selector: None,
            message_id: None,
            data: None,
            no_fund: false,
            submit: SubmitArgs {
                gas_budget: Some(1),
                dry_run: true,
            },
            private_key: None,
        };
        let params = completion_params_from_args(&args, &targets, &identity).expect("params");
        assert_eq!(params.source_chain_selector, 2);
        assert_eq!(params.message_id, vec![0u8; 32]);
        assert_eq!(params.data, b"Hello World".to_vec());
        assert_eq!(params.sender, identity.address().as_bytes().to_vec());
        assert_eq!(gas_budget(&args.submit, &AppConfig::default()), 1);
    }

    #[tokio::test]
    async fn send_checks_signing_key_before_building() {
        let mut args = send_args();
        args.dest_chain_selector = "0xzz".to_string();
        args.submit.dry_run = false;
        let err = run_send(args, None, &AppConfig::default())
            .await
            .expect_err("missing key");
        assert!(err.downcast_ref::<EncodingError>().is_none());
        assert!(err.to_string().contains(SEND_KEY_ENV));
    }

    #[test]
    fn funding_runs_by_default_where_a_faucet_exists() {
        assert!(should_fund(false, &Network::Localnet));
        assert!(should_fund(false, &Network::Testnet));
        assert!(!should_fund(true, &Network::Localnet));
        assert!(!should_fund(false, &Network::Mainnet));
    }

    #[tokio::test]
    async fn failed_execution_keeps_receipt_in_error() {
        let built = build_send_batch(&send_params_from_args(&send_args()).expect("params"))
            .expect("send batch");
        let options = SubmitArgs {
            gas_budget: Some(10),
            dry_run: false,
        };
        let err = submit(
            &AbortingClient,
            built.batch,
            &options,
            &AppConfig::default(),
            &SigningIdentity::generate(),
        )
        .await
        .expect_err("aborted");
        match err.downcast_ref::<SubmitError>() {
            Some(SubmitError::Execution { message, receipt, .. }) => {
                assert!(message.contains("MoveAbort"));
                assert!(receipt.digest.starts_with("batch-"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
