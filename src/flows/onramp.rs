//! 出站发送流程：创建代币转移参数 → token pool `lock_or_burn` → `onramp::ccip_send`。

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::ptb::{
    Argument, Batch, BuildError, CallDescriptor, MoveTarget, ObjectId, ResultHandle, TypeTag,
};

pub const STATE_HELPER_MODULE: &str = "onramp_state_helper";
pub const CREATE_TOKEN_PARAMS_FUNCTION: &str = "create_token_transfer_params";
pub const LOCK_OR_BURN_FUNCTION: &str = "lock_or_burn";
pub const ONRAMP_MODULE: &str = "onramp";
pub const CCIP_SEND_FUNCTION: &str = "ccip_send";
pub const DEFAULT_COIN_TYPE: &str = "0x2::sui::SUI";

/// token pool 的资产处理方式，封闭二选一。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolKind {
    BurnMint,
    LockRelease,
}

impl PoolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PoolKind::BurnMint => "burn_mint",
            PoolKind::LockRelease => "lock_release",
        }
    }

    pub fn pool_module(self) -> &'static str {
        match self {
            PoolKind::BurnMint => "burn_mint_token_pool",
            PoolKind::LockRelease => "lock_release_token_pool",
        }
    }
}

impl FromStr for PoolKind {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "burn_mint" => Ok(PoolKind::BurnMint),
            "lock_release" => Ok(PoolKind::LockRelease),
            other => Err(BuildError::UnknownPoolKind(other.to_string())),
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendParams {
    pub onramp_package: ObjectId,
    pub pool_package: ObjectId,
    pub coin_type: TypeTag,
    pub ccip_object_ref: ObjectId,
    pub onramp_state: ObjectId,
    pub fee_token_metadata: ObjectId,
    pub fee_token_coin: ObjectId,
    pub pool_state: Option<ObjectId>,
    pub dest_chain_selector: u64,
    pub receiver: Vec<u8>,
    pub data: Vec<u8>,
    pub extra_args: Vec<u8>,
    pub pool_kind: PoolKind,
}

#[derive(Debug)]
pub struct SendBatch {
    pub batch: Batch,
    pub token_params: ResultHandle,
    pub lock_or_burn: ResultHandle,
    pub send: ResultHandle,
}

pub fn build_send_batch(params: &SendParams) -> Result<SendBatch, BuildError> {
    let pool_state = params.pool_state.ok_or(BuildError::MissingPoolState {
        kind: params.pool_kind.as_str(),
    })?;

    let prepare_target = MoveTarget::new(
        params.onramp_package,
        STATE_HELPER_MODULE,
        CREATE_TOKEN_PARAMS_FUNCTION,
    )?;
    let send_target = MoveTarget::new(params.onramp_package, ONRAMP_MODULE, CCIP_SEND_FUNCTION)?;

    let (batch, token_params) = Batch::new().add_call(
        CallDescriptor::new(prepare_target)
            .with_type_arg(params.coin_type.clone())
            .arg(Argument::object(params.ccip_object_ref))
            .arg(Argument::object_mut(params.onramp_state))
            .arg(Argument::clock()),
    )?;

    let (batch, lock_or_burn) =
        batch.add_call(lock_or_burn_call(params, token_params, pool_state)?)?;

    let (batch, send) = batch.add_call(
        CallDescriptor::new(send_target)
            .with_type_arg(params.coin_type.clone())
            .arg(Argument::object_mut(params.ccip_object_ref))
            .arg(Argument::object_mut(params.onramp_state))
            .arg(Argument::clock())
            .arg(Argument::u64(params.dest_chain_selector))
            .arg(Argument::bytes(params.receiver.clone()))
            .arg(Argument::bytes(params.data.clone()))
            .arg(token_params)
            .arg(Argument::object(params.fee_token_metadata))
            .arg(Argument::object_mut(params.fee_token_coin))
            .arg(Argument::bytes(params.extra_args.clone())),
    )?;

    info!(
        target: "flows::onramp",
        batch = batch.id(),
        pool_kind = %params.pool_kind,
        dest_chain_selector = params.dest_chain_selector,
        coin_type = %params.coin_type,
        receiver_len = params.receiver.len(),
        data_len = params.data.len(),
        "ccip_send PTB 已构建"
    );

    Ok(SendBatch {
        batch,
        token_params,
        lock_or_burn,
        send,
    })
}

fn lock_or_burn_call(
    params: &SendParams,
    token_params: ResultHandle,
    pool_state: ObjectId,
) -> Result<CallDescriptor, BuildError> {
    let target = MoveTarget::new(
        params.pool_package,
        params.pool_kind.pool_module(),
        LOCK_OR_BURN_FUNCTION,
    )?;
    let call = CallDescriptor::new(target)
        .with_type_arg(params.coin_type.clone())
        .arg(Argument::object(params.ccip_object_ref))
        .arg(token_params)
        .arg(Argument::object_mut(params.fee_token_coin))
        .arg(Argument::u64(params.dest_chain_selector))
        .arg(Argument::clock());

    let call = match params.pool_kind {
        PoolKind::BurnMint => call
            .arg(Argument::deny_list())
            .arg(Argument::object_mut(pool_state)),
        PoolKind::LockRelease => call.arg(Argument::object_mut(pool_state)),
    };
    Ok(call)
}
