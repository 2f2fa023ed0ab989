//! 入站消息完成流程：`init_execute` 打开热土豆，`finish_execute` 在同一 PTB 内关闭。

use tracing::info;

use crate::ptb::{
    Argument, Batch, BuildError, CallDescriptor, EncodingError, MoveTarget, ObjectId,
    ResultHandle, TypeTag,
};

pub const OFFRAMP_MODULE: &str = "offramp";
pub const INIT_EXECUTE_FUNCTION: &str = "dummy_init_execute";
pub const FINISH_EXECUTE_FUNCTION: &str = "finish_execute";
pub const STATE_HELPER_MODULE: &str = "offramp_state_helper";
pub const COMPLETED_TRANSFER_STRUCT: &str = "CompletedDestTokenTransfer";

pub const DEFAULT_SOURCE_CHAIN_SELECTOR: u64 = 2;
pub const DEFAULT_PAYLOAD: &[u8] = b"Hello World";
pub const DEFAULT_GAS_BUDGET: u64 = 500_000_000;
pub const MESSAGE_ID_LENGTH: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionParams {
    pub ccip_package: ObjectId,
    pub offramp_package: ObjectId,
    pub offramp_state: ObjectId,
    pub source_chain_selector: u64,
    pub message_id: Vec<u8>,
    pub sender: Vec<u8>,
    pub data: Vec<u8>,
}

impl CompletionParams {
    /// `{ccip}::offramp_state_helper::CompletedDestTokenTransfer`
    pub fn completed_transfer_type(&self) -> TypeTag {
        TypeTag::struct_of(
            self.ccip_package,
            STATE_HELPER_MODULE,
            COMPLETED_TRANSFER_STRUCT,
        )
    }
}

#[derive(Debug)]
pub struct CompletionBatch {
    pub batch: Batch,
    pub init: ResultHandle,
    pub token_transfers: ResultHandle,
    pub finish: ResultHandle,
}

pub fn build_completion_batch(params: &CompletionParams) -> Result<CompletionBatch, BuildError> {
    if params.message_id.len() != MESSAGE_ID_LENGTH {
        return Err(EncodingError::new(
            "message_id",
            &format!("0x{}", hex::encode(&params.message_id)),
            format!(
                "需为 {MESSAGE_ID_LENGTH} 字节，实际 {} 字节",
                params.message_id.len()
            ),
        )
        .into());
    }

    let init_target = MoveTarget::new(
        params.offramp_package,
        OFFRAMP_MODULE,
        INIT_EXECUTE_FUNCTION,
    )?;
    let finish_target = MoveTarget::new(
        params.offramp_package,
        OFFRAMP_MODULE,
        FINISH_EXECUTE_FUNCTION,
    )?;

    let (batch, init) = Batch::new().add_call(
        CallDescriptor::new(init_target)
            .arg(Argument::object_mut(params.offramp_state))
            .arg(Argument::u64(params.source_chain_selector))
            .arg(Argument::bytes(params.message_id.clone()))
            .arg(Argument::bytes(params.sender.clone()))
            .arg(Argument::bytes(params.data.clone())),
    )?;

    // 本流程不涉及代币转移，传入空的 CompletedDestTokenTransfer 向量。
    let (batch, token_transfers) =
        batch.add_vector_literal(params.completed_transfer_type(), Vec::new())?;

    let (batch, finish) = batch.add_call(
        CallDescriptor::new(finish_target)
            .arg(Argument::object_mut(params.offramp_state))
            .arg(init)
            .arg(token_transfers),
    )?;

    info!(
        target: "flows::offramp",
        batch = batch.id(),
        source_chain_selector = params.source_chain_selector,
        offramp_state = %params.offramp_state,
        payload_len = params.data.len(),
        "offramp PTB 已构建"
    );

    Ok(CompletionBatch {
        batch,
        init,
        token_transfers,
        finish,
    })
}
