//! CCIP 业务流程：每个流程产出一个待提交的 PTB 批次。

pub mod offramp;
pub mod onramp;

pub use offramp::{CompletionBatch, CompletionParams, build_completion_batch};
pub use onramp::{PoolKind, SendBatch, SendParams, build_send_batch};
