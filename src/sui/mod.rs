//! Sui 执行端：签名身份、JSON-RPC 提交与测试网络领水。

pub mod client;
pub mod error;
pub mod faucet;
pub mod identity;
pub mod network;
pub mod receipt;
pub mod transaction;

use async_trait::async_trait;

pub use client::{SUI_COIN_TYPE, SuiRpcClient};
pub use error::SubmitError;
pub use faucet::{FaucetClient, FundingPolicy, ensure_funded};
pub use identity::{IdentityError, SigningIdentity};
pub use network::Network;
pub use receipt::{EventRecord, ExecutionReceipt, ExecutionStatus, GasSummary};

use crate::ptb::{ObjectId, SubmittableBatch};

/// 提交端抽象：批次整体签名执行，返回回执或错误，不存在部分提交。
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    async fn submit(
        &self,
        batch: SubmittableBatch,
        identity: &SigningIdentity,
    ) -> Result<ExecutionReceipt, SubmitError>;

    async fn balance(&self, owner: ObjectId) -> Result<u64, SubmitError>;
}
