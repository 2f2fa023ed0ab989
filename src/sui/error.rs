use thiserror::Error;

use super::receipt::ExecutionReceipt;
use crate::ptb::{BuildError, ObjectId};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("网络请求失败: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("RPC {method} 返回错误 {code}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },
    #[error("响应结构异常: {0}")]
    Schema(String),
    #[error("对象 {0} 不存在或已被删除")]
    ObjectNotFound(ObjectId),
    #[error("gas 不足: 预算需要 {required} MIST，可用 gas coin 合计 {available} MIST")]
    InsufficientGas { required: u64, available: u64 },
    #[error("交易 {digest} 执行失败: {message}")]
    Execution {
        digest: String,
        message: String,
        receipt: Box<ExecutionReceipt>,
    },
    #[error("BCS 序列化失败: {0}")]
    Encode(#[from] bcs::Error),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("领水超时: 已轮询 {attempts} 次，余额仍为 {last_balance} MIST")]
    FundingTimeout { attempts: u32, last_balance: u64 },
    #[error("faucet 请求失败: {0}")]
    Faucet(String),
}

impl SubmitError {
    pub fn schema(reason: impl std::fmt::Display) -> Self {
        Self::Schema(reason.to_string())
    }
}
