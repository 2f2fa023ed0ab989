use thiserror::Error;

/// 文本参数（u64 / 字节串 / 对象 ID）解码失败。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("参数 {parameter} 编码非法（输入 {value:?}）: {reason}")]
pub struct EncodingError {
    pub parameter: String,
    pub value: String,
    pub reason: String,
}

impl EncodingError {
    pub fn new(parameter: &str, value: &str, reason: impl Into<String>) -> Self {
        Self {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("命令 #{index} 引用了尚未产生的结果 Result({referenced})")]
    ForwardReference { index: usize, referenced: u16 },
    #[error("命令 #{index} 引用了其它批次的结果句柄（句柄批次 {handle_batch}，当前批次 {batch}）")]
    ForeignHandle {
        index: usize,
        batch: u64,
        handle_batch: u64,
    },
    #[error("批次为空，无法提交")]
    EmptyBatch,
    #[error("gas 预算必须大于 0")]
    ZeroGasBudget,
    #[error("批次命令数超过上限 {limit}")]
    TooManyCommands { limit: usize },
    #[error("交易输入数超过上限 {limit}")]
    TooManyInputs { limit: usize },
    #[error("pool kind {kind} 需要提供 pool 状态对象（--managed-token-state）")]
    MissingPoolState { kind: &'static str },
    #[error("未知的 pool kind: {0}（可选 burn_mint / lock_release）")]
    UnknownPoolKind(String),
    #[error("调用目标非法 {target}: {reason}")]
    InvalidTarget { target: String, reason: String },
    #[error("Move 类型非法 {input}: {reason}")]
    InvalidTypeTag { input: String, reason: String },
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}
