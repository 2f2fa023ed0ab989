use serde::Deserialize;
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use super::error::SubmitError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failure(String),
}

impl ExecutionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionStatus::Success)
    }
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasSummary {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub computation_cost: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub storage_cost: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub storage_rebate: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub non_refundable_storage_fee: u64,
}

impl GasSummary {
    /// 计算 + 存储 - 返还，返还可能大于支出，因此为有符号值。
    pub fn net_cost(&self) -> i128 {
        i128::from(self.computation_cost) + i128::from(self.storage_cost)
            - i128::from(self.storage_rebate)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub event_type: String,
    pub sender: String,
    pub package_id: String,
    #[serde(rename = "transactionModule")]
    pub module: String,
    #[serde(default)]
    pub parsed_json: Value,
}

impl EventRecord {
    /// 事件 `data` 字段为字节数组时按 UTF-8 解码（接收端回显的消息体）。
    pub fn decoded_data(&self) -> Option<String> {
        let items = self.parsed_json.get("data")?.as_array()?;
        let bytes = items
            .iter()
            .map(|item| item.as_u64().and_then(|value| u8::try_from(value).ok()))
            .collect::<Option<Vec<u8>>>()?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionReceipt {
    pub digest: String,
    pub status: ExecutionStatus,
    pub gas: GasSummary,
    pub events: Vec<EventRecord>,
}

impl ExecutionReceipt {
    /// 链上执行失败时转换为 [`SubmitError::Execution`]，错误中保留完整回执。
    pub fn into_result(self) -> Result<Self, SubmitError> {
        if let ExecutionStatus::Failure(message) = &self.status {
            let message = message.clone();
            return Err(SubmitError::Execution {
                digest: self.digest.clone(),
                message,
                receipt: Box::new(self),
            });
        }
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionBlockResponse {
    digest: String,
    #[serde(default)]
    effects: Option<RawEffects>,
    #[serde(default)]
    events: Vec<EventRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEffects {
    status: RawStatus,
    gas_used: GasSummary,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    status: String,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<TransactionBlockResponse> for ExecutionReceipt {
    type Error = SubmitError;

    fn try_from(response: TransactionBlockResponse) -> Result<Self, Self::Error> {
        let effects = response
            .effects
            .ok_or_else(|| SubmitError::schema("交易响应缺少 effects"))?;
        let status = match effects.status.status.as_str() {
            "success" => ExecutionStatus::Success,
            "failure" => ExecutionStatus::Failure(
                effects
                    .status
                    .error
                    .unwrap_or_else(|| "unknown error".to_string()),
            ),
            other => return Err(SubmitError::schema(format!("未知的执行状态 {other}"))),
        };
        Ok(ExecutionReceipt {
            digest: response.digest,
            status,
            gas: effects.gas_used,
            events: response.events,
        })
    }
}
