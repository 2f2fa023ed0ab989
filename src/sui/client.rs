use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use tracing::{debug, info, warn};

use super::error::SubmitError;
use super::identity::SigningIdentity;
use super::receipt::{ExecutionReceipt, TransactionBlockResponse};
use super::transaction::{ObjectRef, ResolvedObject, TransactionData, lower};
use super::ExecutionClient;
use crate::ptb::{ObjectId, SubmittableBatch};

pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";
const COIN_PAGE_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct BigIntString(#[serde_as(as = "PickFirst<(_, DisplayFromStr)>")] u64);

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    #[serde(default)]
    data: Option<ObjectData>,
    #[serde(default)]
    error: Option<Value>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectData {
    object_id: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    version: u64,
    digest: String,
    #[serde(default)]
    owner: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinPage {
    data: Vec<CoinData>,
    #[serde(default)]
    next_cursor: Option<String>,
    #[serde(default)]
    has_next_page: bool,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinData {
    coin_object_id: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    version: u64,
    digest: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    balance: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    total_balance: BigIntString,
}

/// 基于 JSON-RPC 的 Sui 全节点客户端。
pub struct SuiRpcClient {
    http: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl SuiRpcClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SubmitError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, SubmitError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(target: "sui::rpc", id, method, "发送 JSON-RPC 请求");

        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        let envelope: RpcEnvelope = response.json().await?;

        if let Some(error) = envelope.error {
            return Err(SubmitError::Rpc {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }
        let result = envelope
            .result
            .ok_or_else(|| SubmitError::schema(format!("{method} 响应缺少 result")))?;
        serde_json::from_value(result).map_err(|err| SubmitError::schema(format!("{method}: {err}")))
    }

    /// 解析批次引用的对象：共享对象取初始共享版本，其余取最新引用。
    pub async fn multi_get_objects(
        &self,
        ids: &[ObjectId],
    ) -> Result<HashMap<ObjectId, ResolvedObject>, SubmitError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let requested: Vec<String> = ids.iter().map(ObjectId::to_hex_literal).collect();
        let responses: Vec<ObjectResponse> = self
            .call(
                "sui_multiGetObjects",
                json!([requested, {"showOwner": true}]),
            )
            .await?;
        if responses.len() != ids.len() {
            return Err(SubmitError::schema(format!(
                "sui_multiGetObjects 返回 {} 项，请求 {} 项",
                responses.len(),
                ids.len()
            )));
        }

        let mut resolved = HashMap::with_capacity(ids.len());
        for (id, response) in ids.iter().zip(responses) {
            let Some(data) = response.data else {
                if let Some(error) = response.error {
                    warn!(target: "sui::rpc", object = %id, error = %error, "对象查询失败");
                }
                return Err(SubmitError::ObjectNotFound(*id));
            };
            resolved.insert(*id, resolve_object(*id, data)?);
        }
        Ok(resolved)
    }

    pub async fn reference_gas_price(&self) -> Result<u64, SubmitError> {
        let price: BigIntString = self.call("suix_getReferenceGasPrice", json!([])).await?;
        Ok(price.0)
    }

    /// 选取不与交易输入冲突的 SUI coin，直到余额覆盖 gas 预算。
    pub async fn select_gas_coins(
        &self,
        owner: ObjectId,
        budget: u64,
        exclude: &[ObjectId],
    ) -> Result<Vec<ObjectRef>, SubmitError> {
        let mut selected = Vec::new();
        let mut total: u64 = 0;
        let mut cursor: Option<String> = None;

        loop {
            let page: CoinPage = self
                .call(
                    "suix_getCoins",
                    json!([owner.to_hex_literal(), SUI_COIN_TYPE, cursor, COIN_PAGE_LIMIT]),
                )
                .await?;

            for coin in page.data {
                let id = ObjectId::from_hex(&coin.coin_object_id).map_err(SubmitError::schema)?;
                if exclude.contains(&id) || coin.balance == 0 {
                    continue;
                }
                total = total.saturating_add(coin.balance);
                selected.push(ObjectRef(id, coin.version, decode_digest(&coin.digest)?));
                if total >= budget {
                    debug!(
                        target: "sui::rpc",
                        coins = selected.len(),
                        total,
                        budget,
                        "gas coin 已选定"
                    );
                    return Ok(selected);
                }
            }

            match page.next_cursor {
                Some(next) if page.has_next_page => cursor = Some(next),
                _ => break,
            }
        }

        Err(SubmitError::InsufficientGas {
            required: budget,
            available: total,
        })
    }

    async fn execute(
        &self,
        tx_bytes: &[u8],
        signature: String,
    ) -> Result<ExecutionReceipt, SubmitError> {
        let response: TransactionBlockResponse = self
            .call(
                "sui_executeTransactionBlock",
                json!([
                    STANDARD.encode(tx_bytes),
                    [signature],
                    {
                        "showEffects": true,
                        "showEvents": true,
                        "showObjectChanges": true,
                        "showBalanceChanges": true
                    },
                    "WaitForLocalExecution"
                ]),
            )
            .await?;
        ExecutionReceipt::try_from(response)?.into_result()
    }
}

#[async_trait]
impl ExecutionClient for SuiRpcClient {
    async fn submit(
        &self,
        batch: SubmittableBatch,
        identity: &SigningIdentity,
    ) -> Result<ExecutionReceipt, SubmitError> {
        let sender = identity.address();
        let object_ids = batch.object_ids();
        let objects = self.multi_get_objects(&object_ids).await?;
        let price = self.reference_gas_price().await?;
        let payment = self
            .select_gas_coins(sender, batch.gas_budget(), &object_ids)
            .await?;

        let transaction = lower(&batch, &objects)?;
        let data = TransactionData::new(transaction, sender, payment, price, batch.gas_budget());
        let tx_bytes = data.to_bcs()?;
        let signature = identity.sign_transaction(&tx_bytes);

        info!(
            target: "sui::rpc",
            batch = batch.batch_id(),
            sender = %sender,
            gas_price = price,
            gas_budget = batch.gas_budget(),
            tx_len = tx_bytes.len(),
            "提交 PTB"
        );
        let receipt = self.execute(&tx_bytes, signature).await?;
        info!(
            target: "sui::rpc",
            digest = %receipt.digest,
            events = receipt.events.len(),
            net_gas = %receipt.gas.net_cost(),
            "交易执行成功"
        );
        Ok(receipt)
    }

    async fn balance(&self, owner: ObjectId) -> Result<u64, SubmitError> {
        let response: BalanceResponse = self
            .call("suix_getBalance", json!([owner.to_hex_literal()]))
            .await?;
        Ok(response.total_balance.0)
    }
}

fn resolve_object(id: ObjectId, data: ObjectData) -> Result<ResolvedObject, SubmitError> {
    let returned = ObjectId::from_hex(&data.object_id).map_err(SubmitError::schema)?;
    if returned != id {
        return Err(SubmitError::schema(format!(
            "请求对象 {id}，节点返回 {returned}"
        )));
    }

    if let Some(shared) = data.owner.as_ref().and_then(|owner| owner.get("Shared")) {
        let version = shared
            .get("initial_shared_version")
            .cloned()
            .ok_or_else(|| SubmitError::schema(format!("共享对象 {id} 缺少 initial_shared_version")))?;
        let BigIntString(initial_shared_version) = serde_json::from_value(version)
            .map_err(|err| SubmitError::schema(format!("共享对象 {id}: {err}")))?;
        return Ok(ResolvedObject::Shared {
            initial_shared_version,
        });
    }

    Ok(ResolvedObject::Owned(ObjectRef(
        id,
        data.version,
        decode_digest(&data.digest)?,
    )))
}

fn decode_digest(digest: &str) -> Result<Vec<u8>, SubmitError> {
    let bytes = bs58::decode(digest)
        .into_vec()
        .map_err(|err| SubmitError::schema(format!("对象 digest {digest} 非法: {err}")))?;
    if bytes.len() != 32 {
        return Err(SubmitError::schema(format!(
            "对象 digest {digest} 长度 {} 字节，应为 32",
            bytes.len()
        )));
    }
    Ok(bytes)
}
