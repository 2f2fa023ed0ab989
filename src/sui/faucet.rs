//! 测试网络领水：向 faucet 发起一次请求，随后按有界指数退避轮询余额。

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::ExecutionClient;
use super::error::SubmitError;
use crate::config::FundingConfig;
use crate::ptb::ObjectId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FundingPolicy {
    pub min_balance: u64,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl From<&FundingConfig> for FundingPolicy {
    fn from(config: &FundingConfig) -> Self {
        Self {
            min_balance: config.min_balance_mist,
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms.max(config.initial_backoff_ms)),
        }
    }
}

pub struct FaucetClient {
    http: reqwest::Client,
    host: String,
}

impl FaucetClient {
    pub fn new(host: impl Into<String>, timeout: Duration) -> Result<Self, SubmitError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            host: host.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub async fn request_funds(&self, recipient: ObjectId) -> Result<(), SubmitError> {
        let url = format!("{}/v2/gas", self.host);
        let response = self
            .http
            .post(&url)
            .json(&json!({
                "FixedAmountRequest": { "recipient": recipient.to_hex_literal() }
            }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SubmitError::Faucet("请求过于频繁，已被 faucet 限流".to_string()));
        }
        let body: Value = response.json().await.map_err(|err| {
            SubmitError::Faucet(format!("HTTP {status} 响应无法解析: {err}"))
        })?;
        if !status.is_success() {
            return Err(SubmitError::Faucet(format!("HTTP {status}: {body}")));
        }

        match body.get("status") {
            Some(Value::String(state)) if state == "Success" => {
                info!(target: "faucet", recipient = %recipient, host = %self.host, "faucet 已受理");
                Ok(())
            }
            Some(other) => Err(SubmitError::Faucet(format!("faucet 拒绝请求: {other}"))),
            None => Err(SubmitError::Faucet(format!("faucet 响应缺少 status: {body}"))),
        }
    }
}

/// 余额不足时领水并等待到账；轮询次数耗尽返回 [`SubmitError::FundingTimeout`]。
pub async fn ensure_funded<C>(
    client: &C,
    faucet: &FaucetClient,
    address: ObjectId,
    policy: &FundingPolicy,
) -> Result<u64, SubmitError>
where
    C: ExecutionClient + ?Sized,
{
    let balance = client.balance(address).await?;
    if balance >= policy.min_balance {
        debug!(target: "faucet", address = %address, balance, "余额充足，跳过领水");
        return Ok(balance);
    }

    info!(
        target: "faucet",
        address = %address,
        balance,
        min_balance = policy.min_balance,
        "余额不足，向 faucet 领水"
    );
    faucet.request_funds(address).await?;

    let mut backoff = policy.initial_backoff;
    let mut last_balance = balance;
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(backoff).await;
        last_balance = client.balance(address).await?;
        if last_balance >= policy.min_balance {
            info!(target: "faucet", address = %address, balance = last_balance, attempt, "资金已到账");
            return Ok(last_balance);
        }
        warn!(
            target: "faucet",
            attempt,
            max_attempts = policy.max_attempts,
            balance = last_balance,
            backoff_ms = backoff.as_millis() as u64,
            "资金尚未到账"
        );
        backoff = (backoff * 2).min(policy.max_backoff);
    }

    Err(SubmitError::FundingTimeout {
        attempts: policy.max_attempts,
        last_balance,
    })
}

#[cfg(test)]
mod tests {
    use httpmock::Method::POST;
    use httpmock::MockServer;

    use super::*;
    use crate::sui::SuiRpcClient;

    fn policy(max_attempts: u32) -> FundingPolicy {
        FundingPolicy {
            min_balance: 1_000_000_000,
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        }
    }

    fn balance_body(total: &str) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"coinType": "0x2::sui::SUI", "coinObjectCount": 1, "totalBalance": total}
        })
    }

    #[tokio::test]
    async fn funded_account_skips_faucet() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).body_contains("suix_getBalance");
                then.status(200).json_body(balance_body("5000000000"));
            })
            .await;
        let faucet_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/gas");
                then.status(200).json_body(json!({"status": "Success"}));
            })
            .await;

        let rpc = SuiRpcClient::new(server.base_url(), Duration::from_secs(5)).expect("rpc");
        let faucet = FaucetClient::new(server.base_url(), Duration::from_secs(5)).expect("faucet");
        let balance = ensure_funded(&rpc, &faucet, ObjectId::from_low_u16(0x77), &policy(3))
            .await
            .expect("funded");
        assert_eq!(balance, 5_000_000_000);
        assert_eq!(faucet_mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn funding_times_out_after_max_attempts() {
        let server = MockServer::start_async().await;
        let balance_mock = server
            .mock_async(|when, then| {
                when.method(POST).body_contains("suix_getBalance");
                then.status(200).json_body(balance_body("0"));
            })
            .await;
        let faucet_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/gas")
                    .body_contains("FixedAmountRequest");
                then.status(200)
                    .json_body(json!({"status": "Success", "coins_sent": []}));
            })
            .await;

        let rpc = SuiRpcClient::new(server.base_url(), Duration::from_secs(5)).expect("rpc");
        let faucet = FaucetClient::new(server.base_url(), Duration::from_secs(5)).expect("faucet");
        let err = ensure_funded(&rpc, &faucet, ObjectId::from_low_u16(0x77), &policy(3))
            .await
            .expect_err("never funded");

        assert!(matches!(
            err,
            SubmitError::FundingTimeout {
                attempts: 3,
                last_balance: 0
            }
        ));
        assert_eq!(faucet_mock.hits_async().await, 1);
        assert_eq!(balance_mock.hits_async().await, 4);
    }

    #[tokio::test]
    async fn faucet_rejection_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/gas");
                then.status(200)
                    .json_body(json!({"status": {"Failure": {"Internal": "drained"}}}));
            })
            .await;

        let faucet = FaucetClient::new(format!("{}/", server.base_url()), Duration::from_secs(5))
            .expect("faucet");
        let err = faucet
            .request_funds(ObjectId::from_low_u16(0x77))
            .await
            .expect_err("rejected");
        assert!(matches!(err, SubmitError::Faucet(message) if message.contains("drained")));
    }

    #[test]
    fn policy_from_config_is_bounded() {
        let config = FundingConfig {
            min_balance_mist: 10,
            max_attempts: 0,
            initial_backoff_ms: 500,
            max_backoff_ms: 100,
        };
        let policy = FundingPolicy::from(&config);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.max_backoff, Duration::from_millis(500));
    }
}
