//! 远程额度账本客户端
//!
//! 协议：
//! - `POST /useCredit {key, reservation_code?}` → `200 {remaining}` | `402 {error: "no_credits"}`
//!   | `404 {error: "invalid_key"}` | 其他 4xx `{error}` | 5xx
//! - `POST /checkCredit {key}` → `200 {remaining, total}` | `404 {error: "invalid_key"}`

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::{LedgerError, LedgerResult};
use crate::models::CreditBalance;
use crate::services::credit_ledger::CreditLedger;

#[derive(Debug, Serialize)]
struct ConsumeRequest<'a> {
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reservation_code: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CheckRequest<'a> {
    key: &'a str,
}

/// 账本响应，成功与失败共用同一个结构
#[derive(Debug, Deserialize)]
struct LedgerResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    remaining: Option<u32>,
    #[serde(default)]
    total: Option<u32>,
}

/// 把服务端的错误码映射为 [`LedgerError`]
fn wire_error(reason: &str) -> LedgerError {
    match reason {
        "no_credits" => LedgerError::NoCredits,
        "invalid_key" => LedgerError::InvalidKey,
        other => LedgerError::Other(other.to_string()),
    }
}

/// 远程账本
pub struct HttpLedger {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLedger {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> LedgerResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> LedgerResult<Self> {
        Self::new(
            config.ledger_base_url.clone(),
            Duration::from_secs(config.ledger_timeout_secs),
        )
    }

    async fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> LedgerResult<LedgerResponse> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        if status.is_server_error() {
            return Err(LedgerError::ServerError {
                status: status.as_u16(),
            });
        }

        let body: LedgerResponse = response.json().await?;
        if let Some(reason) = body.error.as_deref() {
            return Err(wire_error(reason));
        }
        Ok(body)
    }
}

impl CreditLedger for HttpLedger {
    async fn consume(&self, key: &str, reservation_code: Option<&str>) -> LedgerResult<u32> {
        let body = self
            .post(
                "useCredit",
                &ConsumeRequest {
                    key,
                    reservation_code,
                },
            )
            .await?;
        body.remaining
            .ok_or_else(|| LedgerError::Other("响应缺少 remaining 字段".to_string()))
    }

    async fn check(&self, key: &str) -> LedgerResult<CreditBalance> {
        let body = self.post("checkCredit", &CheckRequest { key }).await?;
        match (body.remaining, body.total) {
            (Some(remaining), Some(total)) => Ok(CreditBalance { remaining, total }),
            (Some(remaining), None) => Ok(CreditBalance {
                remaining,
                total: remaining,
            }),
            _ => Err(LedgerError::Other("响应缺少 remaining 字段".to_string())),
        }
    }
}
