//! HTTP chain client for the ledger's public REST API.
//!
//! Read endpoints (nonces, balances, transaction status) work without
//! credentials. Broadcasting needs a [`TransactionSigner`]; a client built
//! without one is read-only.

use super::traits::*;
use async_trait::async_trait;
use num_bigint::BigUint;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Per-request limit; a hung API node fails the request instead of the caller.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct NoncesResponse {
    possible_next_nonce: u64,
}

#[derive(Debug, Deserialize)]
struct BalancesResponse {
    stx: StxBalance,
}

#[derive(Debug, Deserialize)]
struct StxBalance {
    balance: String,
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    tx_status: String,
}

#[derive(Debug, Deserialize)]
struct BroadcastRejection {
    error: String,
    reason: Option<String>,
}

#[derive(Clone)]
pub struct HttpChainClient {
    inner: reqwest::Client,
    api_url: Url,
    signer: Option<Arc<dyn TransactionSigner>>,
}

impl HttpChainClient {
    /// Read-only client for the API at `api_url`.
    pub fn new(api_url: &str) -> ChainResult<Self> {
        // keep any path prefix when joining endpoint paths
        let normalized = if api_url.ends_with('/') {
            api_url.to_string()
        } else {
            format!("{}/", api_url)
        };

        let api_url = Url::parse(&normalized)
            .map_err(|e| ChainError::Decode(format!("invalid API url '{}': {}", api_url, e)))?;

        let inner = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChainError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            inner,
            api_url,
            signer: None,
        })
    }

    /// Enable broadcasting through `signer`.
    pub fn with_signer(mut self, signer: Arc<dyn TransactionSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    fn endpoint(&self, path: &str) -> ChainResult<Url> {
        self.api_url
            .join(path)
            .map_err(|e| ChainError::Decode(format!("invalid endpoint '{}': {}", path, e)))
    }

    fn signer(&self) -> ChainResult<&Arc<dyn TransactionSigner>> {
        self.signer
            .as_ref()
            .ok_or_else(|| ChainError::Unauthorized("no transaction signer configured".to_string()))
    }

    async fn get(&self, path: &str) -> ChainResult<(StatusCode, String)> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");

        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| ChainError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChainError::Network(e.to_string()))?;
        Ok((status, body))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ChainResult<T> {
        let (status, body) = self.get(path).await?;
        if !status.is_success() {
            return Err(ChainError::Http {
                status: status.as_u16(),
                body,
            });
        }
        decode(&body)
    }

    async fn broadcast(&self, raw: Vec<u8>) -> ChainResult<TxId> {
        let url = self.endpoint("v2/transactions")?;
        debug!(%url, bytes = raw.len(), "broadcasting transaction");

        let response = self
            .inner
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(raw)
            .send()
            .await
            .map_err(|e| ChainError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChainError::Network(e.to_string()))?;

        parse_broadcast_response(status, &body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> ChainResult<T> {
    serde_json::from_str(body).map_err(|e| ChainError::Decode(format!("{}: {}", e, body)))
}

/// Interpret the broadcast endpoint's reply.
///
/// Success is a JSON string holding the txid; rejection is an object with
/// `error` and an optional `reason`.
fn parse_broadcast_response(status: StatusCode, body: &str) -> ChainResult<TxId> {
    if status.is_success() {
        let txid = serde_json::from_str::<String>(body)
            .unwrap_or_else(|_| body.trim().trim_matches('"').to_string());
        if txid.is_empty() {
            return Err(ChainError::Decode("empty broadcast response".to_string()));
        }
        let txid = if txid.starts_with("0x") {
            txid
        } else {
            format!("0x{}", txid)
        };
        return Ok(TxId(txid));
    }

    match serde_json::from_str::<BroadcastRejection>(body) {
        Ok(rejection) => Err(ChainError::Broadcast(match rejection.reason {
            Some(reason) => format!("{} ({})", rejection.error, reason),
            None => rejection.error,
        })),
        Err(_) => Err(ChainError::Http {
            status: status.as_u16(),
            body: body.to_string(),
        }),
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn next_nonce(&self, address: &str) -> ChainResult<u64> {
        let nonces: NoncesResponse = self
            .get_json(&format!("extended/v1/address/{}/nonces", address))
            .await?;
        Ok(nonces.possible_next_nonce)
    }

    async fn balance(&self, address: &str) -> ChainResult<BigUint> {
        let balances: BalancesResponse = self
            .get_json(&format!("extended/v1/address/{}/balances", address))
            .await?;
        BigUint::from_str(&balances.stx.balance)
            .map_err(|e| ChainError::Decode(format!("balance '{}': {}", balances.stx.balance, e)))
    }

    async fn deploy_contract(&self, tx: &ContractDeploy) -> ChainResult<TxId> {
        let raw = self.signer()?.sign_deploy(tx)?;
        self.broadcast(raw).await
    }

    async fn call_contract(&self, tx: &ContractCall) -> ChainResult<TxId> {
        let raw = self.signer()?.sign_call(tx)?;
        self.broadcast(raw).await
    }

    async fn tx_status(&self, txid: &TxId) -> ChainResult<TxStatus> {
        let (status, body) = self.get(&format!("extended/v1/tx/{}", txid)).await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(TxStatus::NotFound);
        }
        if !status.is_success() {
            return Err(ChainError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let tx: TxResponse = decode(&body)?;
        Ok(TxStatus::from_api(&tx.tx_status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let client = HttpChainClient::new("https://node.example.com/stacks").unwrap();
        let url = client.endpoint("extended/v1/tx/0xabc").unwrap();
        assert_eq!(url.as_str(), "https://node.example.com/stacks/extended/v1/tx/0xabc");

        let client = HttpChainClient::new("https://api.testnet.hiro.so").unwrap();
        let url = client.endpoint("v2/transactions").unwrap();
        assert_eq!(url.as_str(), "https://api.testnet.hiro.so/v2/transactions");
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            HttpChainClient::new("not a url"),
            Err(ChainError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_broadcast_success() {
        let txid = parse_broadcast_response(StatusCode::OK, r#""0xfeed""#).unwrap();
        assert_eq!(txid, TxId("0xfeed".to_string()));

        let txid = parse_broadcast_response(StatusCode::OK, "beef\n").unwrap();
        assert_eq!(txid, TxId("0xbeef".to_string()));
    }

    #[test]
    fn test_parse_broadcast_rejection() {
        let err = parse_broadcast_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":"transaction rejected","reason":"BadNonce","txid":"0x1"}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ChainError::Broadcast("transaction rejected (BadNonce)".to_string())
        );

        let err = parse_broadcast_response(StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_decode_api_payloads() {
        let body = r#"{"last_executed_tx_nonce":4,"possible_next_nonce":5}"#;
        let nonces: NoncesResponse = decode(body).unwrap();
        assert_eq!(nonces.possible_next_nonce, 5);

        let body = r#"{"stx":{"balance":"98765432109876543210","locked":"0"}}"#;
        let balances: BalancesResponse = decode(body).unwrap();
        assert_eq!(balances.stx.balance, "98765432109876543210");

        let tx: TxResponse = decode(r#"{"tx_id":"0x1","tx_status":"abort_by_response"}"#).unwrap();
        assert_eq!(TxStatus::from_api(&tx.tx_status), TxStatus::AbortByResponse);

        assert!(matches!(decode::<TxResponse>("{}"), Err(ChainError::Decode(_))));
    }

    #[tokio::test]
    async fn test_broadcast_requires_signer() {
        let client = HttpChainClient::new("http://127.0.0.1:9").unwrap();
        let call = ContractCall {
            sender: "ST1SENDER".to_string(),
            contract: "ST1SENDER.abc-token".to_string(),
            function: "finalize-distribution".to_string(),
            args: vec![],
            nonce: 0,
            fee: 1_000,
        };
        assert!(matches!(
            client.call_contract(&call).await,
            Err(ChainError::Unauthorized(_))
        ));
    }
}
