use async_trait::async_trait;
use attrcalc::{AcError, CalculatedAttributes, ResultReporter};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::info;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// PUTs the full result map to the collector in one request.
pub struct HttpReporter {
    client: reqwest::Client,
    url: String,
    secret: Option<String>,
    run_id: Uuid,
}

impl HttpReporter {
    pub fn new(url: String, secret: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            secret,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

#[async_trait]
impl ResultReporter for HttpReporter {
    async fn report(&self, results: &CalculatedAttributes) -> attrcalc::Result<()> {
        let body = serde_json::to_string(results)?;

        let mut req = self
            .client
            .put(&self.url)
            .header("Content-Type", "application/json")
            .header("Idempotency-Key", self.run_id.to_string());
        if let Some(secret) = &self.secret {
            let ts = Utc::now().timestamp();
            req = req
                .header("X-Timestamp", ts.to_string())
                .header("X-Signature", sign_payload(secret, ts, &body));
        }

        let resp = req
            .body(body)
            .send()
            .await
            .map_err(|e| AcError::transport_from(format!("PUT {} failed", self.url), e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AcError::transport(format!("{} answered HTTP {status}", self.url)));
        }

        info!(url = %self.url, run_id = %self.run_id, values = results.len(), "results delivered");
        Ok(())
    }
}

/// hex(HMAC-SHA256(secret, "<ts>.<body>"))
fn sign_payload(secret: &str, ts: i64, body: &str) -> String {
    let payload = format!("{}.{}", ts, body);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take any key length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
