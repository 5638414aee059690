use std::time::Duration;

use serde::Deserialize;

use crate::fetcher::retry::RetryPolicy;
use crate::signer::Credentials;

/// Document store connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub endpoint: String,
    pub region: String,
    pub service: String,
    pub table: String,
    /// `X-Amz-Target` prefix; the operation name is appended
    pub target_prefix: String,
    /// Overridden by `AWS_ACCESS_KEY_ID` when set
    pub access_key_id: Option<String>,
    /// Overridden by `AWS_SECRET_ACCESS_KEY` when set
    pub secret_access_key: Option<String>,
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    /// Delay before retry n is n times this
    pub backoff_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://dynamodb.us-east-1.amazonaws.com/".to_string(),
            region: "us-east-1".to_string(),
            service: "dynamodb".to_string(),
            table: "webpages".to_string(),
            target_prefix: "DynamoDB_20120810".to_string(),
            access_key_id: None,
            secret_access_key: None,
            request_timeout_secs: 30,
            max_attempts: 3,
            backoff_secs: 1,
        }
    }
}

impl StoreConfig {
    /// Environment credentials win over the file. Missing values come back
    /// empty, which the signer rejects.
    pub fn credentials(&self) -> Credentials {
        Credentials::from_env().unwrap_or_else(|| {
            Credentials::new(
                self.access_key_id.clone().unwrap_or_default(),
                self.secret_access_key.clone().unwrap_or_default(),
            )
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            backoff: Duration::from_secs(self.backoff_secs),
        }
    }
}

/// REST content API settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://vercel-backend-azure-three.vercel.app/api/".to_string(),
            timeout_secs: 60,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
