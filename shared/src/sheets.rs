//! Google Sheets access for the practice log.
//!
//! The sheet is the system of record. Reads return every row of the
//! configured range; writes append one row. No retries.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::models::Row;
use crate::secrets::{get_service_account_key, ServiceAccountKey};
use crate::{Config, Error, Result};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Refresh the access token this long before Google says it expires.
const TOKEN_SLACK_SECS: i64 = 60;

/// Read/append access to the log rows.
pub trait SheetStore: Send + Sync {
    /// All rows of the log range, header included if present.
    fn read_rows(&self) -> impl Future<Output = Result<Vec<Row>>> + Send;

    /// Append a single row at the end of the log.
    fn append_row(&self, row: Row) -> impl Future<Output = Result<()>> + Send;
}

/// JWT claims for the service-account grant.
#[derive(Debug, Serialize)]
struct ServiceAccountClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Google OAuth token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct AppendBody<'a> {
    values: [&'a Row; 1],
}

/// Sheets v4 client authenticated as a service account.
pub struct GoogleSheetsClient {
    http_client: reqwest::Client,
    key: ServiceAccountKey,
    sheet_id: String,
    range: String,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleSheetsClient {
    pub fn new(key: ServiceAccountKey, sheet_id: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            key,
            sheet_id: sheet_id.into(),
            range: range.into(),
            token: Mutex::new(None),
        }
    }

    /// Build a client from configuration, reading the key from Secrets Manager
    /// when a secret ARN is configured.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let key = match &config.credentials_secret_arn {
            Some(arn) => {
                let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
                let secrets_client = aws_sdk_secretsmanager::Client::new(&aws);
                get_service_account_key(&secrets_client, arn).await?
            }
            None => {
                let email = config
                    .service_email
                    .as_deref()
                    .ok_or_else(|| Error::Config("GOOGLE_SERVICE_EMAIL not set".to_string()))?;
                let private_key = config
                    .private_key
                    .as_deref()
                    .ok_or_else(|| Error::Config("GOOGLE_PRIVATE_KEY not set".to_string()))?;
                ServiceAccountKey::new(email, private_key)
            }
        };

        Ok(Self::new(key, &config.sheet_id, &config.sheet_range))
    }

    fn values_url(&self) -> String {
        format!(
            "{}/{}/values/{}",
            SHEETS_URL,
            self.sheet_id,
            urlencoding::encode(&self.range)
        )
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let claims = ServiceAccountClaims {
            iss: &self.key.client_email,
            scope: SCOPE,
            aud: TOKEN_URL,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| Error::Config(format!("Invalid service account key: {}", e)))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| Error::Sheets(format!("Failed to sign token request: {}", e)))
    }

    /// Exchange a signed assertion for an access token, reusing a cached one.
    async fn access_token(&self) -> Result<String> {
        let now = Utc::now();
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > now {
                return Ok(token.access_token.clone());
            }
        }

        let assertion = self.signed_assertion(now)?;
        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .http_client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Sheets(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Sheets(format!("Token exchange failed: {}", error_text)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Sheets(format!("Failed to parse token response: {}", e)))?;

        info!("Obtained Sheets access token for {}", self.key.client_email);
        let expires_at = now + Duration::seconds(token.expires_in - TOKEN_SLACK_SECS);
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });

        Ok(token.access_token)
    }
}

impl SheetStore for GoogleSheetsClient {
    async fn read_rows(&self) -> Result<Vec<Row>> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .get(self.values_url())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::Sheets(format!("Read request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Sheets read failed with {}: {}", status, error_text);
            return Err(Error::Sheets(format!("Read failed ({}): {}", status, error_text)));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| Error::Sheets(format!("Failed to parse values: {}", e)))?;

        Ok(range.values.into_iter().map(cells_to_row).collect())
    }

    async fn append_row(&self, row: Row) -> Result<()> {
        let token = self.access_token().await?;
        let url = format!("{}:append", self.values_url());

        let response = self
            .http_client
            .post(url)
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(token)
            .json(&AppendBody { values: [&row] })
            .send()
            .await
            .map_err(|e| Error::Sheets(format!("Append request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Sheets append failed with {}: {}", status, error_text);
            return Err(Error::Sheets(format!("Append failed ({}): {}", status, error_text)));
        }

        Ok(())
    }
}

/// Formatted values arrive as strings, but unformatted cells may be numbers.
fn cells_to_row(cells: Vec<serde_json::Value>) -> Row {
    cells
        .into_iter()
        .map(|cell| match cell {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect()
}
