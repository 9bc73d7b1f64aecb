//! Credential store and identity provider
//!
//! The EVNEX API accepts a Cognito access token, passed as-is in the
//! `Authorization` header. [`CredentialStore`] owns the current token set and
//! serialises every exchange with the identity provider.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use evnex_core::{EvnexError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

const COGNITO_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";
const COGNITO_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Tokens issued by one successful exchange
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("id_token", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Username, password and any tokens already issued
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub id_token: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// A complete token set, if all three tokens were supplied
    fn tokens(&self) -> Option<TokenSet> {
        Some(TokenSet {
            id_token: self.id_token.clone()?,
            access_token: self.access_token.clone()?,
            refresh_token: Some(self.refresh_token.clone()?),
            expires_at: None,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("id_token", &self.id_token.is_some())
            .field("access_token", &self.access_token.is_some())
            .field("refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// External service exchanging credentials for tokens
#[async_trait]
pub trait IdentityProvider: Send + Sync + fmt::Debug {
    /// Password exchange
    async fn authenticate(&self, username: &str, password: &str) -> Result<TokenSet>;

    /// Refresh-token exchange. Providers that do not rotate the refresh
    /// token return `None` in `refresh_token`.
    async fn refresh(&self, username: &str, refresh_token: &str) -> Result<TokenSet>;
}

/// AWS Cognito user pool, spoken to through the `InitiateAuth` JSON API
#[derive(Debug, Clone)]
pub struct CognitoIdentityProvider {
    http: Client,
    endpoint: String,
    client_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
    challenge_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    access_token: String,
    id_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct CognitoError {
    #[serde(rename = "__type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Region part of a user pool id such as `ap-southeast-2_zWnqo6ASv`
pub fn region_from_pool_id(user_pool_id: &str) -> Result<&str> {
    match user_pool_id.split_once('_') {
        Some((region, _)) if !region.is_empty() => Ok(region),
        _ => Err(EvnexError::Config(format!(
            "invalid Cognito user pool id '{}'",
            user_pool_id
        ))),
    }
}

impl CognitoIdentityProvider {
    /// Provider for the region of `user_pool_id`, or for `endpoint` when set
    pub fn new(
        user_pool_id: &str,
        client_id: &str,
        endpoint: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = match endpoint {
            Some(url) => url.to_string(),
            None => format!(
                "https://cognito-idp.{}.amazonaws.com/",
                region_from_pool_id(user_pool_id)?
            ),
        };
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EvnexError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            client_id: client_id.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn initiate_auth(&self, body: serde_json::Value) -> Result<AuthenticationResult> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Amz-Target", COGNITO_TARGET)
            .header(reqwest::header::CONTENT_TYPE, COGNITO_CONTENT_TYPE)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EvnexError::Timeout {
                        endpoint: self.endpoint.clone(),
                    }
                } else {
                    EvnexError::Transport {
                        endpoint: self.endpoint.clone(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| EvnexError::Transport {
            endpoint: self.endpoint.clone(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let error: CognitoError = serde_json::from_str(&text).unwrap_or(CognitoError {
                kind: None,
                message: None,
            });
            // __type may be namespaced: "com.amazonaws...#NotAuthorizedException"
            let code = error
                .kind
                .as_deref()
                .and_then(|k| k.rsplit('#').next())
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP{}", status.as_u16()));
            let message = error.message.unwrap_or(text);
            // Outages and throttling are not a verdict on the credentials
            if status.is_server_error() || is_throttled(&code) {
                return Err(EvnexError::Http {
                    endpoint: self.endpoint.clone(),
                    status: status.as_u16(),
                    body: format!("{}: {}", code, message),
                });
            }
            return Err(EvnexError::Authentication { code, message });
        }

        let parsed: InitiateAuthResponse =
            serde_json::from_str(&text).map_err(|e| EvnexError::Decode {
                endpoint: self.endpoint.clone(),
                message: e.to_string(),
                body: text.clone(),
            })?;

        match (parsed.authentication_result, parsed.challenge_name) {
            (Some(result), _) => Ok(result),
            (None, Some(challenge)) => Err(EvnexError::Authentication {
                code: "ChallengeRequired".to_string(),
                message: format!("identity provider requested the {} challenge", challenge),
            }),
            (None, None) => Err(EvnexError::Authentication {
                code: "EmptyResult".to_string(),
                message: "identity provider returned no tokens".to_string(),
            }),
        }
    }
}

fn expiry(expires_in: Option<i64>) -> Option<DateTime<Utc>> {
    expires_in.map(|secs| Utc::now() + ChronoDuration::seconds(secs))
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn authenticate(&self, username: &str, password: &str) -> Result<TokenSet> {
        let result = self
            .initiate_auth(json!({
                "AuthFlow": "USER_PASSWORD_AUTH",
                "ClientId": self.client_id,
                "AuthParameters": {"USERNAME": username, "PASSWORD": password},
            }))
            .await?;

        Ok(TokenSet {
            id_token: result.id_token,
            access_token: result.access_token,
            refresh_token: result.refresh_token,
            expires_at: expiry(result.expires_in),
        })
    }

    async fn refresh(&self, _username: &str, refresh_token: &str) -> Result<TokenSet> {
        let result = self
            .initiate_auth(json!({
                "AuthFlow": "REFRESH_TOKEN_AUTH",
                "ClientId": self.client_id,
                "AuthParameters": {"REFRESH_TOKEN": refresh_token},
            }))
            .await?;

        Ok(TokenSet {
            id_token: result.id_token,
            access_token: result.access_token,
            refresh_token: result.refresh_token,
            expires_at: expiry(result.expires_in),
        })
    }
}

/// Holder of the current token set
///
/// Readers take the `RwLock` briefly and always see a whole `TokenSet`.
/// Exchanges run under `exchange`, so at most one is in flight.
pub struct CredentialStore {
    username: String,
    password: String,
    provider: Arc<dyn IdentityProvider>,
    tokens: RwLock<Option<TokenSet>>,
    exchange: Mutex<()>,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Build a store, authenticating unless all three tokens were supplied
    pub async fn connect(
        credentials: Credentials,
        provider: Arc<dyn IdentityProvider>,
    ) -> Result<Self> {
        let initial = credentials.tokens();
        let store = Self {
            username: credentials.username,
            password: credentials.password,
            provider,
            tokens: RwLock::new(initial),
            exchange: Mutex::new(()),
        };
        if store.tokens.read().await.is_none() {
            store.authenticate().await?;
        }
        Ok(store)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Run a password exchange and replace all tokens
    pub async fn authenticate(&self) -> Result<()> {
        let _guard = self.exchange.lock().await;
        self.authenticate_locked().await
    }

    async fn authenticate_locked(&self) -> Result<()> {
        info!(username = %self.username, "Authenticating with identity provider");
        let tokens = self
            .provider
            .authenticate(&self.username, &self.password)
            .await?;
        *self.tokens.write().await = Some(tokens);
        Ok(())
    }

    /// Exchange the refresh token for new id and access tokens
    ///
    /// Callers that observed the same stale access token converge on a
    /// single exchange: whoever takes the lock second finds the token
    /// already replaced and returns. Without a refresh token this falls
    /// back to [`authenticate`](Self::authenticate).
    pub async fn refresh(&self) -> Result<()> {
        let observed = self.current_access_token().await;
        let _guard = self.exchange.lock().await;

        let current = self.tokens.read().await.clone();
        if current.as_ref().map(|t| &t.access_token) != observed.as_ref() {
            debug!("Tokens replaced while waiting, skipping refresh");
            return Ok(());
        }

        let refresh_token = current.as_ref().and_then(|t| t.refresh_token.clone());
        let Some(refresh_token) = refresh_token else {
            return self.authenticate_locked().await;
        };

        info!(username = %self.username, "Refreshing access token");
        let fresh = self.provider.refresh(&self.username, &refresh_token).await?;
        *self.tokens.write().await = Some(TokenSet {
            refresh_token: fresh.refresh_token.or(Some(refresh_token)),
            ..fresh
        });
        Ok(())
    }

    async fn current_access_token(&self) -> Option<String> {
        self.tokens
            .read()
            .await
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    /// Access token of the latest successful exchange
    pub async fn access_token(&self) -> Result<String> {
        self.current_access_token()
            .await
            .ok_or_else(|| EvnexError::Authentication {
                code: "NoToken".to_string(),
                message: "no access token held".to_string(),
            })
    }

    /// Snapshot of the current token set
    pub async fn tokens(&self) -> Option<TokenSet> {
        self.tokens.read().await.clone()
    }
}

fn is_throttled(code: &str) -> bool {
    matches!(
        code,
        "TooManyRequestsException" | "LimitExceededException" | "InternalErrorException"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Default)]
    struct CountingProvider {
        logins: AtomicU32,
        refreshes: AtomicU32,
    }

    #[async_trait]
    impl IdentityProvider for CountingProvider {
        async fn authenticate(&self, username: &str, password: &str) -> Result<TokenSet> {
            if password != "secret" {
                return Err(EvnexError::Authentication {
                    code: "NotAuthorizedException".to_string(),
                    message: "Incorrect username or password.".to_string(),
                });
            }
            let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(TokenSet {
                id_token: format!("id-{}-{}", username, n),
                access_token: format!("login-{}", n),
                refresh_token: Some(format!("refresh-{}", n)),
                expires_at: None,
            })
        }

        async fn refresh(&self, _username: &str, refresh_token: &str) -> Result<TokenSet> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(TokenSet {
                id_token: format!("id-r{}", n),
                access_token: format!("refreshed-{}-from-{}", n, refresh_token),
                refresh_token: None,
                expires_at: None,
            })
        }
    }

    #[tokio::test]
    async fn test_connect_authenticates_when_tokens_missing() {
        let provider = Arc::new(CountingProvider::default());
        let mut credentials = Credentials::new("jane@example.com", "secret");
        credentials.access_token = Some("partial".to_string());

        let store = CredentialStore::connect(credentials, provider.clone())
            .await
            .unwrap();
        assert_eq!(provider.logins.load(Ordering::SeqCst), 1);
        assert_eq!(store.access_token().await.unwrap(), "login-1");
    }

    #[tokio::test]
    async fn test_connect_with_full_token_set_skips_exchange() {
        let provider = Arc::new(CountingProvider::default());
        let credentials = Credentials {
            id_token: Some("id".to_string()),
            access_token: Some("access".to_string()),
            refresh_token: Some("refresh".to_string()),
            ..Credentials::new("jane@example.com", "secret")
        };

        let store = CredentialStore::connect(credentials, provider.clone())
            .await
            .unwrap();
        assert_eq!(provider.logins.load(Ordering::SeqCst), 0);
        assert_eq!(store.access_token().await.unwrap(), "access");
    }

    #[tokio::test]
    async fn test_bad_password_surfaces_authentication_error() {
        let provider = Arc::new(CountingProvider::default());
        let result =
            CredentialStore::connect(Credentials::new("jane@example.com", "wrong"), provider).await;
        match result {
            Err(EvnexError::Authentication { code, .. }) => {
                assert_eq!(code, "NotAuthorizedException")
            }
            other => panic!("expected authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token() {
        let provider = Arc::new(CountingProvider::default());
        let store =
            CredentialStore::connect(Credentials::new("jane@example.com", "secret"), provider)
                .await
                .unwrap();

        store.refresh().await.unwrap();
        let tokens = store.tokens().await.unwrap();
        assert_eq!(tokens.access_token, "refreshed-1-from-refresh-1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-1"));
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_converge() {
        let provider = Arc::new(CountingProvider::default());
        let store = Arc::new(
            CredentialStore::connect(Credentials::new("jane@example.com", "secret"), provider.clone())
                .await
                .unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.refresh().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials = Credentials {
            access_token: Some("token-value".to_string()),
            ..Credentials::new("jane@example.com", "hunter2")
        };
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("token-value"));
        assert!(debug.contains("jane@example.com"));
    }

    #[test]
    fn test_region_from_pool_id() {
        assert_eq!(
            region_from_pool_id("ap-southeast-2_zWnqo6ASv").unwrap(),
            "ap-southeast-2"
        );
        assert!(region_from_pool_id("nounderscore").is_err());
        assert!(region_from_pool_id("_abc").is_err());
    }

    #[test]
    fn test_cognito_endpoint_from_region() {
        let provider = CognitoIdentityProvider::new(
            "ap-southeast-2_zWnqo6ASv",
            "client",
            None,
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(
            provider.endpoint(),
            "https://cognito-idp.ap-southeast-2.amazonaws.com/"
        );
    }
}
