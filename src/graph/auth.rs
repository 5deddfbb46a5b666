//! OAuth2 client-credentials authentication for the directory API.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::env;

use crate::error::{GraphError, GraphResult};

/// Default login endpoint for token acquisition.
const DEFAULT_LOGIN_ENDPOINT: &str = "https://login.microsoftonline.com";

/// Default resource scope suffix for client-credentials tokens.
const DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// OAuth2 token response from the login endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// An acquired access token with its expiry.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub bearer: String,
    pub expires_at: DateTime<Utc>,
}

/// App-registration credentials for the client-credentials flow.
#[derive(Debug, Clone)]
pub struct GraphCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    login_endpoint: String,
    scope: String,
}

impl GraphCredentials {
    /// Create credentials with explicit values.
    pub fn new(tenant_id: String, client_id: String, client_secret: String) -> Self {
        Self {
            tenant_id,
            client_id,
            client_secret,
            login_endpoint: DEFAULT_LOGIN_ENDPOINT.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }

    /// Create credentials from environment variables
    /// `GRAPH_TENANT_ID`, `GRAPH_CLIENT_ID`, `GRAPH_CLIENT_SECRET`.
    pub fn from_env() -> GraphResult<Self> {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        let tenant_id = require_env("GRAPH_TENANT_ID")?;
        let client_id = require_env("GRAPH_CLIENT_ID")?;
        let client_secret = require_env("GRAPH_CLIENT_SECRET")?;

        Ok(Self::new(tenant_id, client_id, client_secret))
    }

    /// Override the login endpoint (sovereign clouds, test servers).
    pub fn with_login_endpoint(mut self, endpoint: &str) -> Self {
        self.login_endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// Override the token scope.
    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_string();
        self
    }

    /// URL of the tenant's token endpoint.
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_endpoint, self.tenant_id
        )
    }

    /// Acquire an access token via the client-credentials flow.
    pub async fn acquire_token(&self, http: &reqwest::Client) -> GraphResult<AccessToken> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = http
            .post(self.token_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| GraphError::Auth(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Auth(format!(
                "Token request failed with status {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GraphError::Auth(format!("Failed to parse token response: {}", e)))?;

        Ok(AccessToken {
            bearer: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }
}

fn require_env(name: &str) -> GraphResult<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| GraphError::Auth(format!("{} not set", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_url() {
        let creds = GraphCredentials::new(
            "contoso-tenant".into(),
            "client".into(),
            "secret".into(),
        );
        assert_eq!(
            creds.token_url(),
            "https://login.microsoftonline.com/contoso-tenant/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_login_endpoint_override() {
        let creds = GraphCredentials::new("t".into(), "c".into(), "s".into())
            .with_login_endpoint("http://localhost:9000/");
        assert_eq!(creds.token_url(), "http://localhost:9000/t/oauth2/v2.0/token");
    }

    #[test]
    fn test_token_response_parsing() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"token_type": "Bearer", "expires_in": 3599, "access_token": "abc"}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, 3599);
    }
}
