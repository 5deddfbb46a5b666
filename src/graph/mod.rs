//! Directory API client: typed lookups, full pagination, membership writes.
//!
//! One [`GraphClient`] is constructed at startup (acquiring a single access
//! token) and passed explicitly into the audit functions — there is no
//! ambient global session. The [`Directory`] trait is the seam the batch
//! loops are written against, so tests can substitute an in-memory fake.
//!
//! There is deliberately no retry or backoff here: every remote failure maps
//! to a tagged [`GraphError`] and the caller decides (by policy, uniformly)
//! to count it and move on.

pub mod auth;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

use crate::error::{GraphError, GraphResult};
use crate::models::{AuthMethod, DirectoryDevice, DirectoryUser, MembershipRef};

pub use auth::{AccessToken, GraphCredentials};

/// Default directory API base URL.
const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Request timeout for every directory call.
const REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Wire shapes
// =============================================================================

/// One page of a paginated collection response.
#[derive(Debug, Deserialize)]
pub struct ODataPage<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Error envelope the directory API returns on failure.
#[derive(Debug, Deserialize)]
struct ODataError {
    error: ODataErrorBody,
}

#[derive(Debug, Deserialize)]
struct ODataErrorBody {
    code: String,
    message: String,
}

// =============================================================================
// Pagination
// =============================================================================

/// Drain every continuation page of a collection, starting at `first_url`.
///
/// The output is the concatenation of all pages in order; stopping at the
/// first page would be a correctness bug, not an optimization.
pub(crate) async fn drain_pages<T, F, Fut>(first_url: String, mut fetch: F) -> GraphResult<Vec<T>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = GraphResult<ODataPage<T>>>,
{
    let mut items = Vec::new();
    let mut url = Some(first_url);

    while let Some(next) = url {
        let page = fetch(next).await?;
        items.extend(page.value);
        url = page.next_link;
    }

    Ok(items)
}

// =============================================================================
// Status classification
// =============================================================================

/// Map a failed response to the tagged error taxonomy.
fn classify_status(status: reqwest::StatusCode, body: &str) -> GraphError {
    let detail = serde_json::from_str::<ODataError>(body)
        .map(|e| e.error)
        .ok();
    let message = detail
        .as_ref()
        .map(|d| d.message.clone())
        .unwrap_or_else(|| body.to_string());

    match status {
        reqwest::StatusCode::NOT_FOUND => GraphError::NotFound(message),
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            GraphError::Unauthorized(message)
        }
        reqwest::StatusCode::TOO_MANY_REQUESTS => GraphError::Throttled,
        s if s.is_server_error() => GraphError::Transient(format!("HTTP {}: {}", s, message)),
        s => GraphError::Api {
            code: detail.map(|d| d.code).unwrap_or_else(|| s.to_string()),
            message,
        },
    }
}

/// Escape a value for embedding in an OData `$filter` string literal.
fn odata_quote(value: &str) -> String {
    value.replace('\'', "''")
}

// =============================================================================
// Directory seam
// =============================================================================

/// The directory operations the audit loops are written against.
#[async_trait]
pub trait Directory {
    /// Resolve a user principal by UPN.
    async fn user_by_upn(&self, upn: &str) -> GraphResult<DirectoryUser>;

    /// Complete membership collection for a user, all pages.
    async fn memberships(&self, user_id: &str) -> GraphResult<Vec<MembershipRef>>;

    /// Complete registered-authentication-method collection, all pages.
    async fn auth_methods(&self, user_id: &str) -> GraphResult<Vec<AuthMethod>>;

    /// Devices whose display name exactly matches `name`, all pages.
    async fn devices_by_name(&self, name: &str) -> GraphResult<Vec<DirectoryDevice>>;

    /// Add a directory object to a group's membership.
    async fn add_group_member(&self, group_id: &str, object_id: &str) -> GraphResult<()>;
}

// =============================================================================
// Client
// =============================================================================

/// Directory API client holding the single session for a run.
pub struct GraphClient {
    http: reqwest::Client,
    token: AccessToken,
    base_url: String,
}

impl GraphClient {
    /// Build the HTTP client and acquire the run's access token.
    pub async fn connect(credentials: GraphCredentials) -> GraphResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GraphError::Transient(format!("Failed to build HTTP client: {}", e)))?;

        let token = credentials.acquire_token(&http).await?;

        Ok(Self {
            http,
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the API base URL (sovereign clouds, test servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// When the run's token expires.
    pub fn token_expires_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.token.expires_at
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> GraphResult<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token.bearer)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            response.json::<T>().await.map_err(GraphError::from)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_status(status, &body))
        }
    }

    async fn get_all<T: DeserializeOwned>(&self, first_url: String) -> GraphResult<Vec<T>> {
        drain_pages(first_url, |url| async move {
            self.get_json::<ODataPage<T>>(&url).await
        })
        .await
    }
}

#[async_trait]
impl Directory for GraphClient {
    async fn user_by_upn(&self, upn: &str) -> GraphResult<DirectoryUser> {
        let url = format!(
            "{}/users/{}?$select=id,userPrincipalName,displayName,accountEnabled",
            self.base_url, upn
        );
        self.get_json(&url).await
    }

    async fn memberships(&self, user_id: &str) -> GraphResult<Vec<MembershipRef>> {
        let url = format!(
            "{}/users/{}/memberOf?$select=id,displayName",
            self.base_url, user_id
        );
        self.get_all(url).await
    }

    async fn auth_methods(&self, user_id: &str) -> GraphResult<Vec<AuthMethod>> {
        let url = format!("{}/users/{}/authentication/methods", self.base_url, user_id);
        self.get_all(url).await
    }

    async fn devices_by_name(&self, name: &str) -> GraphResult<Vec<DirectoryDevice>> {
        let url = format!(
            "{}/devices?$filter=displayName eq '{}'",
            self.base_url,
            odata_quote(name)
        );
        self.get_all(url).await
    }

    async fn add_group_member(&self, group_id: &str, object_id: &str) -> GraphResult<()> {
        let url = format!("{}/groups/{}/members/$ref", self.base_url, group_id);
        let body = member_ref_body(&self.base_url, object_id);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token.bearer)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(classify_status(status, &text))
        }
    }
}

/// Reference body for a membership add.
fn member_ref_body(base_url: &str, object_id: &str) -> serde_json::Value {
    serde_json::json!({
        "@odata.id": format!("{}/directoryObjects/{}", base_url, object_id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odata_page_parsing() {
        let json = r#"{
            "value": [{"id": "1", "displayName": "A"}, {"id": "2"}],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/users/u/memberOf?$skiptoken=xxx"
        }"#;

        let page: ODataPage<MembershipRef> = serde_json::from_str(json).unwrap();
        assert_eq!(page.value.len(), 2);
        assert!(page.next_link.is_some());
    }

    #[test]
    fn test_odata_page_last_page() {
        let json = r#"{"value": []}"#;
        let page: ODataPage<AuthMethod> = serde_json::from_str(json).unwrap();
        assert!(page.value.is_empty());
        assert!(page.next_link.is_none());
    }

    #[tokio::test]
    async fn test_drain_pages_concatenates_all_pages() {
        let calls = std::cell::RefCell::new(0usize);

        let items: Vec<u32> = drain_pages("page1".to_string(), |url| {
            *calls.borrow_mut() += 1;
            async move {
                Ok(match url.as_str() {
                    "page1" => ODataPage {
                        value: vec![1, 2],
                        next_link: Some("page2".to_string()),
                    },
                    "page2" => ODataPage {
                        value: vec![3],
                        next_link: Some("page3".to_string()),
                    },
                    _ => ODataPage {
                        value: vec![4, 5],
                        next_link: None,
                    },
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(*calls.borrow(), 3);
    }

    #[tokio::test]
    async fn test_drain_pages_single_page() {
        let items: Vec<u32> = drain_pages("only".to_string(), |_| async {
            Ok(ODataPage {
                value: vec![7],
                next_link: None,
            })
        })
        .await
        .unwrap();
        assert_eq!(items, vec![7]);
    }

    #[tokio::test]
    async fn test_drain_pages_propagates_mid_collection_failure() {
        let result: GraphResult<Vec<u32>> = drain_pages("page1".to_string(), |url| async move {
            if url == "page1" {
                Ok(ODataPage {
                    value: vec![1],
                    next_link: Some("page2".to_string()),
                })
            } else {
                Err(GraphError::Throttled)
            }
        })
        .await;
        assert!(matches!(result, Err(GraphError::Throttled)));
    }

    #[test]
    fn test_classify_status() {
        let not_found = classify_status(
            reqwest::StatusCode::NOT_FOUND,
            r#"{"error": {"code": "Request_ResourceNotFound", "message": "No such user"}}"#,
        );
        assert!(matches!(not_found, GraphError::NotFound(m) if m == "No such user"));

        assert!(matches!(
            classify_status(reqwest::StatusCode::FORBIDDEN, ""),
            GraphError::Unauthorized(_)
        ));
        assert!(matches!(
            classify_status(reqwest::StatusCode::TOO_MANY_REQUESTS, ""),
            GraphError::Throttled
        ));
        assert!(matches!(
            classify_status(reqwest::StatusCode::BAD_GATEWAY, "upstream"),
            GraphError::Transient(_)
        ));

        let api = classify_status(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error": {"code": "Request_BadRequest", "message": "Invalid filter"}}"#,
        );
        assert!(matches!(api, GraphError::Api { code, .. } if code == "Request_BadRequest"));
    }

    #[test]
    fn test_odata_quote() {
        assert_eq!(odata_quote("PC-100"), "PC-100");
        assert_eq!(odata_quote("O'Brien's PC"), "O''Brien''s PC");
    }

    #[test]
    fn test_member_ref_body() {
        let body = member_ref_body("https://graph.microsoft.com/v1.0", "obj-1");
        assert_eq!(
            body["@odata.id"],
            "https://graph.microsoft.com/v1.0/directoryObjects/obj-1"
        );
    }
}
