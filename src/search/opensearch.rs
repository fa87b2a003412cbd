//! OpenSearch k-NN Backend
//!
//! Posts `{"size": k, "query": {"knn": {"log_embedding": {...}}}}` to
//! `{endpoint}/{index}/_search` and returns `hits.hits[]._source.message`.
//! Connection failures, timeouts, 429 and 5xx responses are retried with
//! exponential backoff; other HTTP errors fail immediately. Requests are
//! unauthenticated, basic-auth, or SigV4-signed (see [`SearchAuth`]).

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{SearchBackend, SigV4Signer};
use crate::config::ChatConfig;
use crate::constants::search::{
    MESSAGE_FIELD, RETRY_BASE_DELAY_MS, RETRY_MAX_DELAY_SECS, VECTOR_FIELD,
};
use crate::types::{LogragError, Result};

const CONTENT_TYPE: &str = "content-type";
const JSON: &str = "application/json";

/// k-NN query body
pub fn knn_query(vector: &[f64], k: usize) -> Value {
    json!({
        "size": k,
        "query": {
            "knn": {
                VECTOR_FIELD: {
                    "vector": vector,
                    "k": k,
                }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source", default)]
    source: Value,
}

/// Message texts in hit order; hits without a string message are skipped
fn extract_messages(response: SearchResponse) -> Vec<String> {
    response
        .hits
        .hits
        .into_iter()
        .filter_map(|hit| match hit.source.get(MESSAGE_FIELD) {
            Some(Value::String(message)) => Some(message.clone()),
            _ => None,
        })
        .collect()
}

/// Accept bare hostnames as well as full URLs
fn endpoint_url(endpoint: &str) -> Result<Url> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    Url::parse(&format!("{with_scheme}/"))
        .map_err(|e| LogragError::Config(format!("Invalid search endpoint '{endpoint}': {e}")))
}

/// How search requests authenticate
#[derive(Debug, Clone)]
pub enum SearchAuth {
    None,
    /// Self-managed clusters with the security plugin
    Basic {
        username: String,
        password: SecretString,
    },
    /// OpenSearch Serverless
    SigV4(SigV4Signer),
}

/// HTTP search backend
#[derive(Debug)]
pub struct OpenSearchBackend {
    client: reqwest::Client,
    search_url: Url,
    auth: SearchAuth,
    max_retries: u32,
}

impl OpenSearchBackend {
    pub fn new(endpoint: &str, index: &str, timeout: Duration) -> Result<Self> {
        let search_url = endpoint_url(endpoint)?
            .join(&format!("{index}/_search"))
            .map_err(|e| LogragError::Config(format!("Invalid index name '{index}': {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LogragError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            search_url,
            auth: SearchAuth::None,
            max_retries: 0,
        })
    }

    /// Backend for a resolved chat configuration.
    ///
    /// Basic auth is used when both username and password are configured;
    /// otherwise requests are SigV4-signed with the default AWS credential
    /// chain, and missing credentials fail here.
    pub async fn from_config(config: &ChatConfig) -> Result<Self> {
        let backend = Self::new(
            &config.opensearch_host,
            &config.index_name,
            config.runtime_settings().read_timeout,
        )?
        .with_max_retries(config.max_retries());

        match (&config.opensearch_username, &config.opensearch_password) {
            (Some(username), Some(password)) => {
                Ok(backend.with_basic_auth(username, password.clone()))
            }
            _ => {
                let signer = SigV4Signer::from_default_chain(&config.aws_region).await?;
                Ok(backend.with_sigv4(signer))
            }
        }
    }

    pub fn with_basic_auth(mut self, username: &str, password: impl Into<SecretString>) -> Self {
        self.auth = SearchAuth::Basic {
            username: username.to_string(),
            password: password.into(),
        };
        self
    }

    pub fn with_sigv4(mut self, signer: SigV4Signer) -> Self {
        self.auth = SearchAuth::SigV4(signer);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }

    pub fn auth(&self) -> &SearchAuth {
        &self.auth
    }

    async fn search_once(&self, body: &[u8]) -> Result<Vec<String>> {
        let mut request = self
            .client
            .post(self.search_url.clone())
            .header(CONTENT_TYPE, JSON)
            .body(body.to_vec());

        match &self.auth {
            SearchAuth::None => {}
            SearchAuth::Basic { username, password } => {
                request = request.basic_auth(username, Some(password.expose_secret()));
            }
            SearchAuth::SigV4(signer) => {
                let signed = signer
                    .sign("POST", self.search_url.as_str(), &[(CONTENT_TYPE, JSON)], body)
                    .await?;
                for (name, value) in signed {
                    request = request.header(name, value);
                }
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| LogragError::Transport(format!("Search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("Search returned {status}: {body}");
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                LogragError::Transport(message)
            } else {
                LogragError::Search(message)
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| LogragError::Response(format!("Failed to parse search response: {e}")))?;

        Ok(extract_messages(parsed))
    }
}

#[async_trait]
impl SearchBackend for OpenSearchBackend {
    async fn knn(&self, vector: &[f64], k: usize) -> Result<Vec<String>> {
        let body = serde_json::to_vec(&knn_query(vector, k))?;
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(RETRY_BASE_DELAY_MS))
            .with_max_delay(Duration::from_secs(RETRY_MAX_DELAY_SECS))
            .with_max_times(self.max_retries as usize);

        let messages = (|| self.search_once(&body))
            .retry(backoff)
            .when(|e| matches!(e, LogragError::Transport(_)))
            .notify(|e, delay| {
                warn!(error = %e, delay_ms = delay.as_millis() as u64, "Retrying search");
            })
            .await?;

        debug!(k, hits = messages.len(), "k-NN search completed");
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{basic_auth, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn hits(messages: &[Value]) -> Value {
        json!({
            "took": 3,
            "hits": {
                "total": {"value": messages.len()},
                "hits": messages
                    .iter()
                    .map(|m| json!({"_index": "app-logs", "_score": 0.9, "_source": {"message": m, "level": "ERROR"}}))
                    .collect::<Vec<_>>(),
            }
        })
    }

    fn backend(server: &MockServer) -> OpenSearchBackend {
        OpenSearchBackend::new(&server.uri(), "app-logs", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_knn_query_shape() {
        let body = knn_query(&[0.5, -1.0], 3);
        assert_eq!(
            body,
            json!({"size": 3, "query": {"knn": {"log_embedding": {"vector": [0.5, -1.0], "k": 3}}}})
        );
    }

    #[test]
    fn test_endpoint_without_scheme() {
        let backend =
            OpenSearchBackend::new("abc123.us-east-1.aoss.amazonaws.com", "logs", Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            backend.search_url().as_str(),
            "https://abc123.us-east-1.aoss.amazonaws.com/logs/_search"
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let backend = OpenSearchBackend::new("https://h", "i", Duration::from_secs(1))
            .unwrap()
            .with_basic_auth("admin", "s3cret");
        assert!(!format!("{:?}", backend).contains("s3cret"));
    }

    #[tokio::test]
    async fn test_knn_returns_messages_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/app-logs/_search"))
            .and(body_json(knn_query(&[0.5, 0.25], 2)))
            .respond_with(ResponseTemplate::new(200).set_body_json(hits(&[
                json!("db connection refused"),
                json!("retry 3/3 failed"),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let messages = backend(&server).knn(&[0.5, 0.25], 2).await.unwrap();
        assert_eq!(messages, vec!["db connection refused", "retry 3/3 failed"]);
    }

    #[tokio::test]
    async fn test_hits_without_message_are_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(hits(&[
                json!("kept"),
                Value::Null,
                json!(42),
            ])))
            .mount(&server)
            .await;

        let messages = backend(&server).knn(&[1.0], 3).await.unwrap();
        assert_eq!(messages, vec!["kept"]);
    }

    #[tokio::test]
    async fn test_basic_auth_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(basic_auth("admin", "s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(hits(&[json!("ok")])))
            .expect(1)
            .mount(&server)
            .await;

        let messages = backend(&server)
            .with_basic_auth("admin", "s3cret")
            .knn(&[1.0], 1)
            .await
            .unwrap();
        assert_eq!(messages, vec!["ok"]);
    }

    #[tokio::test]
    async fn test_sigv4_headers_sent() {
        use aws_credential_types::Credentials;
        use aws_credential_types::provider::SharedCredentialsProvider;
        use wiremock::Request;
        use wiremock::matchers::{header, header_exists};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/app-logs/_search"))
            .and(header("content-type", "application/json"))
            .and(header("x-amz-security-token", "session-token"))
            .and(header_exists("x-amz-date"))
            .and(header_exists("x-amz-content-sha256"))
            .and(|req: &Request| {
                req.headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|v| {
                        v.starts_with("AWS4-HMAC-SHA256 ")
                            && v.contains("/us-east-1/aoss/aws4_request")
                    })
            })
            .respond_with(ResponseTemplate::new(200).set_body_json(hits(&[json!("signed")])))
            .expect(1)
            .mount(&server)
            .await;

        let credentials = Credentials::new(
            "AKIDEXAMPLE",
            "secret",
            Some("session-token".to_string()),
            None,
            "static",
        );
        let signer = SigV4Signer::new(SharedCredentialsProvider::new(credentials), "us-east-1");

        let messages = backend(&server)
            .with_sigv4(signer)
            .knn(&[0.123, -0.0456], 1)
            .await
            .unwrap();
        assert_eq!(messages, vec!["signed"]);
    }

    #[tokio::test]
    async fn test_from_config_prefers_basic_auth() {
        let config = ChatConfig {
            opensearch_host: "https://search.internal:9200".to_string(),
            opensearch_username: Some("admin".to_string()),
            opensearch_password: Some(SecretString::from("s3cret")),
            ..ChatConfig::default()
        };

        let backend = OpenSearchBackend::from_config(&config).await.unwrap();
        assert!(matches!(backend.auth(), SearchAuth::Basic { username, .. } if username == "admin"));
        assert!(!format!("{:?}", backend).contains("s3cret"));
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad query"))
            .expect(1)
            .mount(&server)
            .await;

        let err = backend(&server)
            .with_max_retries(3)
            .knn(&[1.0], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, LogragError::Search(_)));
        assert!(err.to_string().contains("bad query"));
    }

    #[tokio::test]
    async fn test_server_error_retried_up_to_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let err = backend(&server)
            .with_max_retries(2)
            .knn(&[1.0], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, LogragError::Transport(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_response_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = backend(&server).knn(&[1.0], 1).await.unwrap_err();
        assert!(matches!(err, LogragError::Response(_)));
    }
}
