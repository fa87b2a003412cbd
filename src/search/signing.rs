//! SigV4 Request Signing
//!
//! OpenSearch Serverless only accepts requests signed with AWS Signature V4
//! for the `aoss` service. Credentials come from a provider (normally the
//! default AWS chain) and are fetched per request so rotated session tokens
//! are picked up.

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sigv4::http_request::{
    PayloadChecksumKind, SignableBody, SignableRequest, SigningParams, SigningSettings, sign,
};
use aws_sigv4::sign::v4;
use std::time::SystemTime;

use crate::constants::search::SIGNING_SERVICE;
use crate::types::{LogragError, Result};

/// Signs search requests for one region
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    credentials: SharedCredentialsProvider,
    region: String,
}

impl SigV4Signer {
    pub fn new(credentials: SharedCredentialsProvider, region: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
        }
    }

    /// Signer over the default AWS credential chain.
    ///
    /// Fails when the chain yields no credentials, so a session never starts
    /// without a way to reach the index.
    pub async fn from_default_chain(region: &str) -> Result<Self> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        let credentials = sdk_config.credentials_provider().ok_or_else(|| {
            LogragError::Config("No AWS credential provider available".to_string())
        })?;

        let signer = Self::new(credentials, region);
        signer.ensure_credentials().await?;
        Ok(signer)
    }

    /// Startup check: credentials resolve now
    pub async fn ensure_credentials(&self) -> Result<()> {
        self.credentials
            .provide_credentials()
            .await
            .map(|_| ())
            .map_err(|e| LogragError::Config(format!("AWS credentials not found: {e}")))
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    async fn current_credentials(&self) -> Result<Credentials> {
        self.credentials
            .provide_credentials()
            .await
            .map_err(|e| LogragError::Transport(format!("Failed to load AWS credentials: {e}")))
    }

    /// Headers that carry the signature for this request
    pub async fn sign(
        &self,
        method: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Vec<(String, String)>> {
        self.sign_at(method, url, headers, body, SystemTime::now())
            .await
    }

    pub(crate) async fn sign_at(
        &self,
        method: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
        time: SystemTime,
    ) -> Result<Vec<(String, String)>> {
        let identity = self.current_credentials().await?.into();

        // aoss rejects requests without x-amz-content-sha256
        let mut settings = SigningSettings::default();
        settings.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;

        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(SIGNING_SERVICE)
            .time(time)
            .settings(settings)
            .build()
            .map_err(|e| LogragError::Config(format!("Invalid signing parameters: {e}")))?
            .into();

        let signable = SignableRequest::new(
            method,
            url,
            headers.iter().copied(),
            SignableBody::Bytes(body),
        )
        .map_err(|e| LogragError::Config(format!("Request cannot be signed: {e}")))?;

        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| LogragError::Config(format!("Signing failed: {e}")))?
            .into_parts();

        Ok(instructions
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_credential_types::provider::{error::CredentialsError, future};

    #[derive(Debug)]
    struct NoCredentials;

    impl ProvideCredentials for NoCredentials {
        fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
        where
            Self: 'a,
        {
            future::ProvideCredentials::ready(Err(CredentialsError::not_loaded(
                "no profile, environment or instance credentials",
            )))
        }
    }

    fn static_signer() -> SigV4Signer {
        let credentials = Credentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            Some("session-token".to_string()),
            None,
            "static",
        );
        SigV4Signer::new(SharedCredentialsProvider::new(credentials), "eu-west-1")
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[tokio::test]
    async fn test_signature_scoped_to_region_and_service() {
        let headers = static_signer()
            .sign(
                "POST",
                "https://abc.eu-west-1.aoss.amazonaws.com/logs/_search",
                &[("content-type", "application/json")],
                br#"{"size":1}"#,
            )
            .await
            .unwrap();

        let auth = header(&headers, "authorization").unwrap();
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
        assert!(auth.contains("/eu-west-1/aoss/aws4_request"));
        assert!(auth.contains("x-amz-content-sha256"));
        assert!(header(&headers, "x-amz-date").is_some());
        assert_eq!(header(&headers, "x-amz-security-token"), Some("session-token"));
    }

    #[tokio::test]
    async fn test_signature_depends_on_body() {
        let signer = static_signer();
        let time = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
        let url = "https://abc.eu-west-1.aoss.amazonaws.com/logs/_search";

        let a = signer.sign_at("POST", url, &[], b"{\"size\":1}", time).await.unwrap();
        let again = signer.sign_at("POST", url, &[], b"{\"size\":1}", time).await.unwrap();
        let b = signer.sign_at("POST", url, &[], b"{\"size\":2}", time).await.unwrap();

        assert_eq!(header(&a, "authorization"), header(&again, "authorization"));
        assert_ne!(header(&a, "authorization"), header(&b, "authorization"));
    }

    #[tokio::test]
    async fn test_missing_credentials_is_config_error() {
        let signer = SigV4Signer::new(SharedCredentialsProvider::new(NoCredentials), "us-east-1");

        let err = signer.ensure_credentials().await.unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("AWS credentials not found"));

        let err = signer.sign("POST", "https://h/i/_search", &[], b"{}").await.unwrap_err();
        assert!(matches!(err, LogragError::Transport(_)));
    }
}
