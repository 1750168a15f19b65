use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleIdentity {
    pub google_id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Checks a Google sign-in credential with the issuer.
#[async_trait]
pub trait GoogleVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> anyhow::Result<GoogleIdentity>;
}

/// Verifies ID tokens through Google's `tokeninfo` endpoint.
pub struct TokenInfoVerifier {
    http: reqwest::Client,
    client_id: Option<String>,
}

impl TokenInfoVerifier {
    pub fn new(client_id: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("build google http client")?;
        Ok(Self { http, client_id })
    }
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: Option<String>,
    email_verified: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl TokenInfo {
    fn into_identity(self, client_id: &str) -> anyhow::Result<GoogleIdentity> {
        anyhow::ensure!(self.aud == client_id, "token audience mismatch");
        anyhow::ensure!(
            self.email_verified.as_deref() != Some("false"),
            "google email not verified"
        );
        let email = self
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .context("token has no email")?;
        Ok(GoogleIdentity {
            google_id: self.sub,
            email,
            name: self.name.filter(|n| !n.trim().is_empty()),
            picture: self.picture,
        })
    }
}

#[async_trait]
impl GoogleVerifier for TokenInfoVerifier {
    async fn verify(&self, credential: &str) -> anyhow::Result<GoogleIdentity> {
        let client_id = self
            .client_id
            .as_deref()
            .context("GOOGLE_CLIENT_ID is not configured")?;

        let info: TokenInfo = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("id_token", credential)])
            .send()
            .await
            .context("tokeninfo request")?
            .error_for_status()
            .context("tokeninfo rejected credential")?
            .json()
            .await
            .context("decode tokeninfo")?;

        let identity = info.into_identity(client_id)?;
        debug!(google_id = %identity.google_id, "google credential verified");
        Ok(identity)
    }
}
