use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{AppAuthenticator, InstallationClient, ProjectsClient};
use crate::error::Error;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Serialize)]
struct AppClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

#[derive(Debug, Deserialize)]
struct InstallationToken {
    token: String,
}

/// A GitHub App identity that can mint installation tokens.
#[derive(Clone)]
pub struct GitHubApp {
    app_id: u64,
    key: EncodingKey,
    http: reqwest::Client,
    api_url: String,
}

impl GitHubApp {
    pub fn new(app_id: u64, private_key_pem: &str, api_url: &str) -> Result<Self, Error> {
        let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| Error::Configuration(format!("GitHub App private key: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            app_id,
            key,
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Short-lived JWT identifying the App itself. `iat` is backdated a minute
    /// to absorb clock drift; GitHub caps the lifetime at ten minutes.
    fn app_jwt(&self) -> Result<String, Error> {
        let now = Utc::now();
        let claims = AppClaims {
            iat: (now - Duration::seconds(60)).timestamp(),
            exp: (now + Duration::minutes(9)).timestamp(),
            iss: self.app_id.to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| Error::Configuration(format!("signing App JWT: {e}")))
    }
}

#[async_trait]
impl AppAuthenticator for GitHubApp {
    #[instrument(skip(self), fields(app_id = self.app_id))]
    async fn installation_client(
        &self,
        installation_id: u64,
    ) -> Result<Box<dyn ProjectsClient>, Error> {
        let jwt = self.app_jwt()?;
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_url, installation_id
        );

        debug!("Requesting installation access token");
        let response = self.http.post(&url).bearer_auth(jwt).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "Installation token request failed");
            return Err(Error::RemoteCall(format!(
                "installation token request returned {status}: {body}"
            )));
        }

        let token: InstallationToken = response.json().await?;

        Ok(Box::new(InstallationClient::new(
            self.http.clone(),
            token.token,
            format!("{}/graphql", self.api_url),
        )))
    }
}
