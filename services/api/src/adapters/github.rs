//! services/api/src/adapters/github.rs
//!
//! An implementation of the `GitHubOAuthService` port over GitHub's OAuth web
//! flow and REST API, using `reqwest`.

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde::Deserialize;
use todo_core::domain::{GitHubEmail, GitHubUser};
use todo_core::ports::{GitHubOAuthService, PortError, PortResult};
use tracing::{debug, error};

use crate::config::{ConfigError, GitHubConfig};
use crate::error::ApiError;

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const API_URL: &str = "https://api.github.com";
const SCOPES: &[&str] = &["user:email"];

//=========================================================================================
// GitHub API Payloads
//=========================================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmailResponse {
    email: String,
    primary: bool,
    verified: bool,
}

//=========================================================================================
// The Adapter
//=========================================================================================

#[derive(Debug, Clone)]
pub struct GitHubOAuthAdapter {
    client: Client,
    authorize_base: Url,
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl GitHubOAuthAdapter {
    /// Builds the adapter against github.com.
    pub fn new(config: &GitHubConfig) -> Result<Self, ApiError> {
        let authorize_base = Url::parse(AUTHORIZE_URL)
            .map_err(|e| ApiError::Internal(format!("invalid GitHub authorize URL: {}", e)))?;
        Url::parse(&config.redirect_url).map_err(|e| {
            ConfigError::InvalidValue("GITHUB_REDIRECT_URL".to_string(), e.to_string())
        })?;

        let mut builder = Client::builder().user_agent(concat!("todo-api/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            authorize_base,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url: config.redirect_url.clone(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
    ) -> PortResult<T> {
        let url = format!("{}{}", API_URL, path);
        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("token {}", access_token))
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, url = %url, "GitHub API request failed");
                PortError::Unexpected(format!("error sending request: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Unexpected(format!("GitHub API error: {}", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(format!("error parsing response: {}", e)))
    }
}

#[async_trait]
impl GitHubOAuthService for GitHubOAuthAdapter {
    fn authorize_url(&self, state: &str) -> String {
        let mut url = self.authorize_base.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("scope", &SCOPES.join(" "))
            .append_pair("state", state);
        url.into()
    }

    async fn exchange_code(&self, code: &str) -> PortResult<String> {
        let response = self
            .client
            .post(TOKEN_URL)
            .header(header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("error sending request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Unexpected(format!("token endpoint returned {}", status)));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("error parsing response: {}", e)))?;

        if let Some(err) = body.error {
            let detail = body.error_description.unwrap_or_default();
            return Err(PortError::Unexpected(format!("error from GitHub: {} {}", err, detail)));
        }
        debug!("Exchanged GitHub authorization code");
        body.access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PortError::Unexpected("no access token in response".to_string()))
    }

    async fn fetch_user(&self, access_token: &str) -> PortResult<GitHubUser> {
        let user: UserResponse = self.get_json("/user", access_token).await?;
        Ok(GitHubUser {
            id: user.id,
            login: user.login,
            name: user.name,
            email: user.email,
            avatar_url: user.avatar_url,
        })
    }

    async fn fetch_emails(&self, access_token: &str) -> PortResult<Vec<GitHubEmail>> {
        let emails: Vec<EmailResponse> = self.get_json("/user/emails", access_token).await?;
        Ok(emails
            .into_iter()
            .map(|e| GitHubEmail {
                email: e.email,
                primary: e.primary,
                verified: e.verified,
            })
            .collect())
    }
}
