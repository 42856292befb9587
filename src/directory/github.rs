//! GitHub users API as the developer directory.

use async_trait::async_trait;
use rand::Rng;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::DirectoryClient;
use crate::errors::AppError;
use crate::models::{CandidateDetail, CandidateSummary};

/// Upper bound for the random `since` cursor used by the default search.
const MAX_SINCE: u64 = 100_000_000;

/// GitHub directory client configuration.
#[derive(Debug, Clone)]
pub struct GitHubDirectoryConfig {
    /// Base URL of the API (e.g., `https://api.github.com`).
    pub base_url: String,

    /// Value sent as `User-Agent`; GitHub rejects requests without one.
    pub user_agent: String,
}

impl Default for GitHubDirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            user_agent: concat!("scout-backend/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// GitHub directory client.
#[derive(Debug, Clone)]
pub struct GitHubDirectory {
    client: Client,
    config: GitHubDirectoryConfig,
}

impl GitHubDirectory {
    /// Create a new GitHub directory client.
    pub fn new(config: GitHubDirectoryConfig) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the full URL for an API path.
    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Decode a successful response or turn the status into an error.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<T, AppError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| AppError::Directory(format!("Failed to parse {}: {}", endpoint, e)));
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));

        let message = match (status, message) {
            (StatusCode::FORBIDDEN, _) | (StatusCode::TOO_MANY_REQUESTS, _) => {
                "Rate limit exceeded".to_string()
            }
            (_, Some(msg)) => msg,
            _ => format!("Request failed ({})", status.as_u16()),
        };

        Err(AppError::Directory(format!("{}: {}", endpoint, message)))
    }
}

fn random_since() -> u64 {
    rand::thread_rng().gen_range(1..=MAX_SINCE)
}

#[async_trait]
impl DirectoryClient for GitHubDirectory {
    async fn search_batch(&self) -> Result<Vec<CandidateSummary>, AppError> {
        let since = random_since();
        let endpoint = "/users";
        let response = self
            .client
            .get(self.api_url(endpoint))
            .query(&[("since", since)])
            .send()
            .await?;

        let summaries: Vec<CandidateSummary> = self.handle_response(response, endpoint).await?;
        tracing::debug!("Directory returned {} users since {}", summaries.len(), since);
        Ok(summaries)
    }

    async fn fetch_detail(&self, login: &str) -> Result<CandidateDetail, AppError> {
        let endpoint = format!("/users/{}", urlencoding::encode(login));
        let response = self.client.get(self.api_url(&endpoint)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Directory has no user {}", login);
            return Ok(CandidateDetail::default());
        }

        self.handle_response(response, &endpoint).await
    }
}
