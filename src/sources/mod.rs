pub mod instagram;
pub mod tiktok;

use crate::context::QueryContext;
use crate::types::{Config, CreatorStats, Platform, PostStats, ProfileData, ReelsStats};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("request to {endpoint} failed with status {status}")]
    Http { endpoint: String, status: u16 },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("{0}")]
    Unavailable(String),
}

/// Everything one lookup produced; each section fails independently
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileReport {
    pub platform: Platform,
    pub profile: Result<ProfileData, FetchError>,
    pub post_stats: Option<Result<PostStats, FetchError>>,
    pub reels_stats: Option<Result<ReelsStats, FetchError>>,
    pub contact_email: Option<Result<String, FetchError>>,
    pub creator_stats: Option<Result<CreatorStats, FetchError>>,
}

impl ProfileReport {
    pub fn new(platform: Platform, profile: Result<ProfileData, FetchError>) -> Self {
        Self {
            platform,
            profile,
            post_stats: None,
            reels_stats: None,
            contact_email: None,
            creator_stats: None,
        }
    }
}

#[async_trait]
pub trait ProfileSource: Send + Sync {
    fn platform(&self) -> Platform;

    async fn fetch_report(&self, ctx: &QueryContext, username: &str) -> ProfileReport;
}

pub fn create_source(platform: Platform, config: &Config) -> Result<Box<dyn ProfileSource>> {
    let http = HttpClient::new(Duration::from_secs(config.timeout_secs));
    match platform {
        Platform::Instagram => {
            let Some(key) = config.rapidapi_key.clone() else {
                anyhow::bail!("Instagram lookups need a RapidAPI key (--rapidapi-key or RAPIDAPI_KEY)");
            };
            Ok(Box::new(instagram::InstagramSource::new(
                http,
                config.rapidapi_host.clone(),
                key,
            )))
        }
        Platform::TikTok => {
            let Some(key) = config.tiktok_key.clone() else {
                anyhow::bail!("TikTok lookups need an API key (--tiktok-key or TIKTOK_API_KEY)");
            };
            Ok(Box::new(tiktok::TikTokSource::new(
                http,
                config.tiktok_host.clone(),
                key,
            )))
        }
    }
}

/// Blocking ureq agent driven from the tokio blocking pool
#[derive(Clone)]
pub struct HttpClient {
    agent: Arc<ureq::Agent>,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: Arc::new(ureq::AgentBuilder::new().timeout(timeout).build()),
        }
    }

    /// GET `url` and decode the body as JSON. `endpoint` names the call in errors.
    pub async fn get_json(
        &self,
        endpoint: &str,
        url: String,
        headers: Vec<(&'static str, String)>,
    ) -> Result<Value, FetchError> {
        let agent = self.agent.clone();
        let endpoint = endpoint.to_string();

        tokio::task::spawn_blocking(move || {
            let mut request = agent.get(&url);
            for (name, value) in &headers {
                request = request.set(name, value);
            }

            debug!("GET {}", endpoint);
            let response = match request.call() {
                Ok(response) => response,
                Err(ureq::Error::Status(status, response)) => {
                    let body = response.into_string().unwrap_or_default();
                    debug!("{} returned {}: {}", endpoint, status, body);
                    return Err(FetchError::Http { endpoint, status });
                }
                Err(ureq::Error::Transport(e)) => {
                    return Err(FetchError::Transport(e.to_string()));
                }
            };

            response
                .into_json::<Value>()
                .map_err(|e| FetchError::InvalidResponse(format!("{}: {}", endpoint, e)))
        })
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?
    }
}

/// Walk a chain of object keys, returning `None` at the first gap or JSON null
pub(crate) fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Non-empty string at `path`
pub(crate) fn lookup_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    lookup(value, path)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_paths() {
        let value = json!({"data": {"about": {"country": "Italy"}, "empty": "", "gone": null}});
        assert_eq!(lookup_str(&value, &["data", "about", "country"]), Some("Italy"));
        assert_eq!(lookup_str(&value, &["data", "empty"]), None);
        assert!(lookup(&value, &["data", "gone"]).is_none());
        assert!(lookup(&value, &["data", "missing", "deeper"]).is_none());
    }

    #[test]
    fn test_fetch_error_messages() {
        let err = FetchError::Http {
            endpoint: "/v1/info".to_string(),
            status: 429,
        };
        assert_eq!(err.to_string(), "request to /v1/info failed with status 429");
        assert_eq!(FetchError::Unavailable("Stats unavailable".into()).to_string(), "Stats unavailable");
    }
}
