use anyhow::{Context, Result};

pub const STATS_FILE: &str = "stats.json";
pub const README_FILE: &str = "README.md";
pub const ART_FILE: &str = "now_playing.svg";

/// How this run was invoked. A push enables the cheaper incremental
/// statistics path; everything else (schedule, manual dispatch, local run)
/// triggers a full scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Push,
    FullScan,
}

impl Trigger {
    pub fn from_event(event: Option<&str>) -> Self {
        match event {
            Some("push") => Trigger::Push,
            _ => Trigger::FullScan,
        }
    }
}

/// All process configuration, read from the environment exactly once at
/// startup and passed by reference into each component.
pub struct Config {
    pub github_token: String,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    // Part of the registered app's credentials; only the refresh grant is
    // exercised here, which does not send it.
    #[allow(dead_code)]
    pub spotify_redirect_uri: String,
    pub spotify_refresh_token: String,
    pub trigger: Trigger,
    pub push_sha: Option<String>,
    pub push_repo: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            github_token: std::env::var("MY_GITHUB_TOKEN")
                .context("MY_GITHUB_TOKEN environment variable not set")?,
            spotify_client_id: std::env::var("CLIENT_ID")
                .context("CLIENT_ID environment variable not set")?,
            spotify_client_secret: std::env::var("CLIENT_SECRET")
                .context("CLIENT_SECRET environment variable not set")?,
            spotify_redirect_uri: std::env::var("REDIRECT_URI")
                .context("REDIRECT_URI environment variable not set")?,
            spotify_refresh_token: std::env::var("SPOTIFY_REFRESH_TOKEN")
                .context("SPOTIFY_REFRESH_TOKEN environment variable not set")?,
            trigger: Trigger::from_event(std::env::var("GITHUB_EVENT_NAME").ok().as_deref()),
            push_sha: std::env::var("GITHUB_SHA").ok().filter(|s| !s.is_empty()),
            push_repo: std::env::var("GITHUB_REPOSITORY").ok().filter(|s| !s.is_empty()),
        })
    }
}
