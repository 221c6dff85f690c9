use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const RECENTLY_PLAYED_URL: &str = "https://api.spotify.com/v1/me/player/recently-played";

/// The one most recently played track, reduced to what the renderer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub display_name: String,
    pub cover_url: String,
}

pub struct SpotifyClient {
    http: Client,
    access_token: String,
}

#[derive(Deserialize)]
struct RecentlyPlayed {
    items: Vec<PlayHistoryItem>,
}

#[derive(Deserialize)]
struct PlayHistoryItem {
    track: Track,
}

#[derive(Deserialize)]
struct Track {
    name: String,
    artists: Vec<Artist>,
    album: Album,
}

#[derive(Deserialize)]
struct Artist {
    name: String,
}

#[derive(Deserialize)]
struct Album {
    images: Vec<AlbumImage>,
}

#[derive(Deserialize)]
struct AlbumImage {
    url: String,
}

impl SpotifyClient {
    /// Exchange the configured refresh token for an access token.
    pub async fn connect(config: &Config) -> Result<Self> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let http = Client::new();
        let resp = http
            .post(TOKEN_URL)
            .basic_auth(&config.spotify_client_id, Some(&config.spotify_client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", config.spotify_refresh_token.as_str()),
            ])
            .send()
            .await
            .context("Network error requesting Spotify access token")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "Spotify token endpoint returned HTTP {}: {body}",
                status.as_u16()
            );
        }

        let token: TokenResponse = resp
            .json()
            .await
            .context("Failed to parse Spotify token response")?;

        Ok(Self {
            http,
            access_token: token.access_token,
        })
    }

    /// Fetch the single most recent play-history entry, or `None` when the
    /// listening history is empty.
    pub async fn recently_played(&self) -> Result<Option<TrackInfo>> {
        let resp = self
            .http
            .get(RECENTLY_PLAYED_URL)
            .query(&[("limit", "1")])
            .bearer_auth(&self.access_token)
            .send()
            .await
            .context("Network error fetching recently played tracks")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "Spotify recently-played endpoint returned HTTP {}: {body}",
                status.as_u16()
            );
        }

        let history: RecentlyPlayed = resp
            .json()
            .await
            .context("Failed to parse recently played response")?;

        first_track(history)
    }

    /// Download the raw bytes of a cover-art image.
    pub async fn download_image(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Network error downloading cover art from {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Cover art download returned HTTP {}", status.as_u16());
        }

        let bytes = resp
            .bytes()
            .await
            .context("Failed to read cover art body")?;
        Ok(bytes.to_vec())
    }
}

fn first_track(history: RecentlyPlayed) -> Result<Option<TrackInfo>> {
    let Some(item) = history.items.into_iter().next() else {
        return Ok(None);
    };

    let track = item.track;
    let artist = track
        .artists
        .first()
        .context("Track has no artists")?;
    let cover = track
        .album
        .images
        .first()
        .context("Track album has no cover images")?;

    Ok(Some(TrackInfo {
        display_name: format!("{} by {}", track.name, artist.name),
        cover_url: cover.url.clone(),
    }))
}
