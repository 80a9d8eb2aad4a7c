//! Spotify client for the now-playing widget.

use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::SpotifyConfig;
use crate::{Error, Result};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const CURRENTLY_PLAYING_URL: &str = "https://api.spotify.com/v1/me/player/currently-playing";
const RECENTLY_PLAYED_URL: &str = "https://api.spotify.com/v1/me/player/recently-played?limit=1";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Deserialize, Default)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Track {
    name: String,
    #[serde(default)]
    artists: Vec<Artist>,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    #[serde(default)]
    is_playing: bool,
    item: Option<Track>,
}

#[derive(Debug, Deserialize)]
struct PlayHistory {
    track: Track,
}

#[derive(Debug, Deserialize)]
struct RecentlyPlayed {
    #[serde(default)]
    items: Vec<PlayHistory>,
}

/// Payload for the widget. `track` is null when nothing could be found.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    pub is_playing: bool,
    pub track: Option<String>,
    pub artist: Option<String>,
    pub url: Option<String>,
}

impl NowPlaying {
    pub fn nothing() -> Self {
        Self {
            is_playing: false,
            track: None,
            artist: None,
            url: None,
        }
    }

    fn from_track(track: Track, is_playing: bool) -> Self {
        let artist = track
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            is_playing,
            track: Some(track.name),
            artist: (!artist.is_empty()).then_some(artist),
            url: track.external_urls.spotify,
        }
    }
}

/// Client that trades a long-lived refresh token for short-lived access.
pub struct SpotifyClient {
    http_client: reqwest::Client,
    config: SpotifyConfig,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            config,
        }
    }

    fn basic_auth(&self) -> String {
        let credentials = format!("{}:{}", self.config.client_id, self.config.client_secret);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials)
        )
    }

    async fn access_token(&self) -> Result<String> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", self.config.refresh_token.as_str()),
        ];

        let response = self
            .http_client
            .post(TOKEN_URL)
            .header("authorization", self.basic_auth())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!("Token refresh failed: {}", error_text)));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Current track, falling back to the last played one.
    pub async fn now_playing(&self) -> Result<NowPlaying> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .get(CURRENTLY_PLAYING_URL)
            .bearer_auth(&token)
            .send()
            .await?;

        // 204 means no active device.
        if response.status().is_success() && response.status().as_u16() != 204 {
            let current: CurrentlyPlaying = response.json().await?;
            if let Some(track) = current.item {
                return Ok(NowPlaying::from_track(track, current.is_playing));
            }
        } else if !response.status().is_success() {
            warn!("currently-playing returned {}", response.status());
        }

        let response = self
            .http_client
            .get(RECENTLY_PLAYED_URL)
            .bearer_auth(&token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "recently-played returned {}",
                response.status()
            )));
        }

        let recent: RecentlyPlayed = response.json().await?;
        Ok(recent
            .items
            .into_iter()
            .next()
            .map(|played| NowPlaying::from_track(played.track, false))
            .unwrap_or_else(NowPlaying::nothing))
    }
}
