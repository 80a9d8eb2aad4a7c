//! Now Playing Lambda - Current or most recent Spotify track.
//!
//! Upstream failures never surface as errors: the widget gets an empty
//! payload and renders "nothing playing".

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::{
    empty_response, error_response, json_response, CorsPolicy, NowPlaying, SpotifyClient,
    SpotifyConfig,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CORS: CorsPolicy = CorsPolicy::read_only("s-maxage=30, stale-while-revalidate");

/// Application state
struct AppState {
    spotify: Option<SpotifyClient>,
}

impl AppState {
    fn new() -> Self {
        let spotify = match SpotifyConfig::from_env() {
            Ok(config) => Some(SpotifyClient::new(config)),
            Err(e) => {
                warn!("Spotify not configured: {}", e);
                None
            }
        };
        Self { spotify }
    }
}

async fn now_playing(state: &AppState) -> NowPlaying {
    let Some(spotify) = &state.spotify else {
        return NowPlaying::nothing();
    };
    match spotify.now_playing().await {
        Ok(playing) => {
            info!("Spotify track: {:?} (playing: {})", playing.track, playing.is_playing);
            playing
        }
        Err(e) => {
            warn!("Spotify lookup failed: {}", e);
            NowPlaying::nothing()
        }
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    match event.method().as_str() {
        "OPTIONS" => empty_response(&CORS, 200),
        "GET" => json_response(&CORS, 200, &now_playing(&state).await),
        _ => error_response(&CORS, 405, "method not allowed"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new());

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
