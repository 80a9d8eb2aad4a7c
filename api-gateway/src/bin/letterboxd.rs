//! Letterboxd Lambda - Most recently logged film.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::feeds::{first_item, Film};
use shared::{empty_response, error_response, json_response, CorsPolicy, FeedConfig};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const CORS: CorsPolicy = CorsPolicy::read_only("s-maxage=300, stale-while-revalidate");

/// Application state
struct AppState {
    http_client: reqwest::Client,
    rss_url: String,
}

impl AppState {
    fn new() -> Self {
        let user = FeedConfig::from_env().letterboxd_user;
        Self {
            http_client: reqwest::Client::new(),
            rss_url: format!("https://letterboxd.com/{}/rss/", user),
        }
    }
}

async fn latest_film(state: &AppState) -> Result<Response<Body>, Error> {
    let response = match state.http_client.get(&state.rss_url).send().await {
        Ok(response) => response,
        Err(e) => {
            error!("Letterboxd request failed: {}", e);
            return error_response(&CORS, 500, "Failed to fetch RSS feed");
        }
    };

    if !response.status().is_success() {
        warn!("Letterboxd returned {}", response.status());
        return error_response(&CORS, 500, "Failed to fetch RSS feed");
    }

    let feed = match response.text().await {
        Ok(feed) => feed,
        Err(e) => {
            error!("Letterboxd body unreadable: {}", e);
            return error_response(&CORS, 500, "Failed to parse feed");
        }
    };

    match film_from_feed(&feed) {
        Some(film) => {
            info!("Letterboxd film: {:?}", film.film);
            json_response(&CORS, 200, &film)
        }
        None => json_response(&CORS, 200, &serde_json::json!({ "film": null })),
    }
}

fn film_from_feed(feed: &str) -> Option<Film> {
    first_item(feed).map(Film::from_item)
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    match event.method().as_str() {
        "OPTIONS" => empty_response(&CORS, 200),
        "GET" => latest_film(&state).await,
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
