//! Goodreads Lambda - Book currently being read, or the last one finished.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::feeds::{first_item, Book, ReadingStatus};
use shared::{empty_response, error_response, json_response, CorsPolicy, FeedConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const CORS: CorsPolicy = CorsPolicy::read_only("s-maxage=600, stale-while-revalidate");

/// Application state
struct AppState {
    http_client: reqwest::Client,
    user_id: String,
}

impl AppState {
    fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
            user_id: FeedConfig::from_env().goodreads_user_id,
        }
    }

    fn shelf_url(&self, shelf: &str) -> String {
        format!(
            "https://www.goodreads.com/review/list_rss/{}?shelf={}",
            self.user_id, shelf
        )
    }

    async fn fetch_shelf(&self, shelf: &str) -> Result<String, reqwest::Error> {
        self.http_client
            .get(self.shelf_url(shelf))
            .send()
            .await?
            .text()
            .await
    }

    /// First item of the currently-reading shelf, else of the read shelf.
    async fn latest_book(&self) -> Result<Option<Book>, reqwest::Error> {
        let current = self.fetch_shelf("currently-reading").await?;
        if let Some(book) = book_from_feed(&current, ReadingStatus::Reading) {
            return Ok(Some(book));
        }

        let read = self.fetch_shelf("read").await?;
        Ok(book_from_feed(&read, ReadingStatus::Finished))
    }
}

fn book_from_feed(feed: &str, status: ReadingStatus) -> Option<Book> {
    first_item(feed).map(|item| Book::from_item(item, status))
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    match event.method().as_str() {
        "OPTIONS" => empty_response(&CORS, 200),
        "GET" => match state.latest_book().await {
            Ok(Some(book)) => {
                info!("Goodreads book: {:?} ({:?})", book.book, book.status);
                json_response(&CORS, 200, &book)
            }
            Ok(None) => json_response(&CORS, 200, &serde_json::json!({ "book": null })),
            Err(e) => {
                error!("Goodreads fetch failed: {}", e);
                error_response(&CORS, 500, "Failed to fetch reading data")
            }
        },
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
