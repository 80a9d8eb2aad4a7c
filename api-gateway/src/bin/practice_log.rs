//! Practice Log Lambda - Reads and appends the practice log sheet.
//!
//! Endpoints:
//! - GET /practice-log?tz=<minutes> - Statistics snapshot for the caller's timezone
//! - POST /practice-log - Append a practice session or gig (shared-secret auth)
//! - OPTIONS /practice-log - CORS preflight

use chrono::{DateTime, Utc};
use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use shared::models::parse_rows;
use shared::{
    compute_stats, empty_response, error_response, json_response, parse_body, verify_bearer,
    ApiResponse, Config, CorsPolicy, GoogleSheetsClient, LocalClock, NewEntryRequest,
    NewEntryResponse, SheetStore,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const CORS: CorsPolicy = CorsPolicy::READ_WRITE;

/// Application state shared across requests.
struct AppState<S> {
    sheets: S,
    write_secret: String,
}

impl AppState<GoogleSheetsClient> {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let sheets = GoogleSheetsClient::from_config(&config).await?;

        Ok(Self {
            sheets,
            write_secret: config.practice_log_secret,
        })
    }
}

/// Timezone offset from the `tz` query parameter; absent means UTC.
fn request_clock(event: &Request) -> shared::Result<LocalClock> {
    let params = event.query_string_parameters();
    match params.first("tz") {
        None => Ok(LocalClock::UTC),
        Some(raw) => {
            let minutes: i32 = raw.trim().parse().map_err(|_| {
                shared::Error::Validation(format!("invalid timezone offset: {}", raw))
            })?;
            LocalClock::new(minutes)
        }
    }
}

async fn get_stats<S: SheetStore>(
    state: &AppState<S>,
    event: &Request,
    now: DateTime<Utc>,
) -> Result<Response<Body>, Error> {
    let clock = match request_clock(event) {
        Ok(clock) => clock,
        Err(e) => return error_response(&CORS, e.status_code(), e.to_string()),
    };

    let rows = match state.sheets.read_rows().await {
        Ok(rows) => rows,
        Err(e) => {
            error!("Practice log read failed: {}", e);
            return error_response(&CORS, 500, format!("server error: {}", e));
        }
    };

    let entries = parse_rows(&rows);
    let skipped = rows.len().saturating_sub(entries.len());
    info!("Computing stats over {} entries ({} rows skipped)", entries.len(), skipped);

    let snapshot = compute_stats(&entries, clock, now);
    json_response(&CORS, 200, &ApiResponse::success(snapshot))
}

async fn log_entry<S: SheetStore>(
    state: &AppState<S>,
    event: &Request,
    now: DateTime<Utc>,
) -> Result<Response<Body>, Error> {
    let authorization = event
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());
    if let Err(e) = verify_bearer(authorization, &state.write_secret) {
        warn!("Rejected practice log write: {}", e);
        return error_response(&CORS, 401, "unauthorized");
    }

    let request: NewEntryRequest = parse_body!(&CORS, event.body());

    let entry = match request.into_entry(now) {
        Ok(entry) => entry,
        Err(e) => return error_response(&CORS, e.status_code(), e.to_string()),
    };

    if let Err(e) = state.sheets.append_row(entry.to_row()).await {
        error!("Practice log append failed: {}", e);
        return error_response(&CORS, 500, format!("server error: {}", e));
    }

    info!(
        "Logged {} minutes of {} ({})",
        entry.minutes,
        entry.category,
        entry.entry_type.as_str()
    );
    json_response(&CORS, 200, &ApiResponse::success(NewEntryResponse::from(&entry)))
}

async fn handle<S: SheetStore>(
    state: &AppState<S>,
    event: Request,
    now: DateTime<Utc>,
) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    info!("Practice log request: {} {}", method, event.uri().path());

    match method {
        "OPTIONS" => empty_response(&CORS, 200),
        "GET" => get_stats(state, &event, now).await,
        "POST" => log_entry(state, &event, now).await,
        _ => error_response(&CORS, 405, "method not allowed"),
    }
}

async fn handler<S: SheetStore>(state: Arc<AppState<S>>, event: Request) -> Result<Response<Body>, Error> {
    handle(&state, event, Utc::now()).await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
