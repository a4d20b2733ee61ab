// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Web API and dashboard for species curation

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::blacklist::ToggleAction;
use crate::config::AppConfig;
use crate::inventory::{ImageListing, Inventory, Species};
use crate::stats::{GlobalStats, StatsSession};
use crate::CuratorError;

/// Shared application state
pub struct AppState {
    pub inventory: Inventory,
    pub config: AppConfig,
    /// Built on first use, then kept current by blacklist toggles
    pub session: Mutex<Option<StatsSession>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            inventory: Inventory::new(&config),
            config,
            session: Mutex::new(None),
        }
    }

    fn lock_session(&self) -> crate::Result<MutexGuard<'_, Option<StatsSession>>> {
        self.session
            .lock()
            .map_err(|e| CuratorError::Internal(format!("Stats session lock poisoned: {}", e)))
    }

    /// Current totals, building or rebuilding the session when needed
    pub fn current_stats(&self) -> crate::Result<GlobalStats> {
        let mut guard = self.lock_session()?;
        match guard.as_mut() {
            Some(session) => Ok(session.stats_or_rebuild(&self.inventory)?.clone()),
            None => {
                let session = StatsSession::initialize(&self.inventory)?;
                let stats = session.stats().clone();
                *guard = Some(session);
                Ok(stats)
            }
        }
    }

    /// Throw away incremental state and scan everything again
    pub fn rebuild_stats(&self) -> crate::Result<GlobalStats> {
        let session = StatsSession::initialize(&self.inventory)?;
        let stats = session.stats().clone();
        *self.lock_session()? = Some(session);
        Ok(stats)
    }

    /// Persist one toggle, then fold the species' new counts into the session.
    ///
    /// The session lock is held across the write so toggles never interleave
    /// their read-modify-write of a blacklist file.
    pub fn toggle(&self, species: &str, image: &str, action: ToggleAction) -> crate::Result<bool> {
        let mut guard = self.lock_session()?;
        let blacklisted = self.inventory.store().toggle(species, image, action)?;

        if let Some(session) = guard.as_mut() {
            if let Err(e) = session.refresh_species(&self.inventory, species) {
                warn!("Toggle on {} persisted but stats update failed: {}", species, e);
            }
        }
        Ok(blacklisted)
    }
}

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_secs(state.config.web.request_timeout_secs.max(1));
    let images = state.config.web.serve_images.then(|| ServeDir::new(state.inventory.root()));

    let router = Router::new()
        // Pages
        .route("/", get(index_page))
        // API endpoints
        .route("/api/species", get(api_list_species))
        .route("/api/species/:name/images", get(api_list_images))
        .route("/api/blacklist", post(api_toggle_blacklist))
        .route("/api/blacklist/:name", get(api_get_blacklist))
        .route("/api/stats", get(api_get_stats))
        .route("/api/stats/rebuild", post(api_rebuild_stats));

    let router = match images {
        Some(service) => router.nest_service("/species-images", service),
        None => router,
    };

    router
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// === Errors ===

/// JSON error response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<CuratorError> for ApiError {
    fn from(err: CuratorError) -> Self {
        let status = match &err {
            CuratorError::SpeciesNotFound(_) => StatusCode::NOT_FOUND,
            CuratorError::InvalidName(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!("Request failed: {}", err);
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Run filesystem work on the blocking pool
async fn blocking<T, F>(f: F) -> std::result::Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("Worker task failed: {}", e)))?
        .map_err(ApiError::from)
}

// === API Handlers ===

async fn api_list_species(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Species>> {
    let species = blocking(move || state.inventory.list_species()).await?;
    Ok(Json(species))
}

async fn api_list_images(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<ImageListing> {
    let listing = blocking(move || state.inventory.list_images(&name)).await?;
    Ok(Json(listing))
}

async fn api_get_blacklist(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Vec<String>> {
    let list = blocking(move || state.inventory.blacklist(&name)).await?;
    Ok(Json(list))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub species_name: String,
    pub image_name: String,
    pub action: ToggleAction,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub image_name: String,
    pub action: ToggleAction,
    pub is_blacklisted: bool,
}

async fn api_toggle_blacklist(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ToggleRequest>,
) -> ApiResult<ToggleResponse> {
    let ToggleRequest { species_name, image_name, action } = request;
    let name = image_name.clone();
    let is_blacklisted =
        blocking(move || state.toggle(&species_name, &name, action)).await?;

    Ok(Json(ToggleResponse {
        image_name,
        action,
        is_blacklisted,
    }))
}

async fn api_get_stats(State(state): State<Arc<AppState>>) -> ApiResult<GlobalStats> {
    let stats = blocking(move || state.current_stats()).await?;
    Ok(Json(stats))
}

async fn api_rebuild_stats(State(state): State<Arc<AppState>>) -> ApiResult<GlobalStats> {
    let stats = blocking(move || state.rebuild_stats()).await?;
    Ok(Json(stats))
}

// === Page Handlers ===

async fn index_page(State(state): State<Arc<AppState>>) -> std::result::Result<Html<String>, ApiError> {
    let (species, stats) = blocking(move || {
        let species = state.inventory.list_species()?;
        let stats = state.current_stats()?;
        Ok((species, stats))
    })
    .await?;
    Ok(Html(render_index(&species, &stats)))
}

// === Template Rendering ===

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn base_template(title: &str, content: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Species Curator</title>
    <style>
        :root {{
            --bg-primary: #1a1a2e;
            --bg-card: #0f3460;
            --text-primary: #e8e8e8;
            --text-secondary: #a0a0a0;
            --accent: #e94560;
            --border: #2a2a4a;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
        }}
        .container {{ max-width: 1200px; margin: 0 auto; padding: 20px; }}
        .stats-grid {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 20px;
            margin: 20px 0 30px;
        }}
        .stat-card, .card {{
            background: var(--bg-card);
            border-radius: 12px;
            padding: 20px;
        }}
        .stat-card {{ text-align: center; }}
        .stat-card .number {{ font-size: 2.5em; font-weight: bold; color: var(--accent); }}
        .stat-card .label {{ color: var(--text-secondary); font-size: 0.9em; }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{ padding: 12px; text-align: left; border-bottom: 1px solid var(--border); }}
        th {{ color: var(--text-secondary); font-weight: 500; }}
        a {{ color: var(--accent); }}
        em {{ color: var(--text-secondary); }}
    </style>
</head>
<body>
    <main class="container">
        {}
    </main>
</body>
</html>"#, title, content)
}

fn render_index(species: &[Species], stats: &GlobalStats) -> String {
    let stats_html = format!(r#"
        <div class="stats-grid">
            <div class="stat-card">
                <div class="number">{}</div>
                <div class="label">Species</div>
            </div>
            <div class="stat-card">
                <div class="number">{}</div>
                <div class="label">Images</div>
            </div>
            <div class="stat-card">
                <div class="number">{}</div>
                <div class="label">Blacklisted</div>
            </div>
        </div>
    "#, stats.species_count, stats.total_images, stats.total_blacklisted);

    let rows: String = species.iter()
        .map(|s| {
            format!(r#"<tr><td><a href="/api/species/{}/images">{}</a></td><td><em>{}</em></td></tr>"#,
                escape_html(&s.name),
                escape_html(s.vernacular_name.as_deref().unwrap_or(&s.display_name)),
                escape_html(s.scientific_name.as_deref().unwrap_or("")),
            )
        })
        .collect();

    let content = format!(r#"
        <h1>Species Curator</h1>
        {}
        <div class="card">
            <table>
                <tr><th>Species</th><th>Scientific name</th></tr>
                {}
            </table>
        </div>
    "#, stats_html, rows);

    base_template("Dashboard", &content)
}

/// Start the web server
pub async fn start_server(config: AppConfig) -> crate::Result<()> {
    let addr = format!("{}:{}", config.web.host, config.web.port);
    let state = Arc::new(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Curation UI available at http://{}", addr);
    info!("Collection root: {:?}", state.inventory.root());

    let router = create_router(state);
    axum::serve(listener, router).await
        .map_err(|e| CuratorError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
