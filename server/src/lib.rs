use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use booksim_core::persist::{load_index, IndexPaths};
use booksim_core::{BookIndex, FeedbackQuery, Match, PipelineError, RocchioWeights};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const PER_PAGE: usize = 10;

#[derive(Deserialize)]
pub struct SimilarParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Deserialize)]
pub struct RankingParams {
    pub q: String,
    /// Kept as text so that a malformed page falls back to the first one.
    pub page: Option<String>,
}

#[derive(Serialize)]
pub struct SimilarResponse {
    pub query: String,
    pub title: String,
    pub took_s: f64,
    pub most_similar: Vec<Match>,
    pub least_similar: Vec<Match>,
}

#[derive(Serialize)]
pub struct RankingResponse {
    pub title: String,
    pub page: usize,
    pub num_pages: usize,
    pub total: usize,
    pub results: Vec<Match>,
}

#[derive(Serialize)]
pub struct AuthorHit {
    pub author: String,
    pub similarity: f32,
}

#[derive(Serialize)]
pub struct AuthorResponse {
    pub author: String,
    pub most_similar: Vec<AuthorHit>,
    pub least_similar: Vec<AuthorHit>,
}

#[derive(Deserialize)]
pub struct FeedbackRequest {
    #[serde(flatten)]
    pub query: FeedbackQuery,
    #[serde(default)]
    pub weights: RocchioWeights,
    #[serde(default = "default_clip")]
    pub clip: bool,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_clip() -> bool { true }

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<BookIndex>,
    /// Lowercased title → canonical title, for queries that differ only in case.
    pub folded_titles: Arc<HashMap<String, String>>,
}

impl AppState {
    pub fn new(index: BookIndex) -> Self {
        let folded_titles = index
            .titles
            .iter()
            .map(|(_, t)| (t.to_lowercase(), t.to_string()))
            .collect();
        Self { index: Arc::new(index), folded_titles: Arc::new(folded_titles) }
    }

    /// Exact title first, then a case-insensitive match.
    fn canonical_title(&self, q: &str) -> Result<String, ApiError> {
        if self.index.titles.contains_title(q) {
            return Ok(q.to_string());
        }
        self.folded_titles
            .get(&q.to_lowercase())
            .cloned()
            .ok_or_else(|| ApiError(PipelineError::UnknownTitle { title: q.to_string() }))
    }
}

pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self { Self(e) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            PipelineError::UnknownTitle { .. } | PipelineError::UnknownAuthor { .. } => StatusCode::NOT_FOUND,
            PipelineError::DimensionMismatch { .. } | PipelineError::DegenerateRelevanceSet { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PipelineError::EmptyCorpus | PipelineError::EmptyVocabulary => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn build_app(index_dir: String) -> Result<Router> {
    // Load the whole index at startup; it is read-only afterwards
    let index = load_index(&IndexPaths::new(&index_dir))?;
    tracing::info!(index_dir, docs = index.num_docs(), titles = index.titles.len(), "index loaded");
    Ok(router(AppState::new(index)))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/titles", get(titles_handler))
        .route("/similar", get(similar_handler))
        .route("/ranking", get(ranking_handler))
        .route("/authors/similar", get(authors_handler))
        .route("/feedback", post(feedback_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn titles_handler(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.index.titles.iter().map(|(_, t)| t.to_string()).collect())
}

pub async fn similar_handler(
    State(state): State<AppState>,
    Query(params): Query<SimilarParams>,
) -> Result<Json<SimilarResponse>, ApiError> {
    let start = std::time::Instant::now();
    let title = state.canonical_title(&params.q)?;
    let recs = state.index.recommend(&title, params.k.clamp(1, 100))?;
    Ok(Json(SimilarResponse {
        query: params.q,
        title,
        took_s: start.elapsed().as_secs_f64(),
        most_similar: recs.most_similar,
        least_similar: recs.least_similar,
    }))
}

/// Page numbers start at 1. Unparseable pages give page 1, pages past the
/// end give the last page.
pub fn clamp_page(requested: Option<&str>, num_pages: usize) -> usize {
    match requested.and_then(|p| p.trim().parse::<usize>().ok()) {
        Some(p) if p >= 1 => p.min(num_pages),
        _ => 1,
    }
}

pub async fn ranking_handler(
    State(state): State<AppState>,
    Query(params): Query<RankingParams>,
) -> Result<Json<RankingResponse>, ApiError> {
    let title = state.canonical_title(&params.q)?;
    let ranking = state.index.ranking(&title)?;
    let total = ranking.len();
    let num_pages = total.div_ceil(PER_PAGE).max(1);
    let page = clamp_page(params.page.as_deref(), num_pages);
    let results = ranking.into_iter().skip((page - 1) * PER_PAGE).take(PER_PAGE).collect();
    Ok(Json(RankingResponse { title, page, num_pages, total, results }))
}

pub async fn authors_handler(
    State(state): State<AppState>,
    Query(params): Query<SimilarParams>,
) -> Result<Json<AuthorResponse>, ApiError> {
    let (top, bottom) = state.index.similar_authors(&params.q, params.k.clamp(1, 100))?;
    let hits = |v: Vec<(String, f32)>| {
        v.into_iter().map(|(author, similarity)| AuthorHit { author, similarity }).collect::<Vec<_>>()
    };
    Ok(Json(AuthorResponse { author: params.q, most_similar: hits(top), least_similar: hits(bottom) }))
}

pub async fn feedback_handler(
    State(state): State<AppState>,
    Json(mut req): Json<FeedbackRequest>,
) -> Result<Json<Vec<Match>>, ApiError> {
    // Free-text queries may name a title to leave out, or none at all.
    match state.canonical_title(&req.query.title) {
        Ok(title) => req.query.title = title,
        Err(e) if req.query.text.is_none() => return Err(e),
        Err(_) => {}
    }
    let matches = state.index.feedback_matches(&req.query, req.weights, req.clip, req.k.clamp(1, 100))?;
    Ok(Json(matches))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_parsing_falls_back() {
        assert_eq!(clamp_page(None, 3), 1);
        assert_eq!(clamp_page(Some("abc"), 3), 1);
        assert_eq!(clamp_page(Some("0"), 3), 1);
        assert_eq!(clamp_page(Some("2"), 3), 2);
        assert_eq!(clamp_page(Some("99"), 3), 3);
    }
}
