//! HTTP request handlers

use super::state::AppState;
use crate::config::Settings;
use crate::locales::Locale;
use crate::query::{Capability, Query as AggregationQuery, QueryError, SafeSearch};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

/// Query parameters shared by the search routes
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Search query
    pub q: Option<String>,
    /// Page number, 1-based
    pub page: Option<u32>,
    /// Safe search level (`off|medium|high` or `0|1|2`)
    pub safesearch: Option<String>,
    /// Locale tag, e.g. `de-DE`
    pub locale: Option<String>,
}

impl SearchParams {
    /// Validate into a query, filling gaps from the settings defaults
    pub fn into_query(self, settings: &Settings) -> Result<AggregationQuery, QueryError> {
        let safesearch = match self.safesearch.as_deref() {
            Some(level) => level.parse::<SafeSearch>()?,
            None => settings.search.safe_search,
        };
        let locale = match self.locale.as_deref() {
            Some(tag) => tag.parse::<Locale>()?,
            None => settings.search.default_locale,
        };

        let page = self.page.unwrap_or(1);
        let max_page = settings.search.max_page;
        if max_page > 0 && page > max_page {
            return Err(QueryError::PageTooLarge { page, max_page });
        }

        AggregationQuery::new(self.q.unwrap_or_default(), page, safesearch, locale)
    }
}

/// Autocomplete parameters
#[derive(Debug, Default, Deserialize)]
pub struct AutocompleteParams {
    pub q: Option<String>,
}

/// Validation failure rendered as a 400 JSON body
pub struct ApiError(QueryError);

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

async fn aggregate(
    state: &AppState,
    params: SearchParams,
    capability: Capability,
) -> Result<Response, ApiError> {
    let query = params.into_query(&state.settings)?;
    let aggregated = state.aggregator.aggregate(capability, &query).await;
    Ok(Json(aggregated).into_response())
}

/// Web search handler
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    aggregate(&state, params, Capability::Search).await
}

/// Image search handler
pub async fn images(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    aggregate(&state, params, Capability::SearchImage).await
}

/// Video search handler
pub async fn videos(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    aggregate(&state, params, Capability::SearchVideo).await
}

/// News search handler
pub async fn news(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    aggregate(&state, params, Capability::SearchNews).await
}

/// Autocomplete handler
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> Result<Response, ApiError> {
    let query = AggregationQuery::simple(params.q.unwrap_or_default())?;
    let response = state.aggregator.autocomplete(&query).await;
    Ok(Json(response).into_response())
}

/// Stats handler
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "instance_name": state.instance_name(),
        "engines": state.aggregator.registry().names(),
        "metrics": state.metrics.snapshot(),
    }))
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "instance_name": state.instance_name(),
        "version": crate::VERSION
    }))
}
