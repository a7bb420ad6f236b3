use crate::error::Error;
use crate::stats::{ContractLoader, StakingStats, StatsProvider};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

const XML_DECLARATION: &str = "<?xml version=\"1.0\"?>\n";

/// Shared state handed to every handler.
pub struct AppContext<L: ContractLoader> {
    pub provider: StatsProvider<L>,
}

impl<L: ContractLoader> AppContext<L> {
    pub fn new(provider: StatsProvider<L>) -> Self {
        Self { provider }
    }
}

pub fn router<L: ContractLoader>(ctx: Arc<AppContext<L>>) -> Router {
    Router::new()
        .route("/api/stats", get(stats::<L>))
        .route("/api/v0/circulating-supply", get(circulating_supply::<L>))
        .fallback(hi)
        .with_state(ctx)
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    format: Option<String>,
}

async fn stats<L: ContractLoader>(
    State(ctx): State<Arc<AppContext<L>>>,
    Query(query): Query<StatsQuery>,
) -> Result<Response, Error> {
    let stats = ctx.provider.get_staking_stats().await?;
    if query.format.as_deref() == Some("xml") {
        let body = render_xml(&stats)?;
        return Ok(([(header::CONTENT_TYPE, "application/xml")], body).into_response());
    }
    Ok(Json(stats).into_response())
}

async fn circulating_supply<L: ContractLoader>(
    State(ctx): State<Arc<AppContext<L>>>,
) -> Result<String, Error> {
    Ok(ctx.provider.get_circulating_supply().await?.to_string())
}

async fn hi() -> Json<serde_json::Value> {
    Json(json!({ "message": "hi" }))
}

pub fn render_xml(stats: &StakingStats) -> Result<String, Error> {
    let body = quick_xml::se::to_string_with_root("stats", stats)
        .map_err(|e| Error::Render(e.to_string()))?;
    Ok(format!("{XML_DECLARATION}{body}"))
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Upstream(_)
            | Error::Explorer(_)
            | Error::Parse(_)
            | Error::Node(_)
            | Error::EmptySupply => StatusCode::BAD_GATEWAY,
            Error::Render(_) | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!(kind = self.kind(), error = %self, "request failed");
        let body = json!({ "error": self.kind(), "message": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
