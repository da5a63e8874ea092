use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::extract::{self, CampaignEvent, Coupon};
use crate::orchestrator::{DataBinding, FetchState, Orchestrator, Phase};
use crate::tool::{self, ToolArgs, ToolError};

#[derive(Clone)]
pub struct AppState {
    orch: Orchestrator,
    calendar: Arc<DataBinding<Vec<CampaignEvent>>>,
    available: Arc<DataBinding<Vec<Coupon>>>,
    mine: Arc<DataBinding<Vec<Coupon>>>,
}

impl AppState {
    pub fn new(orch: Orchestrator) -> Self {
        let calendar = orch.bind(
            tool::CAMPAIGN_CALENDAR,
            ToolArgs::new(),
            extract::parse_calendar_text,
        );
        let available = orch.bind(
            tool::AVAILABLE_COUPONS,
            ToolArgs::new(),
            extract::parse_available_coupons,
        );
        let mine = orch.bind(
            tool::MY_COUPONS,
            ToolArgs::new(),
            extract::parse_claimed_coupons,
        );
        Self {
            orch,
            calendar: Arc::new(calendar),
            available: Arc::new(available),
            mine: Arc::new(mine),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/calendar", get(calendar))
        .route("/coupons/available", get(available_coupons))
        .route("/coupons/mine", get(my_coupons))
        .route("/coupons/auto-bind", post(auto_bind))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct FetchQuery {
    #[serde(default)]
    refresh: Option<String>,
    #[serde(default)]
    raw: Option<String>,
}

fn flag(v: &Option<String>) -> bool {
    matches!(
        v.as_deref().map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes")
    )
}

#[derive(Serialize)]
struct ErrorOut {
    kind: &'static str,
    message: String,
}

impl From<&ToolError> for ErrorOut {
    fn from(e: &ToolError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

#[derive(Serialize)]
struct FetchOut<T> {
    phase: Phase,
    loading: bool,
    error: Option<ErrorOut>,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_text: Option<String>,
}

impl<T> FetchOut<T> {
    fn from_state(st: FetchState<T>, with_raw: bool) -> Self {
        Self {
            phase: st.phase(),
            loading: st.loading,
            error: st.error.as_ref().map(ErrorOut::from),
            data: st.data,
            raw_text: if with_raw { st.raw_text } else { None },
        }
    }
}

async fn serve_binding<T>(binding: &DataBinding<T>, q: FetchQuery) -> Json<FetchOut<T>>
where
    T: Clone + Serialize + DeserializeOwned + Send,
{
    let st = binding.request(flag(&q.refresh)).await;
    Json(FetchOut::from_state(st, flag(&q.raw)))
}

async fn calendar(
    State(state): State<AppState>,
    Query(q): Query<FetchQuery>,
) -> Json<FetchOut<Vec<CampaignEvent>>> {
    serve_binding(&state.calendar, q).await
}

async fn available_coupons(
    State(state): State<AppState>,
    Query(q): Query<FetchQuery>,
) -> Json<FetchOut<Vec<Coupon>>> {
    serve_binding(&state.available, q).await
}

async fn my_coupons(
    State(state): State<AppState>,
    Query(q): Query<FetchQuery>,
) -> Json<FetchOut<Vec<Coupon>>> {
    serve_binding(&state.mine, q).await
}

#[derive(Serialize)]
struct AutoBindOut {
    text: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

async fn auto_bind(State(state): State<AppState>) -> Response {
    match state.orch.auto_bind().await {
        Ok(text) => Json(AutoBindOut { text }).into_response(),
        Err(e) => {
            let status = match e {
                ToolError::Config(_) => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            };
            let body = Json(ErrorResponse {
                error: e.to_string(),
                code: status.as_u16(),
            });
            (status, body).into_response()
        }
    }
}
