use axum::{
    Router,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use claim_flow::{
    AdminReport, AppNotification, Claim, ClaimManager, ClaimStatus, DashboardSummary, NewClaim,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

type ApiResult<T> = Result<Json<T>, ApiError>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str, details: Value) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<ClaimManager>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ClaimStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub answer: String,
}

pub fn build_router(app_state: AppState, max_request_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/dashboard", get(dashboard))
        .route("/admin/report", get(admin_report))
        .route("/claims", get(list_claims).post(submit_claim))
        .route("/claims/{id}", get(get_claim))
        .route("/claims/{id}/status", post(update_status))
        .route("/claims/{id}/questions", post(ask_question))
        .route(
            "/notifications",
            get(list_notifications).delete(clear_notifications),
        )
        .route("/notifications/{id}/read", post(mark_notification_read))
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "ClaimIntel",
        "version": "1.0.0",
        "description": "AI-assisted insurance claim intake and review",
        "endpoints": {
            "GET /dashboard": "Claim and notification totals",
            "GET /admin/report": "Per-claim risk and consistency report",
            "GET /claims": "List claims, newest first",
            "POST /claims": "Submit a new claim",
            "GET /claims/{id}": "Get a claim",
            "POST /claims/{id}/status": "Change a claim's status and notes",
            "POST /claims/{id}/questions": "Ask a question about the claim's document",
            "GET /notifications": "List notifications",
            "DELETE /notifications": "Clear notifications",
            "POST /notifications/{id}/read": "Mark a notification as read",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn dashboard(State(state): State<AppState>) -> ApiResult<DashboardSummary> {
    state.manager.dashboard_summary().await.map(Json).map_err(|e| {
        error!(error = %e, "Failed to build dashboard");
        internal_error("Failed to build dashboard", &e.to_string())
    })
}

async fn admin_report(State(state): State<AppState>) -> ApiResult<AdminReport> {
    state.manager.admin_report().await.map(Json).map_err(|e| {
        error!(error = %e, "Failed to build admin report");
        internal_error("Failed to build admin report", &e.to_string())
    })
}

async fn list_claims(State(state): State<AppState>) -> ApiResult<Vec<Claim>> {
    state.manager.list_claims().await.map(Json).map_err(|e| {
        error!(error = %e, "Failed to list claims");
        internal_error("Failed to list claims", &e.to_string())
    })
}

async fn submit_claim(
    State(state): State<AppState>,
    Json(request): Json<NewClaim>,
) -> Result<(StatusCode, Json<Claim>), ApiError> {
    if let Err(errors) = request.validate() {
        warn!(errors = %errors, "Rejected invalid claim submission");
        return Err(bad_request_error(
            "Invalid claim submission",
            json!(errors.errors),
        ));
    }

    match state.manager.submit_claim(request).await {
        Some(claim) => {
            info!(claim_id = %claim.id, "Claim created");
            Ok((StatusCode::CREATED, Json(claim)))
        }
        None => Err(internal_error(
            "Claim submission failed",
            "There was an error submitting the claim.",
        )),
    }
}

async fn load_claim(state: &AppState, id: &str) -> Result<Claim, ApiError> {
    match state.manager.get_claim_by_id(id).await {
        Ok(Some(claim)) => Ok(claim),
        Ok(None) => Err(not_found_error("Claim not found", id)),
        Err(e) => {
            error!(claim_id = %id, error = %e, "Failed to load claim");
            Err(internal_error("Failed to load claim", &e.to_string()))
        }
    }
}

async fn get_claim(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Claim> {
    load_claim(&state, &id).await.map(Json)
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> ApiResult<Claim> {
    match state
        .manager
        .update_claim_status(&id, request.status, request.notes)
        .await
    {
        Ok(Some(claim)) => Ok(Json(claim)),
        Ok(None) => Err(not_found_error("Claim not found", &id)),
        Err(e) => {
            error!(claim_id = %id, error = %e, "Failed to update claim status");
            Err(internal_error("Failed to update claim status", &e.to_string()))
        }
    }
}

async fn ask_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<QuestionRequest>,
) -> ApiResult<QuestionResponse> {
    let claim = load_claim(&state, &id).await?;
    let answer = state
        .manager
        .ask_question_on_document(claim.document_uri.as_deref(), &request.question, Some(&id))
        .await;
    Ok(Json(QuestionResponse { answer }))
}

async fn list_notifications(State(state): State<AppState>) -> ApiResult<Vec<AppNotification>> {
    state.manager.list_notifications().await.map(Json).map_err(|e| {
        error!(error = %e, "Failed to list notifications");
        internal_error("Failed to list notifications", &e.to_string())
    })
}

async fn clear_notifications(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state
        .manager
        .clear_notifications()
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(|e| {
            error!(error = %e, "Failed to clear notifications");
            internal_error("Failed to clear notifications", &e.to_string())
        })
}

async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.manager.mark_notification_as_read(&id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(not_found_error("Notification not found", &id)),
        Err(e) => {
            error!(notification_id = %id, error = %e, "Failed to mark notification as read");
            Err(internal_error("Failed to mark notification as read", &e.to_string()))
        }
    }
}
