use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::messages::ContactRequest,
    error::AppResult,
    models::Message,
    response::ApiResponse,
    services::message_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(submit_message))
}

#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Submit contact message", body = ApiResponse<Message>),
        (status = 400, description = "Missing fields"),
    ),
    tag = "Messages"
)]
pub async fn submit_message(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> AppResult<Json<ApiResponse<Message>>> {
    let resp = message_service::submit_message(&state.pool, payload).await?;
    Ok(Json(resp))
}
