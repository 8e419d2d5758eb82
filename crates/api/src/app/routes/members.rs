use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
};

use familib_core::MemberId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(add_member).get(list_members))
        .route("/:id", patch(rename_member))
        .route("/:id/deactivate", post(deactivate_member))
}

pub async fn add_member(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AddMemberRequest>,
) -> axum::response::Response {
    match services.add_member(body.name).await {
        Ok(member) => (StatusCode::CREATED, Json(dto::member_to_json(&member))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_members(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.list_members_with_stats().await {
        Ok(members) => {
            let items = members
                .iter()
                .map(dto::member_with_stats_to_json)
                .collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn rename_member(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::RenameMemberRequest>,
) -> axum::response::Response {
    let id: MemberId = match errors::parse_id(&id, "member id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.rename_member(id, body.name).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "id": id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn deactivate_member(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: MemberId = match errors::parse_id(&id, "member id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.remove_member(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "id": id.to_string(), "is_active": false })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
