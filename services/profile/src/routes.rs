//! Profile service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{
    editor::{ProfileEditor, ProfileView},
    error::ApiResult,
    events::UiEvent,
    models::UserResponse,
    middleware::{AuthUser, auth_middleware},
    state::AppState,
};

/// Editable user fields submitted by the form
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserFields {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Request for a profile update
///
/// Omitted user fields keep their persisted value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub user: UserFields,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

/// Response for a successful profile update
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub user: UserResponse,
    pub profile: ProfileView,
    pub events: Vec<UiEvent>,
}

/// Create the router for the profile service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    if let Some(pool) = &state.db_pool {
        common::database::health_check(pool).await?;
    }

    Ok(Json(json!({
        "status": "ok",
        "service": "profile-service"
    })))
}

/// Mount the editor for the current user
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<ProfileView>> {
    let mut editor =
        ProfileEditor::mount(state.users.as_ref(), auth_user.id, state.password_policy.clone())
            .await?;

    Ok(Json(editor.render()))
}

/// Apply submitted fields and save
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<SaveResponse>> {
    info!("Profile update request for user: {}", auth_user.id);

    let mut editor =
        ProfileEditor::mount(state.users.as_ref(), auth_user.id, state.password_policy.clone())
            .await?;

    if let Some(name) = payload.user.name {
        editor.set_name(name);
    }
    if let Some(email) = payload.user.email {
        editor.set_email(email);
    }
    editor.set_password(payload.password);
    editor.set_password_confirmation(payload.password_confirmation);

    let user = editor
        .save(state.users.as_ref(), &state.passwords)
        .await?;

    let events = editor.take_events();
    for event in &events {
        info!("Dispatching {} event for user: {}", event.name(), auth_user.id);
    }

    Ok(Json(SaveResponse {
        user,
        events,
        profile: editor.render(),
    }))
}
