pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::profile::handlers::{handle_delete, handle_list, handle_save};
use crate::profile::models::{Degree, Job, Objective, SkillCategory};
use crate::profile::ProfileResource;
use crate::state::AppState;

/// List, save and delete routes for one profile section.
fn resource_routes<R: ProfileResource>() -> Router<AppState> {
    let base = format!("/api/v1/profile/{}", R::PATH);
    Router::new()
        .route(&base, get(handle_list::<R>).post(handle_save::<R>))
        .route(&format!("{base}/delete"), post(handle_delete::<R>))
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);
    Router::new()
        .route("/health", get(health::health_handler))
        .merge(resource_routes::<Job>())
        .merge(resource_routes::<Degree>())
        .merge(resource_routes::<SkillCategory>())
        .merge(resource_routes::<Objective>())
        .layer(body_limit)
        .with_state(state)
}
