use axum::{Router, middleware::from_fn_with_state, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{DeploymentImpl, routes};

pub mod auth;

pub fn router(deployment: DeploymentImpl) -> Router {
    let protected = Router::new()
        .merge(routes::management::router())
        .merge(routes::profile::router())
        .merge(routes::roles::router())
        .merge(routes::projects::router(&deployment))
        .merge(routes::milestones::router(&deployment))
        .merge(routes::tasks::router(&deployment))
        .merge(routes::teams::router(&deployment))
        .merge(routes::resumes::router())
        .layer(from_fn_with_state(deployment.clone(), auth::require_auth));

    // Register and login are the only anonymous API endpoints.
    let api_routes = Router::new().merge(routes::auth::router()).merge(protected);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(deployment)
}
