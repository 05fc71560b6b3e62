use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::middleware::{require_auth, require_jobseeker, require_recruiter};
use crate::state::AppState;
use crate::storage::{MAX_UPLOAD_BYTES, PUBLIC_PREFIX};
use crate::{applications, auth, jobs, profile, saved};

/// Room for multipart framing around a maximum-size file.
const BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

pub async fn health() -> &'static str {
    "ok"
}

/// The full application: `/api` routes, static uploads, health, CORS and tracing.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/verify", post(auth::verify_otp))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/jobs/all", get(jobs::list_jobs))
        .route("/jobs/{job_id}", get(jobs::get_job));

    let authenticated = Router::new()
        .route("/auth/get-role", get(auth::get_role))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let recruiter = Router::new()
        .route("/jobs/create", post(jobs::create_job))
        .route("/jobs/update/{job_id}", put(jobs::update_job))
        .route("/jobs/delete/{job_id}", axum::routing::delete(jobs::delete_job))
        .route("/jobs/recruiter/all", get(jobs::my_jobs))
        .route("/jobs/applications/{job_id}", get(jobs::job_applications))
        .route("/apply/job/{job_id}", get(applications::list_for_job))
        .route("/apply/{id}/status", patch(applications::set_status))
        .route(
            "/apply/recruiter/dashboard-summary",
            get(applications::dashboard_summary),
        )
        .route(
            "/profile/recruiter",
            get(profile::get_recruiter).put(profile::update_recruiter),
        )
        .route("/profile/recruiter/image", post(profile::upload_image))
        .route_layer(from_fn_with_state(state.clone(), require_recruiter));

    let jobseeker = Router::new()
        .route("/apply/me", get(applications::my_applications))
        .route(
            "/apply/{id}",
            post(applications::apply).delete(applications::withdraw),
        )
        .route("/save/save/{job_id}", post(saved::save_job))
        .route("/save/unsave/{job_id}", post(saved::unsave_job))
        .route("/save/saved", get(saved::list_saved))
        .route(
            "/profile/jobseeker",
            get(profile::get_jobseeker).put(profile::update_jobseeker),
        )
        .route("/profile/jobseeker/image", post(profile::upload_image))
        .route("/profile/jobseeker/resume", post(profile::upload_resume))
        .route_layer(from_fn_with_state(state.clone(), require_jobseeker));

    let api = Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(recruiter)
        .merge(jobseeker);

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .nest_service(PUBLIC_PREFIX, ServeDir::new(state.storage.dir()))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors_layer(&state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Credentialed CORS for the configured origins only.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
