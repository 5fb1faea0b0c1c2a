//! Bearer token authentication -> AuthCtx in request extensions.
//!
//! - Runs the `TokenGuard` once per request
//! - Success: inserts `AuthCtx` and hands the request to the next service
//! - Handled failure: returns the guard's reply (default 401 or listener override)
//! - `GuardError`: logged, then 500

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::GuardOutcome;
use crate::state::AppState;

/// Protect every route of `router` with the guard held in `state`.
///
/// ```ignore
/// let v1 = middleware::auth::access::apply(api::v1::routes(), state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // The guard only reads head data; the body is not `Sync`, so keep it aside.
    let (mut parts, body) = req.into_parts();

    match state.guard.authenticate(&parts).await? {
        GuardOutcome::Authenticated(token) => {
            // middleware → extractor への受け渡し
            parts.extensions.insert(AuthCtx::new(token));
            Ok(next.run(Request::from_parts(parts, body)).await)
        }
        GuardOutcome::Failed(failure) => Ok(failure.into_response()),
    }
}
