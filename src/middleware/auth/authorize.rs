//! Per-route authorization gates.
//!
//! Gates run in a fixed order and stop at the first failure:
//! 1. authenticated, else 401 `authentication_required`
//! 2. activated, else 403 `inactive_account`
//! 3. holds the route's permission code, else 403 `not_permitted`
//!
//! Both gates read the identity attached by `authenticate`; a route wired
//! without it fails with a logged 500 rather than treating the caller as
//! anonymous.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};
use tracing::{debug, warn};

use crate::api::v1::extractors::{AuthCtx, auth_ctx::attached};
use crate::error::AppError;
use crate::repos::permission_repo::PermissionStore;
use crate::state::AppState;

/// Gates 1-2 for every route of `router`.
pub fn require_activated_user(router: Router<AppState>) -> Router<AppState> {
    router.route_layer(middleware::from_fn(activated_gate))
}

/// Gates 1-3 for every route of `router`, with `code` as the required permission.
pub fn require_permission(
    router: Router<AppState>,
    state: AppState,
    code: &'static str,
) -> Router<AppState> {
    let gate = PermissionGate { state, code };
    router.route_layer(middleware::from_fn_with_state(gate, permission_gate))
}

#[derive(Clone)]
struct PermissionGate {
    state: AppState,
    code: &'static str,
}

async fn activated_gate(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    attached(req.extensions())?.require_activated()?;
    Ok(next.run(req).await)
}

async fn permission_gate(
    State(gate): State<PermissionGate>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = attached(req.extensions())?.clone();
    authorize(&ctx, gate.state.permissions.as_ref(), gate.code).await?;
    Ok(next.run(req).await)
}

/// Gates 1-3 against an explicit identity.
///
/// Grants are read after the activation check, so anonymous and inactive
/// callers never reach the permission store.
pub async fn authorize(
    ctx: &AuthCtx,
    permissions: &dyn PermissionStore,
    code: &str,
) -> Result<(), AppError> {
    let user = ctx.require_activated()?;

    let granted = permissions.all_for_user(user.id).await?;
    if !granted.includes(code) {
        warn!(
            user_id = user.id,
            permission = code,
            held = ?granted,
            "permission denied"
        );
        return Err(AppError::NotPermitted);
    }

    debug!(user_id = user.id, permission = code, "permission granted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::repos::memory::MemoryStore;
    use crate::repos::permission_repo::{SCHOOLS_READ, SCHOOLS_WRITE};

    #[tokio::test]
    async fn anonymous_is_unauthenticated_before_anything_else() {
        let store = MemoryStore::new();
        store.fail_all();

        let err = authorize(&AuthCtx::Anonymous, &store, SCHOOLS_READ)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthenticationRequired));
    }

    #[tokio::test]
    async fn inactive_user_is_refused_even_with_the_permission() {
        let store = MemoryStore::new();
        let user = store.seed_user("inactive@example.com", false);
        store.grant(user.id, &[SCHOOLS_READ]).await.unwrap();

        let err = authorize(&AuthCtx::User(user), &store, SCHOOLS_READ)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InactiveAccount));
    }

    #[tokio::test]
    async fn no_grants_means_no_access() {
        let store = MemoryStore::new();
        let user = store.seed_user("bare@example.com", true);

        let err = authorize(&AuthCtx::User(user), &store, SCHOOLS_READ)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotPermitted));
    }

    #[tokio::test]
    async fn only_the_exact_code_grants_access() {
        let store = Arc::new(MemoryStore::new());
        let user = store.seed_user("reader@example.com", true);
        store.grant(user.id, &[SCHOOLS_READ]).await.unwrap();
        let ctx = AuthCtx::User(user);

        authorize(&ctx, store.as_ref(), SCHOOLS_READ).await.unwrap();
        assert!(matches!(
            authorize(&ctx, store.as_ref(), SCHOOLS_WRITE).await,
            Err(AppError::NotPermitted)
        ));
        assert!(matches!(
            authorize(&ctx, store.as_ref(), "schools:*").await,
            Err(AppError::NotPermitted)
        ));
    }

    #[tokio::test]
    async fn store_failure_is_internal_not_a_denial() {
        let store = MemoryStore::new();
        let user = store.seed_user("reader@example.com", true);
        store.fail_all();

        let err = authorize(&AuthCtx::User(user), &store, SCHOOLS_READ)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal));
    }
}
