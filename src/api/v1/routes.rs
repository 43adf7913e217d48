/*
 * Responsibility
 * - path -> handler table of v1
 * - attach the per-route gates (authorize) and the identity layer
 *   (authenticate) around the whole tree
 */
use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::api::v1::handlers::{health, schools, tokens, users};
use crate::middleware::auth::{authenticate, require_permission};
use crate::repos::permission_repo::{SCHOOLS_READ, SCHOOLS_WRITE};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/healthcheck", get(health::health))
        .route("/users", post(users::register_user))
        .route("/users/activated", put(users::activate_user))
        .route(
            "/tokens/authentication",
            post(tokens::create_authentication_token),
        );

    let read = require_permission(
        Router::new()
            .route("/schools", get(schools::list_schools))
            .route("/schools/{id}", get(schools::show_school)),
        state.clone(),
        SCHOOLS_READ,
    );

    let write = require_permission(
        Router::new()
            .route("/schools", post(schools::create_school))
            .route(
                "/schools/{id}",
                patch(schools::update_school).delete(schools::delete_school),
            ),
        state.clone(),
        SCHOOLS_WRITE,
    );

    authenticate::apply(public.merge(read).merge(write), state)
}
