//! CORS policy.
//!
//! Outside production any origin may call the API. In production only the
//! origins listed in `CORS_ALLOWED_ORIGINS` get CORS headers; an empty list
//! allows none. Credentials are never allowed.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::api::v1::handlers::schools::EXPECTED_VERSION_HEADER;
use crate::config::Config;

use super::http::REQUEST_ID_HEADER;

fn allow_origin(config: &Config) -> AllowOrigin {
    if !config.app_env.is_production() {
        return AllowOrigin::from(Any);
    }

    let allowed: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    AllowOrigin::predicate(move |origin: &HeaderValue, _| allowed.contains(origin))
}

pub fn apply(router: Router, config: &Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allow_origin(config))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderName::from_static(EXPECTED_VERSION_HEADER),
        ])
        .max_age(Duration::from_secs(60));

    router.layer(cors)
}
