/*
 * Responsibility
 * - /schools CRUD (routes are gated by schools:read / schools:write)
 * - PATCH is a read-modify-write guarded by the row version; a client may
 *   pin the version it last saw with `X-Expected-Version`
 */
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::api::v1::dto::schools::{
    CreateSchoolRequest, ListSchoolsQuery, MessageEnvelope, SchoolEnvelope, SchoolListEnvelope,
    UpdateSchoolRequest,
};
use crate::api::v1::extractors::{AuthCtxExtractor, JsonBody, SchoolId};
use crate::error::AppError;
use crate::repos::versioned::check_expected;
use crate::state::AppState;

pub const EXPECTED_VERSION_HEADER: &str = "x-expected-version";

fn expected_version(headers: &HeaderMap) -> Result<Option<i32>, AppError> {
    let Some(raw) = headers.get(EXPECTED_VERSION_HEADER) else {
        return Ok(None);
    };
    raw.to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i32>().ok())
        .filter(|v| *v >= 1)
        .map(Some)
        .ok_or_else(|| AppError::bad_request("X-Expected-Version must be a positive integer"))
}

pub async fn list_schools(
    State(state): State<AppState>,
    Query(query): Query<ListSchoolsQuery>,
) -> Result<Json<SchoolListEnvelope>, AppError> {
    let filters = query.into_filters().map_err(AppError::FailedValidation)?;
    let (rows, metadata) = state.schools.list(&filters).await?;

    Ok(Json(SchoolListEnvelope {
        schools: rows.into_iter().map(Into::into).collect(),
        metadata,
    }))
}

pub async fn create_school(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    JsonBody(req): JsonBody<CreateSchoolRequest>,
) -> Result<Response, AppError> {
    let new_school = req.into_new_school().map_err(AppError::FailedValidation)?;
    let school = state.schools.insert(new_school).await?;

    info!(school_id = school.id, user_id = ctx.user_id(), "school created");

    let location = HeaderValue::from_str(&format!("/v1/schools/{}", school.id))
        .map_err(|_| AppError::Internal)?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(SchoolEnvelope {
            school: school.into(),
        }),
    )
        .into_response())
}

pub async fn show_school(
    State(state): State<AppState>,
    id: SchoolId,
) -> Result<Json<SchoolEnvelope>, AppError> {
    let school = state.schools.get(id.id).await?;
    Ok(Json(SchoolEnvelope {
        school: school.into(),
    }))
}

pub async fn update_school(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    id: SchoolId,
    headers: HeaderMap,
    JsonBody(req): JsonBody<UpdateSchoolRequest>,
) -> Result<Json<SchoolEnvelope>, AppError> {
    let expected = expected_version(&headers)?;

    let mut school = state.schools.get(id.id).await?;
    check_expected(school.version, expected)?;

    req.apply(&mut school).map_err(AppError::FailedValidation)?;
    state.schools.update(&mut school).await?;

    info!(
        school_id = school.id,
        version = school.version,
        user_id = ctx.user_id(),
        "school updated"
    );
    Ok(Json(SchoolEnvelope {
        school: school.into(),
    }))
}

pub async fn delete_school(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    id: SchoolId,
) -> Result<Json<MessageEnvelope>, AppError> {
    state.schools.delete(id.id).await?;

    info!(school_id = id.id, user_id = ctx.user_id(), "school deleted");
    Ok(Json(MessageEnvelope {
        message: "school successfully deleted",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_version_header_is_optional_but_strict() {
        let mut headers = HeaderMap::new();
        assert_eq!(expected_version(&headers).unwrap(), None);

        headers.insert(EXPECTED_VERSION_HEADER, HeaderValue::from_static("4"));
        assert_eq!(expected_version(&headers).unwrap(), Some(4));

        for bad in ["0", "-1", "four"] {
            headers.insert(EXPECTED_VERSION_HEADER, HeaderValue::from_static(bad));
            assert!(matches!(
                expected_version(&headers),
                Err(AppError::BadRequest(_))
            ));
        }
    }
}
