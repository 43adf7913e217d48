/*
 * Responsibility
 * - accept the `{id}` path segment as a typed resource id
 * - only positive integers are ids; anything else is reported as not found
 *
 * Keep here
 *  - ResourceId<T> (the generic body) and its FromRequestParts impl
 * Keep out
 *  - concrete resource names (School, ...) -> types.rs
 */
use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::AppError;

pub struct ResourceId<T> {
    pub id: i64,
    _marker: PhantomData<T>,
}

impl<T> ResourceId<T> {
    fn new(id: i64) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id >= 1)
}

impl<S, T> FromRequestParts<S> for ResourceId<T>
where
    S: Send + Sync,
    T: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound)?;
        let id = parse_id(&raw).ok_or(AppError::NotFound)?;
        Ok(Self::new(id))
    }
}

impl<T> std::fmt::Debug for ResourceId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceId").field("id", &self.id).finish()
    }
}
