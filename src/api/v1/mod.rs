/*
 * Responsibility
 * - v1 surface: routes() plus the modules handlers and tests reach into
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;


pub use routes::routes;
