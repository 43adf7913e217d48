/*
 * Responsibility
 * - v1 handlers, one module per resource
 * - handlers validate DTOs, call stores/services and shape the envelope;
 *   errors leave as AppError
 */
pub mod health;
pub mod schools;
pub mod tokens;
pub mod users;
