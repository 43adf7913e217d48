/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - give handlers the caller's identity (AuthCtx) as a typed value
 * - axum-specific code stays in core, the type itself in types
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor
 * - attached (shared with the authorization gates)
 */

mod core;
mod types;

pub use self::core::{AuthCtxExtractor, attached};
pub use types::AuthCtx;
