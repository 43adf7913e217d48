pub mod password;
pub mod token_service;

pub use token_service::{Scope, Token, TokenError, TokenService};
