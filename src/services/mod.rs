pub mod auth;
pub mod background;
pub mod mailer;
