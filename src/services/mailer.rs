//! Outbound mail interface.
//!
//! Delivery itself lives outside this service. `LogMailer` records what would
//! have been sent so registration can run end to end without an SMTP relay.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

pub const USER_WELCOME_TEMPLATE: &str = "user_welcome";

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    // Returns the backend name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn send(&self, recipient: &str, template: &'static str, data: Value)
    -> anyhow::Result<()>;
}

#[derive(Clone, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn backend_name(&self) -> &'static str {
        "log"
    }

    async fn send(
        &self,
        recipient: &str,
        template: &'static str,
        data: Value,
    ) -> anyhow::Result<()> {
        // Keys only: the payload may carry a one-time secret.
        let fields: Vec<&str> = data
            .as_object()
            .map(|o| o.keys().map(String::as_str).collect())
            .unwrap_or_default();

        info!(recipient, template, ?fields, "mail queued");
        Ok(())
    }
}
