/*
 * Responsibility
 * - start the tokio runtime and hand over to app::run (no logic here)
 */
use anyhow::Result;

mod api;
mod app;
mod config;
mod error;
mod middleware;
mod repos;
mod services;
mod state;
mod validator;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await
}
