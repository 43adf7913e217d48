/*
 * Responsibility
 * - shared context bound to the Router (AppState)
 *   - stores behind traits, TokenService, mailer, background task tracker
 * - Clone is cheap (Arc inside)
 */
use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{AppEnv, Config};
use crate::repos::{
    permission_repo::{PermissionRepo, PermissionStore},
    school_repo::{SchoolRepo, SchoolStore},
    token_repo::TokenRepo,
    user_repo::{UserRepo, UserStore},
};
use crate::services::{
    auth::TokenService,
    background::BackgroundTasks,
    mailer::{LogMailer, Mailer},
};

#[derive(Clone, Copy, Debug)]
pub struct TokenTtls {
    pub activation: chrono::Duration,
    pub authentication: chrono::Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub app_env: AppEnv,
    pub ttls: TokenTtls,
    pub users: Arc<dyn UserStore>,
    pub permissions: Arc<dyn PermissionStore>,
    pub schools: Arc<dyn SchoolStore>,
    pub tokens: TokenService,
    pub mailer: Arc<dyn Mailer>,
    pub background: BackgroundTasks,
}

impl AppState {
    pub fn from_pool(db: PgPool, config: &Config) -> Self {
        let deadline = config.db_query_timeout;

        Self {
            app_env: config.app_env,
            ttls: TokenTtls {
                activation: config.activation_token_ttl,
                authentication: config.authentication_token_ttl,
            },
            users: Arc::new(UserRepo::new(db.clone(), deadline)),
            permissions: Arc::new(PermissionRepo::new(db.clone(), deadline)),
            schools: Arc::new(SchoolRepo::new(db.clone(), deadline)),
            tokens: TokenService::new(Arc::new(TokenRepo::new(db, deadline))),
            mailer: Arc::new(LogMailer),
            background: BackgroundTasks::new(),
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State wired to a single in-memory store.
    pub fn in_memory(store: Arc<crate::repos::memory::MemoryStore>) -> Self {
        Self {
            app_env: AppEnv::Development,
            ttls: TokenTtls {
                activation: chrono::Duration::days(3),
                authentication: chrono::Duration::hours(24),
            },
            users: store.clone(),
            permissions: store.clone(),
            schools: store.clone(),
            tokens: TokenService::new(store),
            mailer: Arc::new(LogMailer),
            background: BackgroundTasks::new(),
        }
    }
}
