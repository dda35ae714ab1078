//! Application state wiring the generation core together.
//!
//! AppState holds the concrete router used by both CLI and REST API. The
//! core is generic over its ledger store; AppState pins it to SQLite.

use std::path::PathBuf;
use std::sync::Arc;

use interview_ai_core::llm::router::FailoverRouter;
use interview_ai_infra::config::{load_ai_config, resolve_data_dir};
use interview_ai_infra::env_keys::{primary_keys_from_env, secondary_key_from_env};
use interview_ai_infra::llm::build_router;
use interview_ai_infra::sqlite::pool::{default_database_url, DatabasePool};
use interview_ai_infra::sqlite::usage::SqliteUsageStore;
use interview_ai_types::config::AiConfig;

/// Router pinned to the SQLite ledger.
pub type ConcreteRouter = FailoverRouter<SqliteUsageStore>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AiConfig>,
    pub router: Arc<ConcreteRouter>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, open the ledger
    /// database, read provider keys from the environment.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_ai_config(&data_dir).await;

        let db_url = format!("{}?mode=rwc", default_database_url(&data_dir));
        let db_pool = DatabasePool::new(&db_url).await?;

        let primary_keys = primary_keys_from_env();
        if primary_keys.is_empty() {
            tracing::warn!("No OPENROUTER_API_KEY* variables set; primary provider has no keys");
        }

        let router = build_router(
            &config,
            SqliteUsageStore::new(db_pool.clone()),
            primary_keys,
            secondary_key_from_env(),
        )?;

        Ok(Self::from_parts(config, router, data_dir, db_pool))
    }

    pub fn from_parts(
        config: AiConfig,
        router: ConcreteRouter,
        data_dir: PathBuf,
        db_pool: DatabasePool,
    ) -> Self {
        Self {
            config: Arc::new(config),
            router: Arc::new(router),
            data_dir,
            db_pool,
        }
    }
}
