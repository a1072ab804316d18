//! Word Quest - Telegram bot for learning English words
//!
//! Runs multiple-choice translation quizzes over a shared vocabulary plus
//! each user's own words.

mod config;
mod db;
mod dispatcher;
mod quiz;
mod runtime;
mod session;
mod telegram;

use config::BotConfig;
use db::{Database, DEFAULT_GLOBAL_WORDS};
use dispatcher::Dispatcher;
use quiz::QuizEngine;
use runtime::{DatabaseRepository, RuntimeManager, WordRepository};
use session::InMemorySessionStore;
use std::sync::Arc;
use telegram::TelegramTransport;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "word_quest=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = BotConfig::from_env()?;
    tracing::debug!(config = ?config, "Configuration loaded");

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    if config.seed_words {
        let inserted = db.seed_global_words(DEFAULT_GLOBAL_WORDS)?;
        tracing::info!(inserted, "Global vocabulary seeded");
    }

    let repo = DatabaseRepository::new(db).with_timeout(config.storage_timeout);
    let global_words = repo.list_global_words().await?;
    tracing::info!(count = global_words.len(), "Global vocabulary loaded");

    // Users registered in earlier runs skip the registration round trip
    let known_users = repo.list_user_ids().await?;
    tracing::info!(count = known_users.len(), "Loaded known users");
    let sessions = InMemorySessionStore::with_known(known_users.iter().copied());

    let transport = Arc::new(TelegramTransport::new(
        &config.telegram_token,
        config.poll_timeout,
    )?);
    let engine = QuizEngine::new(repo, sessions).with_registered(known_users);
    let manager = RuntimeManager::new(Dispatcher::new(engine, Arc::clone(&transport)));

    tracing::info!("Word Quest bot started");
    tokio::select! {
        () = manager.run(&transport) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
