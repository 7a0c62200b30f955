//! Turns a validated [`QuillConfig`] into a running server.

use anyhow::{Context, Result};
use quill_api::{create_app, AppState};
use quill_common::observability::{LogConfig, LogFormat};
use quill_config::{LoggingConfig, QuillConfig};
use quill_llm::checker::ContentChecker;
use quill_llm::LlmSettings;
use quill_store::{SeedCategory, SeedUser, Store};
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

pub fn log_config(logging: &LoggingConfig) -> LogConfig {
    LogConfig {
        app_name: "quill",
        log_dir: logging.dir.as_ref().map(PathBuf::from),
        emit_stderr: logging.stderr,
        format: LogFormat::from_name(&logging.format),
        default_filter: logging.filter.clone(),
        max_files: logging.keep_files,
    }
}

pub fn llm_settings(cfg: &QuillConfig) -> LlmSettings {
    LlmSettings {
        api_key: cfg.llm.api_key.clone(),
        model: cfg.llm.model.clone(),
        endpoint: cfg.llm.endpoint.clone(),
        timeout: Duration::from_secs(cfg.llm.timeout_secs),
    }
}

fn seed_users(cfg: &QuillConfig) -> Vec<SeedUser> {
    cfg.users
        .iter()
        .map(|u| SeedUser {
            username: u.username.clone(),
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            token: u.token.clone(),
            is_staff: u.is_staff,
        })
        .collect()
}

fn seed_categories(cfg: &QuillConfig) -> Vec<SeedCategory> {
    cfg.categories
        .iter()
        .map(|c| SeedCategory {
            name: c.name.clone(),
            description: c.description.clone(),
        })
        .collect()
}

/// Open the database, create the schema, apply seeds and connect the provider.
pub async fn build_state(cfg: &QuillConfig) -> Result<AppState> {
    let store = Store::connect(&cfg.database.url, cfg.database.max_connections)
        .await
        .with_context(|| format!("opening database {}", cfg.database.url))?;
    store.bootstrap().await.context("creating schema")?;
    store.seed_users(&seed_users(cfg)).await.context("seeding users")?;
    store
        .seed_categories(&seed_categories(cfg))
        .await
        .context("seeding categories")?;
    store.seed_tags(&cfg.tags).await.context("seeding tags")?;

    let client = quill_llm::connect(&llm_settings(cfg))?;
    Ok(AppState::new(store, ContentChecker::new(client)))
}

pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!(addr=%listener.local_addr()?, "app.listening");

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("app.stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error=%err, "app.signal.install_failed");
        std::future::pending::<()>().await;
    }
    info!("app.shutdown.requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_config::QuillConfigLoader;

    const YAML: &str = r#"
database:
  url: "sqlite::memory:"
llm:
  api_key: "sk-test"
  timeout_secs: 5
logging:
  format: json
  dir: /tmp/quill-logs
  keep_files: 7
users:
  - username: alice
    email: alice@example.com
    token: tok-alice
  - username: root
    token: tok-root
    is_staff: true
categories:
  - name: Technologie
    description: Tech
tags: [rust, sqlite]
"#;

    fn config() -> QuillConfig {
        QuillConfigLoader::new().with_yaml_str(YAML).load().unwrap()
    }

    #[test]
    fn logging_section_maps_to_log_config() {
        let cfg = config();
        let log = log_config(&cfg.logging);
        assert!(matches!(log.format, LogFormat::Json));
        assert_eq!(log.log_dir, Some(PathBuf::from("/tmp/quill-logs")));
        assert_eq!(log.max_files, Some(7));
        assert_eq!(log.default_filter, "info");
    }

    #[test]
    fn llm_settings_carry_timeout() {
        let settings = llm_settings(&config());
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.model, "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn state_is_seeded_from_config() {
        let state = build_state(&config()).await.unwrap();
        let root = state.store.user_by_token("tok-root").await.unwrap().unwrap();
        assert!(root.is_staff);
        assert_eq!(state.store.list_tags(None).await.unwrap().len(), 2);
        assert_eq!(state.store.list_categories(None).await.unwrap().len(), 1);
        assert_eq!(state.checker.model_name(), "gpt-3.5-turbo");
    }
}
