use anyhow::{Context, Result};
use clap::Parser;
use quill_common::observability::init_logging;
use quill_config::{QuillConfig, QuillConfigLoader};
use std::path::PathBuf;

mod wiring;

/// Blog backend with AI-assisted content review.
#[derive(Debug, Parser)]
#[command(name = "quill", version)]
struct Cli {
    /// YAML configuration file. Missing files are tolerated; environment
    /// variables (`QUILL__SECTION__KEY`) always win.
    #[arg(long, env = "QUILL_CONFIG", default_value = "quill.yaml")]
    config: PathBuf,

    /// Print the effective configuration (secrets redacted) and exit.
    #[arg(long)]
    print_config: bool,

    /// Override `server.bind`.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let mut cfg: QuillConfig = QuillConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(bind) = cli.bind {
        cfg.server.bind = bind;
    }

    if cli.print_config {
        println!("{}", cfg.to_redacted_yaml()?);
        return Ok(());
    }
    cfg.validate()?;

    // 2) Logging from the `logging` section
    let log_path = init_logging(wiring::log_config(&cfg.logging))?;
    tracing::info!(
        config=%cli.config.display(),
        log_file=%log_path.display(),
        "app.start"
    );

    // 3) Store, checker, router
    let state = wiring::build_state(&cfg).await?;
    wiring::serve(&cfg.server.bind, state).await
}
