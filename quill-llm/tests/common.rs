use std::sync::OnceLock;

use quill_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "quill-tests",
            log_dir: Some(std::env::temp_dir().join("quill-tests")),
            emit_stderr: true,
            format: LogFormat::from_name(
                &std::env::var("QUILL_LOG_FORMAT").unwrap_or_default(),
            ),
            default_filter: "debug".to_string(),
            max_files: Some(3),
        };

        quill_common::observability::init_logging(config).unwrap_or_default()
    });
}
