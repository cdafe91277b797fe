use scout_common::observability::{init_logging, LogConfig, LogFormat};
use std::sync::Once;

static TRACING: Once = Once::new();

/// Route test logs to `$TMPDIR/scout-tests`; `SCOUT_TEST_LOG_FORMAT=json` switches encoding.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let format = std::env::var("SCOUT_TEST_LOG_FORMAT")
            .ok()
            .and_then(|raw| raw.parse::<LogFormat>().ok())
            .unwrap_or(LogFormat::Text);

        let _ = init_logging(LogConfig {
            app_name: "scout-tests",
            log_dir: Some(std::env::temp_dir().join("scout-tests")),
            format,
            default_filter: "debug",
            ..LogConfig::default()
        });
    });
}
