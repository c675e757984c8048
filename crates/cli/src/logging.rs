use anyhow::Result;
use stockroom_core::StateDir;
use stockroom_core::tracing::{InstrumentationConfig, LogFileConfig, init_tracing};
use tracing::Level;

/// Initialize logging for the CLI
pub fn init_logging(
    level: Level,
    state_dir: &StateDir,
    no_file_log: bool,
    json: bool,
) -> Result<()> {
    let level_str = level.as_str().to_lowercase();

    let mut config = InstrumentationConfig {
        log_level: format!(
            "stockroom={level_str},stockroom_core={level_str},stockroom_http={level_str}"
        ),
        json,
        ..InstrumentationConfig::default()
    };

    if !no_file_log {
        // Command output goes to stdout, so the console only gets logs in debug builds
        config = config.with_file(LogFileConfig {
            directory: state_dir.logs_dir(),
            file_name: "cli.log".to_string(),
            ..LogFileConfig::default()
        });
    }

    init_tracing(&config)
}
