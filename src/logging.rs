use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use settings::LoggingConfig;

use crate::error::AppError;

/// Installs the global fmt subscriber. Events go to the configured log file,
/// or stderr so that stdout stays clean for command output.
pub fn init_tracing(logging: &LoggingConfig) -> Result<(), AppError> {
    let subscriber = tracing_subscriber::fmt::fmt().with_max_level(logging.max_level);

    if let Some(output_file) = &logging.log_file {
        let file = File::create(output_file).map_err(|source| AppError::LogFile {
            path: PathBuf::from(output_file),
            source,
        })?;
        let file = Mutex::new(file);

        let subscriber = subscriber.with_writer(file).finish();

        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = subscriber.with_writer(std::io::stderr).finish();

        tracing::subscriber::set_global_default(subscriber)?;
    }

    tracing::debug!("tracing has been started");
    Ok(())
}
