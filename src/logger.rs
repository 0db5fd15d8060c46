use std::sync::Arc;
use std::time::Duration;

use spdlog::sink::{RotatingFileSink, RotationPolicy, StdStream, StdStreamSink};
use spdlog::{Level, LevelFilter, Logger, LoggerBuilder};

use crate::config::{Log, LogLevel};

impl From<LogLevel> for Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Critical => Level::Critical,
            LogLevel::Error => Level::Error,
            LogLevel::Warn => Level::Warn,
            LogLevel::Info => Level::Info,
            LogLevel::Debug => Level::Debug,
            LogLevel::Trace => Level::Trace,
        }
    }
}

fn add_console_sinks(builder: &mut LoggerBuilder) -> spdlog::Result<()> {
    let stdout = Arc::new(StdStreamSink::builder()
        .std_stream(StdStream::Stdout)
        .level_filter(LevelFilter::MoreVerbose(Level::Warn))
        .build()?);

    let stderr = Arc::new(StdStreamSink::builder()
        .std_stream(StdStream::Stderr)
        .level_filter(LevelFilter::MoreSevereEqual(Level::Warn))
        .build()?);

    builder.sink(stdout).sink(stderr);

    Ok(())
}

/// Builds the logger handed to the exporter. Console only, unless a log file is configured.
/// `verbose` forces trace level, which is also how dry runs print the generated documents.
pub fn build_logger(verbose: bool, log: Option<&Log>) -> spdlog::Result<Arc<Logger>> {
    let mut builder = Logger::builder();
    let mut level = Level::Info;

    match log {
        Some(log) => {
            if let Some(ref location) = log.location {
                let daily_sink = Arc::new(RotatingFileSink::builder()
                    .base_path(location)
                    .rotation_policy(RotationPolicy::Daily { hour: 0, minute: 0 })
                    .max_files(60)
                    .rotate_on_open(false)
                    .build()?);
                builder.sink(daily_sink);
            }
            if log.log_to_console || log.location.is_none() {
                add_console_sinks(&mut builder)?;
            }
            level = log.level.into();
        }
        None => add_console_sinks(&mut builder)?,
    }

    if verbose {
        level = Level::Trace;
    }

    let logger = Arc::new(builder.build()?);
    logger.set_flush_level_filter(LevelFilter::MoreSevereEqual(Level::Info));
    logger.set_flush_period(Some(Duration::from_secs(2)));
    logger.set_level_filter(LevelFilter::MoreSevereEqual(level));

    Ok(logger)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_logger() {
        let logger = build_logger(false, None).unwrap();
        assert!(logger.should_log(Level::Info));
        assert!(!logger.should_log(Level::Debug));

        let logger = build_logger(true, None).unwrap();
        assert!(logger.should_log(Level::Trace));
    }

    #[test]
    fn test_file_logger() {
        let dir = tempfile::tempdir().unwrap();
        let log = Log {
            level: LogLevel::Warn,
            log_to_console: false,
            location: Some(dir.path().join("export.log")),
        };
        let logger = build_logger(false, Some(&log)).unwrap();
        assert!(logger.should_log(Level::Error));
        assert!(!logger.should_log(Level::Info));

        let logger = build_logger(true, Some(&Log { location: Some(dir.path().join("v.log")), ..log })).unwrap();
        assert!(logger.should_log(Level::Trace));
    }
}
