//! Debug capture logger.
//!
//! With [`SessionConfig::debug_capture`](crate::SessionConfig) set, the
//! session engine logs every received chunk (after redaction) at `debug`
//! level to [`CAPTURE_TARGET`]. [`init`] installs an `env_logger` that
//! writes those records, and everything else at or above `level`, to a file
//! and to stderr.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use log::LevelFilter;

use crate::error::{CaptureError, Result};

/// Log target for captured device output.
pub const CAPTURE_TARGET: &str = "ftdshell::capture";

/// File written by [`init`] when no path is given.
pub const DEFAULT_LOG_FILE: &str = "ftdshell.log";

/// Install the global capture logger.
///
/// Records are formatted as `timestamp - target - level - message` and
/// appended to `file` (default [`DEFAULT_LOG_FILE`]) as well as stderr.
/// Fails if the file cannot be opened or a logger is already installed.
pub fn init(file: Option<&Path>, level: LevelFilter) -> Result<()> {
    let path = file.unwrap_or(Path::new(DEFAULT_LOG_FILE));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(CaptureError::from)?;

    env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {} - {}",
                buf.timestamp_millis(),
                record.target(),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(Tee::new(file, io::stderr()))))
        .try_init()
        .map_err(CaptureError::from)?;

    Ok(())
}

/// Writes everything to two sinks.
struct Tee<A, B> {
    primary: A,
    secondary: B,
}

impl<A: Write, B: Write> Tee<A, B> {
    fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.primary.write_all(buf)?;
        self.secondary.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush()?;
        self.secondary.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::error::Error;

    #[test]
    fn test_tee_writes_both_sinks() {
        let mut tee = Tee::new(Vec::new(), Vec::new());
        tee.write_all(b"fw# ").unwrap();
        tee.flush().unwrap();
        assert_eq!(tee.primary, b"fw# ");
        assert_eq!(tee.secondary, b"fw# ");
    }

    // Installs the process-wide logger, so this is the only test that calls init.
    #[test]
    fn test_init_writes_formatted_records() {
        let name = format!("ftdshell-capture-{}.log", std::process::id());
        let path = std::env::temp_dir().join(name);
        let _ = fs::remove_file(&path);

        init(Some(&path), LevelFilter::Debug).unwrap();
        log::debug!(target: CAPTURE_TARGET, "firepower# ");
        log::logger().flush();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains(" - ftdshell::capture - DEBUG - firepower# "));

        let err = init(Some(&path), LevelFilter::Debug).unwrap_err();
        assert!(matches!(err, Error::Capture(CaptureError::Logger(_))));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_init_reports_unopenable_file() {
        let path = std::env::temp_dir().join("ftdshell-missing-dir").join("nested").join("x.log");
        let err = init(Some(&path), LevelFilter::Info).unwrap_err();
        assert!(matches!(err, Error::Capture(CaptureError::Io(_))));
    }
}
