use chrono::Local;
use eyre::Result;
use fern::Dispatch;
use log::LevelFilter;

/// Sets up the application logger with console output.
///
/// # Arguments
/// * `level` - Overrides `RUST_LOG` when given
///
/// # Returns
/// * `Result<()>` - Success or failure of logger setup
///
/// # Errors
/// * If a logger is already installed
pub fn setup_logger(level: Option<LevelFilter>) -> Result<()> {
    Dispatch::new()
        // Explicit level first, then RUST_LOG, then Info
        .level(level.unwrap_or_else(level_from_env))
        .chain(std::io::stdout())
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                message
            ));
        })
        .apply()?;
    Ok(())
}

/// Maps `-v` repetitions to a level: none keeps the default, then debug, then trace.
#[must_use]
pub const fn verbosity(count: u8) -> Option<LevelFilter> {
    match count {
        0 => None,
        1 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    }
}

/// Level from `RUST_LOG`, or Info
fn level_from_env() -> LevelFilter {
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity() {
        assert_eq!(verbosity(0), None);
        assert_eq!(verbosity(1), Some(LevelFilter::Debug));
        assert_eq!(verbosity(4), Some(LevelFilter::Trace));
    }
}
