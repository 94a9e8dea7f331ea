//! Session logger
//!
//! Records go to the terminal with coloured level tags and to the session's
//! log file with plain tags. Individual modules can be given their own level,
//! for example to quieten per-cycle output from a controller while keeping
//! lifecycle messages.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use std::fmt;
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Log levels for an execution.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerConfig {
    /// Level applied to every module without its own entry
    pub level: LevelFilter,

    /// Per-module overrides, keyed by module path
    pub module_levels: Vec<(String, LevelFilter)>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LoggerConfig {
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            module_levels: Vec::new()
        }
    }

    /// Give `module` (and its submodules) its own level.
    pub fn module_level<S: Into<String>>(mut self, module: S, level: LevelFilter) -> Self {
        self.module_levels.push((module.into(), level));
        self
    }

    /// The level applied to records from `target`. The longest matching
    /// module path wins.
    pub fn level_for(&self, target: &str) -> LevelFilter {
        self.module_levels
            .iter()
            .filter(|(module, _)| is_within(target, module))
            .max_by_key(|(module, _)| module.len())
            .map(|(_, level)| *level)
            .unwrap_or(self.level)
    }

    /// The global level must let lifecycle messages through.
    fn validate(&self) -> Result<(), LoggerInitError> {
        if self.level < Level::Info {
            return Err(LoggerInitError::InvalidMinLogLevel(self.level));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(config: &LoggerConfig, session: &Session) -> Result<(), LoggerInitError> {
    config.validate()?;

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    // The dispatch level only sets the `log` maximum, records are filtered
    // per module below
    let max_level = config.module_levels
        .iter()
        .fold(config.level, |max, (_, level)| max.max(*level));
    let levels = config.clone();

    fern::Dispatch::new()
        .level(max_level)
        .filter(move |meta| meta.level() <= levels.level_for(meta.target()))
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!("{}", Line::new(record, message, true)))
                })
                .chain(std::io::stdout())
        )
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!("{}", Line::new(record, message, false)))
                })
                .chain(log_file)
        )
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log level: {:?}", config.level);
    for (module, level) in config.module_levels.iter() {
        info!("    {}: {:?}", module, level);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE ITEMS
// ---------------------------------------------------------------------------

/// One formatted log line.
///
/// Debug and trace lines carry the target so per-cycle output can be traced
/// back to its module.
struct Line<'a> {
    elapsed_s: f64,
    tag: ColoredString,
    target: Option<&'a str>,
    message: &'a fmt::Arguments<'a>
}

impl<'a> Line<'a> {
    fn new(record: &'a Record, message: &'a fmt::Arguments<'a>, coloured: bool) -> Self {
        Self {
            elapsed_s: session::get_elapsed_seconds(),
            tag: level_tag(record.level(), coloured),
            target: if record.level() > Level::Info {
                Some(record.target())
            }
            else {
                None
            },
            message
        }
    }
}

impl<'a> fmt::Display for Line<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:10.6} {}] ", self.elapsed_s, self.tag)?;
        if let Some(target) = self.target {
            write!(f, "{}: ", target)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Three letter tag for a level, optionally coloured for the terminal.
fn level_tag(level: Level, coloured: bool) -> ColoredString {
    let tag = match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info  => "INF",
        Level::Warn  => "WRN",
        Level::Error => "ERR"
    };

    if !coloured {
        return tag.normal();
    }

    match level {
        Level::Trace => tag.dimmed().italic(),
        Level::Debug => tag.dimmed(),
        Level::Info  => tag.normal(),
        Level::Warn  => tag.yellow(),
        Level::Error => tag.red().bold()
    }
}

/// True if `target` is `module` or one of its submodules.
fn is_within(target: &str, module: &str) -> bool {
    match target.strip_prefix(module) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_global_level_must_include_info() {
        assert!(LoggerConfig::new(LevelFilter::Info).validate().is_ok());
        assert!(LoggerConfig::new(LevelFilter::Trace).validate().is_ok());
        assert!(matches!(
            LoggerConfig::new(LevelFilter::Warn).validate(),
            Err(LoggerInitError::InvalidMinLogLevel(LevelFilter::Warn))
        ));

        // Quieter modules are fine
        let config = LoggerConfig::new(LevelFilter::Debug)
            .module_level("heading_lib::sim", LevelFilter::Warn);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_most_specific_module_wins() {
        let config = LoggerConfig::new(LevelFilter::Info)
            .module_level("heading_lib", LevelFilter::Debug)
            .module_level("heading_lib::heading_ctrl", LevelFilter::Trace);

        assert_eq!(config.level_for("heading_exec"), LevelFilter::Info);
        assert_eq!(config.level_for("heading_lib::head_lock::state"), LevelFilter::Debug);
        assert_eq!(config.level_for("heading_lib::heading_ctrl"), LevelFilter::Trace);
        assert_eq!(
            config.level_for("heading_lib::heading_ctrl::controller"),
            LevelFilter::Trace
        );

        // Prefixes only match on module boundaries
        assert_eq!(config.level_for("heading_library"), LevelFilter::Info);
    }

    #[test]
    fn test_file_tags_are_plain() {
        colored::control::set_override(true);
        let levels = [Level::Trace, Level::Debug, Level::Info, Level::Warn, Level::Error];

        for level in levels.iter() {
            let plain = level_tag(*level, false).to_string();
            assert_eq!(plain.len(), 3);
            assert!(!plain.contains('\u{1b}'));
        }
        assert!(level_tag(Level::Error, true).to_string().contains('\u{1b}'));
        colored::control::unset_override();
    }
}
