//! Session logger, the `log` backend installed by the binary.
//!
//! Everything goes to a single file in the OS data directory, **truncated at
//! each launch** so it only holds the most recent session:
//!
//!   Windows:  `%APPDATA%\CutoutFE\data\cutoutfe.log`
//!   Linux:    `~/.local/share/cutoutfe/cutoutfe.log`
//!   macOS:    `~/Library/Application Support/CutoutFE/cutoutfe.log`
//!
//! Lines look like `[HH:MM:SS] [LEVEL] message`. With `mirror_stderr` the same
//! lines are echoed to stderr. I/O errors while logging are ignored.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{Level, LevelFilter, Log, Metadata, Record};

static LOGGER: OnceLock<SessionLogger> = OnceLock::new();

struct SessionLogger {
    file: Option<Mutex<File>>,
    path: Option<PathBuf>,
    mirror_stderr: bool,
    level: LevelFilter,
}

impl SessionLogger {
    fn write_line(&self, line: &str) {
        if let Some(mutex) = &self.file
            && let Ok(mut file) = mutex.lock()
        {
            let _ = writeln!(file, "{}", line);
        }
        if self.mirror_stderr {
            eprintln!("{}", line);
        }
    }
}

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        self.write_line(&format!("[{}] [{}] {}", timestamp(), level, record.args()));
    }

    fn flush(&self) {
        if let Some(mutex) = &self.file
            && let Ok(mut file) = mutex.lock()
        {
            let _ = file.flush();
        }
    }
}

/// Returns the path of the current session log, if one could be opened.
pub fn log_path() -> Option<&'static Path> {
    LOGGER.get().and_then(|l| l.path.as_deref())
}

/// Install the session logger. Later calls are ignored.
///
/// * Creates (or truncates) the log file. Failure to open it is not fatal;
///   logging then only reaches stderr (if mirrored).
/// * Installs a panic hook that writes the panic message to the log before
///   delegating to the previous hook.
pub fn init(verbose: bool) {
    init_at(log_file_path(), verbose);
}

/// Same as [`init`] with an explicit file location.
pub fn init_at(path: Option<PathBuf>, verbose: bool) {
    let file = path.as_ref().and_then(|p| open_truncated(p));
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let logger = SessionLogger {
        path: if file.is_some() { path } else { None },
        file: file.map(Mutex::new),
        mirror_stderr: verbose,
        level,
    };
    if LOGGER.set(logger).is_err() {
        return;
    }
    let Some(logger) = LOGGER.get() else {
        return;
    };
    if log::set_logger(logger).is_err() {
        return;
    }
    log::set_max_level(level);

    logger.write_line(&format!(
        "=== CutoutFE {} session started {} ===",
        env!("CARGO_PKG_VERSION"),
        human_timestamp()
    ));
    if let Some(p) = &logger.path {
        logger.write_line(&format!("Log file: {}", p.display()));
    }

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(l) = LOGGER.get() {
            l.write_line(&format!("[{}] [PANIC] {}", timestamp(), info));
            l.flush();
        }
        prev(info);
    }));
}

fn open_truncated(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match OpenOptions::new().create(true).write(true).truncate(true).open(path) {
        Ok(f) => Some(f),
        Err(e) => {
            eprintln!("[logger] Failed to open log file {:?}: {}", path, e);
            None
        }
    }
}

fn log_file_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "CutoutFE")
        .map(|dirs| dirs.data_dir().join("cutoutfe.log"))
}

/// `HH:MM:SS` within the current (UTC) day.
fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => {
            let secs = d.as_secs();
            let h = (secs % 86400) / 3600;
            let m = (secs % 3600) / 60;
            let s = secs % 60;
            format!("{:02}:{:02}:{:02}", h, m, s)
        }
        Err(_) => "??:??:??".to_string(),
    }
}

fn human_timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => format!("(unix {})", d.as_secs()),
        Err(_) => "(unknown time)".to_string(),
    }
}
