use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::sync::Mutex;

use crate::config::LogConfig;

fn map_level_to_str(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

fn open_log_file(file_name: &str) -> io::Result<Mutex<LineWriter<File>>> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(file_name)?;
    Ok(Mutex::new(LineWriter::new(file)))
}

/// Writes every enabled record to stderr (stdout may carry a binary patch),
/// and optionally mirrors them to a log file with module paths.
struct DiffLogger {
    level: Level,
    console: bool,
    file: Option<Mutex<LineWriter<File>>>,
}

impl DiffLogger {
    fn console(level: Level) -> Self {
        Self {
            level,
            console: true,
            file: None,
        }
    }

    fn with_file(level: Level, console: bool, file_name: &str) -> io::Result<Self> {
        Ok(Self {
            level,
            console,
            file: Some(open_log_file(file_name)?),
        })
    }
}

impl Log for DiffLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = Local::now();
        let level = map_level_to_str(record.level());
        if let Some(file) = &self.file {
            if let Ok(mut writer) = file.lock() {
                let _ = writeln!(
                    writer,
                    "[{:<5} {} {}] {}",
                    level,
                    now.format("%H:%M:%S%.6f"),
                    record.module_path().unwrap_or("???"),
                    record.args()
                );
            }
        }
        if self.console {
            eprintln!(
                "[{:<5} {}] {}",
                level,
                now.format("%H:%M:%S%.3f"),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            if let Ok(mut writer) = file.lock() {
                let _ = writer.flush();
            }
        }
    }
}

impl Drop for DiffLogger {
    fn drop(&mut self) {
        self.flush();
    }
}

fn install(logger: io::Result<DiffLogger>, max_level: LevelFilter) {
    match logger {
        Ok(logger) => {
            // a logger may already be installed when several tests share the process
            if log::set_boxed_logger(Box::new(logger)).is_ok() {
                log::set_max_level(max_level);
            }
        }
        Err(e) => eprintln!("cannot open log file: {}", e),
    }
}

pub fn init_log(config: &LogConfig) {
    match config {
        LogConfig::Trace => install(
            DiffLogger::with_file(Level::Trace, false, "trace.log"),
            LevelFilter::Trace,
        ),
        LogConfig::Verbose(verbose) => match *verbose {
            0 => {
                // warnings about degraded rendering are still worth seeing
                install(Ok(DiffLogger::console(Level::Warn)), LevelFilter::Warn)
            }
            1 => install(Ok(DiffLogger::console(Level::Info)), LevelFilter::Info),
            2 => install(Ok(DiffLogger::console(Level::Debug)), LevelFilter::Debug),
            3 => install(
                DiffLogger::with_file(Level::Debug, true, "debug.log"),
                LevelFilter::Debug,
            ),
            4..=u8::MAX => install(
                DiffLogger::with_file(Level::Trace, false, "trace.log"),
                LevelFilter::Trace,
            ),
        },
        LogConfig::NoLog => {}
    };
}
