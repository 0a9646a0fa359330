use std::sync::OnceLock;

use crate::logging::init_log;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_config: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogConfig {
    /// `-v` count from the command line
    Verbose(u8),
    Trace,
    NoLog,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn init_config(config: Config) {
    CONFIG.set(config).unwrap_or_else(|_| {
        panic!("cannot init config again after init");
    });
    init_log(&get_config().log_config);
}

pub fn get_config() -> &'static Config {
    CONFIG.get().expect("cannot get config before init")
}

/// Initializes the process config once and ignores later calls, so every test
/// in the binary can ask for logging without racing on `init_config`.
#[cfg(test)]
pub fn with_test_config<F: FnOnce()>(config: Config, f: F) {
    let mut fresh = false;
    CONFIG.get_or_init(|| {
        fresh = true;
        config
    });
    if fresh {
        init_log(&get_config().log_config);
    }
    f()
}
