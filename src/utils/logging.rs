//! Logging for the client and the `cpo` CLI.
//!
//! The configured level applies to this crate only; HTTP internals (`reqwest`,
//! `hyper`) stay at `warn` unless `CPO_LOG` says otherwise.

use crate::config::ClientConfig;
use chrono::Local;
use env_logger::{Builder, Env, Target};
use log::{Level, LevelFilter};
use std::io::Write;

const CRATE_TARGET: &str = "cpoclient";

/// Filter used when `CPO_LOG` is unset: `level` for the client, `warn` elsewhere.
pub fn default_filter(level: &str) -> String {
    let level = level.trim();
    let level = if level.is_empty() { "info" } else { level };
    format!("warn,{}={},cpo={}", CRATE_TARGET, level, level)
}

/// Log target without the crate prefix, e.g. `jobs` for `cpoclient::jobs`.
fn short_target(target: &str) -> &str {
    target
        .strip_prefix(CRATE_TARGET)
        .map(|rest| rest.trim_start_matches("::"))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(target)
}

fn level_color(level: Level) -> &'static str {
    match level {
        | Level::Error => "\x1b[31m",
        | Level::Warn => "\x1b[33m",
        | Level::Info => "\x1b[32m",
        | Level::Debug => "\x1b[36m",
        | Level::Trace => "\x1b[35m",
    }
}

/// Installs the logger at `level`; later calls are no-ops.
pub fn init_logging(level: &str) {
    let env = Env::default()
        .filter_or("CPO_LOG", default_filter(level))
        .write_style_or("CPO_LOG_STYLE", "auto");

    Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {}{:5}\x1b[0m [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                level_color(record.level()),
                record.level(),
                short_target(record.target()),
                record.args()
            )
        })
        .target(Target::Stderr)
        .try_init()
        .ok();
}

/// Installs the logger at the level named in `config`.
pub fn init_from_config(config: &ClientConfig) {
    init_logging(&config.log_level);
    log::debug!(
        "cpo endpoint {}, cai endpoint {}, polling every {}s up to {} times",
        config.cpo_url,
        config.cai_url,
        config.poll.interval_secs,
        config.poll.max_attempts
    );
}

/// Captured debug logging for tests.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).filter_level(LevelFilter::Debug).try_init();
}
