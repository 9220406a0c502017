//! Logging via `log` + `log4rs`: console on stderr, optional rolling file.
//!
//! Filtering is whitelist-based: external crates are off unless opted in.
//! `filters` grammar: a bare level sets the engine level (`"debug"`), a
//! `module=level` entry opts a module in, `root=level` opens everything.

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::PathBuf;

const CONSOLE_APPENDER: &str = "stderr";
const FILE_APPENDER: &str = "log_file";
const LOG_FILE_NAME: &str = "crank.log";
const LOG_LINE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{h({l})}] {m}{n}";
const LOG_FILE_MAX_SIZE: u64 = 16 * 1024 * 1024;
const LOG_FILE_MAX_ROLLS: u32 = 8;
const ENGINE_CRATE: &str = "crank_core";

#[derive(Debug, Default)]
struct ParsedFilters {
    app_level: Option<LevelFilter>,
    root_level: Option<LevelFilter>,
    modules: Vec<(String, LevelFilter)>,
}

fn parse_filters(filters: &str) -> ParsedFilters {
    let mut parsed = ParsedFilters::default();
    for part in filters.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once('=') {
            None => {
                if parsed.app_level.is_none() {
                    parsed.app_level = part.parse().ok();
                }
            }
            Some((module, level)) => {
                let (module, level) = (module.trim(), level.trim());
                let Ok(level) = level.parse() else { continue };
                if module == "root" {
                    parsed.root_level = Some(level);
                } else if !module.is_empty() {
                    parsed.modules.push((module.to_string(), level));
                }
            }
        }
    }
    parsed
}

/// Initialize the global logger. Repeated calls are ignored.
pub fn init_logger(log_dir: Option<&str>, filters: &str) {
    let parsed = parse_filters(filters);
    let app_level = parsed.app_level.unwrap_or(LevelFilter::Info);
    let root_level = parsed.root_level.unwrap_or(LevelFilter::Off);

    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
        .build();
    let mut builder = Config::builder().appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(console)));
    let mut appenders = vec![CONSOLE_APPENDER.to_string()];

    if let Some(dir) = log_dir.map(str::trim).filter(|dir| !dir.is_empty()) {
        let log_path = PathBuf::from(dir).join(LOG_FILE_NAME);
        let archive = PathBuf::from(dir).join(format!("{LOG_FILE_NAME}.{{}}.gz"));
        let roller = FixedWindowRoller::builder()
            .base(1)
            .build(archive.to_str().unwrap_or("crank.log.{}.gz"), LOG_FILE_MAX_ROLLS);
        if let Ok(roller) = roller {
            let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(LOG_FILE_MAX_SIZE)), Box::new(roller));
            let file = RollingFileAppender::builder()
                .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
                .build(log_path, Box::new(policy));
            if let Ok(file) = file {
                builder = builder.appender(Appender::builder().build(FILE_APPENDER, Box::new(file)));
                appenders.push(FILE_APPENDER.to_string());
            }
        }
    }

    if !parsed.modules.iter().any(|(module, _)| module == ENGINE_CRATE) {
        builder = builder
            .logger(Logger::builder().appenders(appenders.clone()).additive(false).build(ENGINE_CRATE, app_level));
    }
    for (module, level) in &parsed.modules {
        builder =
            builder.logger(Logger::builder().appenders(appenders.clone()).additive(false).build(module, *level));
    }

    if let Ok(config) = builder.build(Root::builder().appenders(appenders).build(root_level)) {
        let _ = log4rs::init_config(config);
    }
}
