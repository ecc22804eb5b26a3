// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing::subscriber::set_global_default;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

pub const LOG_FILE: &str = "system.log";
pub const AUDIT_TARGET: &str = "tesoreria::audit";
pub const UNSERIALIZABLE: &str = "[unserializable]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
    Action,
    Db,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
            LogLevel::Action => "ACTION",
            LogLevel::Db => "DB",
        }
    }
}

/// Serialize audit payloads; never fails.
pub fn render_data<T: Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string(data).unwrap_or_else(|_| UNSERIALIZABLE.to_string())
}

/// Append an entry to the audit trail.
pub fn log_system(level: LogLevel, message: &str) {
    emit(level, message, None);
}

/// Append an entry with structured data to the audit trail.
pub fn log_system_with<T: Serialize + ?Sized>(level: LogLevel, message: &str, data: &T) {
    let payload = render_data(data);
    emit(level, message, Some(&payload));
}

fn emit(level: LogLevel, message: &str, data: Option<&str>) {
    let kind = level.as_str();
    match (level, data) {
        (LogLevel::Error, Some(d)) => {
            tracing::error!(target: AUDIT_TARGET, kind, data = d, "{message}")
        }
        (LogLevel::Error, None) => tracing::error!(target: AUDIT_TARGET, kind, "{message}"),
        (_, Some(d)) => tracing::info!(target: AUDIT_TARGET, kind, data = d, "{message}"),
        (_, None) => tracing::info!(target: AUDIT_TARGET, kind, "{message}"),
    }
}

pub fn open_log_file(data_dir: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE))
}

pub fn get_subscriber(env_filter: &str, log_file: Option<File>) -> impl Subscriber + Sync + Send {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));
    let stderr = fmt::Layer::new()
        .with_writer(std::io::stderr)
        .with_target(false);
    let file = log_file.map(|f| {
        fmt::Layer::new()
            .with_writer(Mutex::new(f))
            .with_ansi(false)
    });
    Registry::default().with(env_filter).with(stderr).with(file)
}

/// Register a subscriber as global default.
///
/// It should only be called once!
pub fn init_subscriber(subscriber: impl Subscriber + Sync + Send) -> anyhow::Result<()> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serializer;

    struct Broken;

    impl Serialize for Broken {
        fn serialize<S: Serializer>(&self, _s: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("nope"))
        }
    }

    #[test]
    fn unserializable_data_becomes_placeholder() {
        assert_eq!(render_data(&Broken), UNSERIALIZABLE);
        assert_eq!(render_data(&[1, 2]), "[1,2]");
        log_system_with(LogLevel::Action, "still logs", &Broken);
    }
}
