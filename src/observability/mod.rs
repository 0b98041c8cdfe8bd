use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::{Duration, SystemTime};

#[derive(Serialize, Deserialize, Clone)]
struct ErrorEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    timestamp: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone)]
struct MessageEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    timestamp: String,
    message: String,
    level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone)]
struct PerformanceEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    timestamp: String,
    operation: String,
    duration_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<HashMap<String, String>>,
}

#[derive(Clone)]
enum LogEnvelope {
    Error(ErrorEnvelope),
    Performance(PerformanceEnvelope),
    Message(MessageEnvelope),
}

impl LogEnvelope {
    fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            LogEnvelope::Error(e) => serde_json::to_value(e).ok(),
            LogEnvelope::Performance(p) => serde_json::to_value(p).ok(),
            LogEnvelope::Message(m) => serde_json::to_value(m).ok(),
        }
    }
}

/// Events are held in memory until the repository (and so the log
/// directory) is known.
const MAX_BUFFERED_EVENTS: usize = 1_000;

/// Per-process log files kept in a repository's log directory.
const MAX_LOG_FILES: usize = 50;

enum LogMode {
    Buffered(Vec<LogEnvelope>),
    Disk(PathBuf),
}

struct ObservabilityInner {
    mode: LogMode,
}

static OBSERVABILITY: OnceLock<Mutex<ObservabilityInner>> = OnceLock::new();

fn get_observability() -> MutexGuard<'static, ObservabilityInner> {
    let lock = OBSERVABILITY.get_or_init(|| {
        Mutex::new(ObservabilityInner {
            mode: LogMode::Buffered(Vec::new()),
        })
    });
    // A panic while logging must not disable logging for the rest of the process.
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Set the repository context and flush buffered events to disk.
/// Should be called once the Repository is available.
pub fn set_repo_context(repo: &crate::git::repository::Repository) {
    if fs::create_dir_all(&repo.storage.logs).is_err() {
        return;
    }
    // Leave room for this process's own file.
    prune_log_files(&repo.storage.logs, MAX_LOG_FILES - 1);
    let log_path = repo
        .storage
        .logs
        .join(format!("{}.log", std::process::id()));

    let mut obs = get_observability();

    let buffered_events = match &mut obs.mode {
        LogMode::Buffered(events) => std::mem::take(events),
        LogMode::Disk(_) => return,
    };

    obs.mode = LogMode::Disk(log_path.clone());
    drop(obs); // Release lock before writing

    if !buffered_events.is_empty() {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
            for envelope in buffered_events {
                if let Some(json) = envelope.to_json() {
                    let _ = writeln!(file, "{}", json);
                }
            }
        }
    }
}

/// Delete the oldest `*.log` files in `dir` until at most `keep` remain.
fn prune_log_files(dir: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut logs: Vec<(SystemTime, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "log"))
        .map(|path| {
            let modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .collect();

    if logs.len() <= keep {
        return;
    }
    logs.sort();
    let excess = logs.len() - keep;
    for (_, path) in logs.into_iter().take(excess) {
        let _ = fs::remove_file(path);
    }
}

/// Append an envelope (buffer if no repo context, write to disk if context set)
fn append_envelope(envelope: LogEnvelope) {
    let mut obs = get_observability();

    match &mut obs.mode {
        LogMode::Buffered(buffer) => {
            if buffer.len() < MAX_BUFFERED_EVENTS {
                buffer.push(envelope);
            }
        }
        LogMode::Disk(log_path) => {
            let log_path = log_path.clone();
            drop(obs); // Release lock before file I/O

            if let Some(json) = envelope.to_json() {
                if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
                    let _ = writeln!(file, "{}", json);
                }
            }
        }
    }
}

pub fn log_error(error: &dyn std::error::Error, context: Option<serde_json::Value>) {
    let envelope = ErrorEnvelope {
        event_type: "error".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        message: error.to_string(),
        context,
    };

    append_envelope(LogEnvelope::Error(envelope));
}

pub fn log_performance(
    operation: &str,
    duration: Duration,
    context: Option<serde_json::Value>,
    tags: Option<HashMap<String, String>>,
) {
    let envelope = PerformanceEnvelope {
        event_type: "performance".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        operation: operation.to_string(),
        duration_ms: duration.as_millis(),
        context,
        tags,
    };

    append_envelope(LogEnvelope::Performance(envelope));
}

/// Log a message (info, warning, etc.)
pub fn log_message(message: &str, level: &str, context: Option<serde_json::Value>) {
    let envelope = MessageEnvelope {
        event_type: "message".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        message: message.to_string(),
        level: level.to_string(),
        context,
    };

    append_envelope(LogEnvelope::Message(envelope));
}
