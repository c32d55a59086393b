// src/hook/log_line.rs

//! Parsing and classification of dbt's JSON log lines.
//!
//! With `--log-format json`, dbt emits one JSON object per line of the form
//!
//! ```json
//! {"info": {"level": "info", "msg": "..."},
//!  "data": {"conn_name": "...", "node_info": {"node_path": "..."}, "sql": "..."}}
//! ```
//!
//! This module treats that schema as a fixed external wire format: every
//! field is optional and defaults to empty, so schema drift degrades to
//! empty strings instead of parse failures. Anything that is not valid JSON
//! at all is classified as unstructured output.
//!
//! Classification here is pure; the runner decides what to do with the
//! result (it forwards messages to the matching `tracing` macro).

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

/// One dbt log line as found on the wire. Every field tolerates absence.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogLine {
    #[serde(default)]
    pub info: LogInfo,

    #[serde(default)]
    pub data: LogData,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogInfo {
    #[serde(default)]
    pub level: String,

    #[serde(default)]
    pub msg: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogData {
    #[serde(default)]
    pub conn_name: String,

    #[serde(default)]
    pub node_info: Option<NodeInfo>,

    #[serde(default)]
    pub sql: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NodeInfo {
    #[serde(default)]
    pub node_path: String,
}

/// Log level declared by dbt, mapped onto the sinks the runner relays to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RelayLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl RelayLevel {
    /// Map dbt's level string onto a relay level.
    ///
    /// Unknown levels yield `None`; the runner drops those messages, as the
    /// original wrapper did.
    pub fn from_dbt_level(level: &str) -> Option<Self> {
        match level {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// A fully classified output line, ready for relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// A JSON log line. `level` is `None` for unrecognized level strings.
    Structured {
        level: Option<RelayLevel>,
        message: String,
        conn_name: String,
        node_path: String,
        sql: String,
    },

    /// A line that was not valid JSON; relayed verbatim at error level.
    Unstructured(String),
}

/// Classify one line of combined subprocess output.
///
/// The message has ANSI escape sequences stripped; when the JSON object
/// carries no `info.msg`, the raw line stands in for it.
pub fn classify(line: &str) -> Classified {
    let parsed: LogLine = match serde_json::from_str(line) {
        Ok(parsed) => parsed,
        Err(_) => return Classified::Unstructured(line.to_string()),
    };

    let message = parsed.info.msg.unwrap_or_else(|| line.to_string());

    Classified::Structured {
        level: RelayLevel::from_dbt_level(&parsed.info.level),
        message: strip_ansi_escape_codes(&message),
        conn_name: parsed.data.conn_name,
        node_path: parsed
            .data
            .node_info
            .map(|n| n.node_path)
            .unwrap_or_default(),
        sql: parsed.data.sql,
    }
}

static ANSI_ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B[@-_][0-?]*[ -/]*[@-~]").unwrap());

/// Remove ANSI escape sequences (colors, cursor movement) from a message.
pub fn strip_ansi_escape_codes(text: &str) -> String {
    ANSI_ESCAPE_RE.replace_all(text, "").into_owned()
}
