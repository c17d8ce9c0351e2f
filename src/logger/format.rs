//! Access log lines
//!
//! `logging.access_log_format` names a layout (`combined`, `common`, `json`) or holds a
//! pattern of `$variables` expanded per request.

use chrono::{DateTime, Local};
use std::borrow::Cow;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Layout selected by the configured format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLogFormat<'a> {
    Combined,
    Common,
    Json,
    Pattern(&'a str),
}

impl<'a> AccessLogFormat<'a> {
    pub fn parse(format: &'a str) -> Self {
        match format {
            "combined" => Self::Combined,
            "common" => Self::Common,
            "json" => Self::Json,
            pattern => Self::Pattern(pattern),
        }
    }
}

/// One served request, as seen by the access log
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    pub time: DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Without the leading `?`
    pub query: Option<String>,
    pub http_version: String,
    pub status: u16,
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub request_time_us: u64,
    /// Object route kind, or `static-fallback`; `None` for early rejections
    pub route_kind: Option<&'static str>,
}

impl AccessLogEntry {
    /// Entry stamped with the current local time
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
            route_kind: None,
        }
    }

    pub fn format(&self, format: &str) -> String {
        match AccessLogFormat::parse(format) {
            AccessLogFormat::Common => self.clf_line(),
            AccessLogFormat::Combined => format!(
                "{} \"{}\" \"{}\"",
                self.clf_line(),
                dash(self.referer.as_deref()),
                dash(self.user_agent.as_deref()),
            ),
            AccessLogFormat::Json => self.json_line(),
            AccessLogFormat::Pattern(pattern) => self.expand(pattern),
        }
    }

    fn request_uri(&self) -> Cow<'_, str> {
        match &self.query {
            Some(query) => Cow::Owned(format!("{}?{query}", self.path)),
            None => Cow::Borrowed(&self.path),
        }
    }

    fn request_line(&self) -> String {
        format!(
            "{} {} HTTP/{}",
            self.method,
            self.request_uri(),
            self.http_version
        )
    }

    fn clf_line(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    fn json_line(&self) -> String {
        serde_json::json!({
            "time": self.time.to_rfc3339(),
            "remote_addr": self.remote_addr,
            "request": self.request_line(),
            "status": self.status,
            "body_bytes": self.body_bytes,
            "request_time_us": self.request_time_us,
            "route_kind": self.route_kind,
            "referer": self.referer,
            "user_agent": self.user_agent,
        })
        .to_string()
    }

    /// Value of one `$variable`, `None` when the name is unknown
    fn variable(&self, name: &str) -> Option<Cow<'_, str>> {
        let value = match name {
            "remote_addr" => Cow::Borrowed(self.remote_addr.as_str()),
            "time_local" => Cow::Owned(self.time.format(CLF_TIME).to_string()),
            "time_iso8601" => Cow::Owned(self.time.to_rfc3339()),
            "request" => Cow::Owned(self.request_line()),
            "request_method" => Cow::Borrowed(self.method.as_str()),
            "request_uri" => self.request_uri(),
            "status" => Cow::Owned(self.status.to_string()),
            "body_bytes_sent" => Cow::Owned(self.body_bytes.to_string()),
            "http_referer" => Cow::Borrowed(dash(self.referer.as_deref())),
            "http_user_agent" => Cow::Borrowed(dash(self.user_agent.as_deref())),
            // Seconds with millisecond precision
            "request_time" => Cow::Owned(format!(
                "{}.{:03}",
                self.request_time_us / 1_000_000,
                self.request_time_us % 1_000_000 / 1_000
            )),
            "route_kind" => Cow::Borrowed(self.route_kind.unwrap_or("-")),
            _ => return None,
        };
        Some(value)
    }

    /// Single left-to-right pass; a variable name is the longest `[a-z0-9_]` run after `$`
    fn expand(&self, pattern: &str) -> String {
        let mut out = String::with_capacity(pattern.len() + 64);
        let mut rest = pattern;

        while let Some(dollar) = rest.find('$') {
            out.push_str(&rest[..dollar]);
            let after = &rest[dollar + 1..];
            let name_len = after
                .find(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..name_len];

            match self.variable(name) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            }
            rest = &after[name_len..];
        }

        out.push_str(rest);
        out
    }
}

fn dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
