//! Optional JSON-lines debug log. Generation never depends on it; when a
//! logger is attached, skipped encodes and a per-document summary are
//! recorded for after-the-fact inspection.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

pub struct DebugLogger {
    inner: Mutex<DebugState>,
}

struct DebugState {
    writer: BufWriter<File>,
    counters: BTreeMap<String, u64>,
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Mutex::new(DebugState {
                writer: BufWriter::new(file),
                counters: BTreeMap::new(),
            }),
        })
    }

    /// Write one event line: `{"type":"<kind>","field":"value",...}`.
    pub fn log_event(&self, kind: &str, fields: &[(&str, &str)]) {
        let mut json = format!("{{\"type\":\"{}\"", json_escape(kind));
        for (key, value) in fields {
            json.push_str(&format!(
                ",\"{}\":\"{}\"",
                json_escape(key),
                json_escape(value)
            ));
        }
        json.push('}');
        if let Ok(mut state) = self.inner.lock() {
            let _ = writeln!(state.writer, "{json}");
        }
    }

    pub fn increment(&self, key: &str, amount: u64) {
        if let Ok(mut state) = self.inner.lock() {
            let entry = state.counters.entry(key.to_string()).or_insert(0);
            *entry = entry.saturating_add(amount);
        }
    }

    /// Emit accumulated counters as one summary line and reset them.
    pub fn emit_summary(&self, context: &str) {
        if let Ok(mut state) = self.inner.lock() {
            let counters = std::mem::take(&mut state.counters);
            let mut counts = String::from("{");
            for (idx, (key, value)) in counters.iter().enumerate() {
                if idx > 0 {
                    counts.push(',');
                }
                counts.push_str(&format!("\"{}\":{}", json_escape(key), value));
            }
            counts.push('}');
            let _ = writeln!(
                state.writer,
                "{{\"type\":\"debug.summary\",\"context\":\"{}\",\"counts\":{}}}",
                json_escape(context),
                counts
            );
        }
    }

    pub fn flush(&self) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = state.writer.flush();
        }
    }
}

fn json_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log_path(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("qrsheet_debug_{}_{}.log", name, std::process::id()));
        path
    }

    #[test]
    fn events_and_summary_are_json_lines() {
        let path = temp_log_path("events");
        let logger = DebugLogger::new(&path).unwrap();
        logger.log_event("encode.skip", &[("id", "x-1"), ("error", "data too long")]);
        logger.increment("encode.skipped", 1);
        logger.increment("encode.skipped", 2);
        logger.emit_summary("generate");
        logger.flush();

        let log = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"type\":\"encode.skip\""));
        assert!(lines[0].contains("\"id\":\"x-1\""));
        assert!(lines[1].contains("\"encode.skipped\":3"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn escapes_quotes_in_values() {
        let path = temp_log_path("escape");
        let logger = DebugLogger::new(&path).unwrap();
        logger.log_event("encode.skip", &[("error", "bad \"payload\"")]);
        logger.flush();
        let log = std::fs::read_to_string(&path).unwrap();
        assert!(log.contains("bad \\\"payload\\\""));
        let _ = std::fs::remove_file(path);
    }
}
