//! Smoke-test log interpretation
//!
//! Scans a line-oriented test log and derives four fields:
//! - unit test status: a `go test` summary line for the go-smoke package
//! - quality gate verdict: count of lines starting with "✅"
//! - smoke test status: any line starting with "✓"
//! - endpoint: the last line starting with "http"
//!
//! Every line is checked against all four rules; they are not exclusive.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use crate::error::InterpretError;

/// Quality gate passes only when strictly more marker lines than this are seen
pub const GATE_THRESHOLD: usize = 5;

const UNIT_TEST_MARKER: &str = "ok  \tgo-smoke";
const GATE_MARKER: &str = "✅";
const SMOKE_TEST_MARKER: &str = "✓";
const ENDPOINT_PREFIX: &str = "http";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityGate {
    Pass,
    Fail,
}

impl QualityGate {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityGate::Pass => "PASS",
            QualityGate::Fail => "FAIL",
        }
    }

    pub fn from_marker_count(count: usize) -> Self {
        if count > GATE_THRESHOLD {
            QualityGate::Pass
        } else {
            QualityGate::Fail
        }
    }
}

/// Result of interpreting one artifact. Built fresh per request, never cached.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ParsedReport {
    pub unit_test_ok: bool,
    pub quality_gate: QualityGate,
    pub gate_markers: usize,
    pub smoke_test_ok: bool,
    pub endpoint: Option<String>,
}

impl ParsedReport {
    /// "Ok" once the unit test marker was seen, otherwise empty
    pub fn unit_test_status(&self) -> &'static str {
        if self.unit_test_ok { "Ok" } else { "" }
    }

    /// "OK" once a smoke test line was seen, otherwise empty
    pub fn smoke_test_status(&self) -> &'static str {
        if self.smoke_test_ok { "OK" } else { "" }
    }

    pub fn quality_gate(&self) -> &'static str {
        self.quality_gate.as_str()
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or("")
    }
}

/// Running state of a single scan.
#[derive(Debug, Default)]
struct LineClassifier {
    unit_test_ok: bool,
    gate_markers: usize,
    smoke_test_ok: bool,
    endpoint: Option<String>,
}

impl LineClassifier {
    fn observe(&mut self, line: &str) {
        if line.contains(UNIT_TEST_MARKER) {
            self.unit_test_ok = true;
        }
        if line.starts_with(GATE_MARKER) {
            self.gate_markers += 1;
        }
        if line.starts_with(SMOKE_TEST_MARKER) {
            self.smoke_test_ok = true;
        }
        // Last endpoint wins
        if line.starts_with(ENDPOINT_PREFIX) {
            self.endpoint = Some(line.to_string());
        }
    }

    fn finish(self) -> ParsedReport {
        ParsedReport {
            unit_test_ok: self.unit_test_ok,
            quality_gate: QualityGate::from_marker_count(self.gate_markers),
            gate_markers: self.gate_markers,
            smoke_test_ok: self.smoke_test_ok,
            endpoint: self.endpoint,
        }
    }
}

/// Open and interpret the artifact at `path`.
pub fn interpret_file<P: AsRef<Path>>(path: P) -> Result<ParsedReport, InterpretError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| InterpretError::unavailable(path, e))?;
    interpret_reader(BufReader::new(file))
}

/// Interpret any line source. Invalid UTF-8 is decoded lossily rather than
/// rejected; a read failure aborts the whole scan.
pub fn interpret_reader<R: BufRead>(mut reader: R) -> Result<ParsedReport, InterpretError> {
    let mut classifier = LineClassifier::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).map_err(InterpretError::unreadable)?;
        if n == 0 {
            break;
        }
        let line = strip_line_ending(&buf);
        classifier.observe(&String::from_utf8_lossy(line));
    }

    Ok(classifier.finish())
}

fn strip_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
