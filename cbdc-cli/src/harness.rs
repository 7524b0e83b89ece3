// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Console reporting of scenario checks.
//!
//! Output mirrors the transcript the network's operators are used to: a blue
//! `[TEST]` line per scenario followed by one indented verdict line per check.
//! Failed checks never stop the run; they are recorded and summarised at the
//! end.

use crossterm::style::Stylize;
use serde_json::Value;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScenarioOutcome {
    Passed,
    Failed,
    Skipped(String),
    Errored(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioReport {
    pub description: String,
    pub outcome: ScenarioOutcome,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SuiteSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl SuiteSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.skipped == 0 && self.errored == 0
    }
}

impl fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped, {} errored",
            self.passed, self.failed, self.skipped, self.errored
        )
    }
}

// Scenario currently between `report_start` and `finish_scenario`.
struct OpenScenario {
    description: String,
    failures: usize,
}

pub struct Harness {
    out: Box<dyn Write + Send>,
    current: Option<OpenScenario>,
    reports: Vec<ScenarioReport>,
}

impl Harness {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            current: None,
            reports: vec![],
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn report_start(&mut self, description: &str) {
        self.close_open_scenario();
        self.line(format!("{} {}", "[TEST]".blue(), description));
        self.current = Some(OpenScenario {
            description: description.to_string(),
            failures: 0,
        });
    }

    /// Compare `actual` with `expected` exactly, types included, so the
    /// string `"1000"` and the number `1000` differ.
    pub fn evaluate(&mut self, actual: &Value, expected: &Value) -> Verdict {
        if actual == expected {
            self.line(format!("    {}", "--> test passed".green()));
            Verdict::Passed
        } else {
            let mismatch = format!(
                "--> Result is not expectation: {} != {}",
                display_value(actual),
                display_value(expected)
            );
            self.line(format!("    {}", mismatch.red()));
            self.record_failure();
            Verdict::Failed
        }
    }

    // A check that could not be carried out at all.
    pub fn fail(&mut self, reason: &str) {
        self.line(format!("    {}", format!("--> {}", reason).red()));
        self.record_failure();
    }

    pub fn skip(&mut self, description: &str, reason: &str) {
        self.close_open_scenario();
        self.line(format!(
            "{} {} ({})",
            "[SKIP]".yellow(),
            description,
            reason
        ));
        self.reports.push(ScenarioReport {
            description: description.to_string(),
            outcome: ScenarioOutcome::Skipped(reason.to_string()),
        });
    }

    // The open scenario was aborted by an error.
    pub fn error(&mut self, error: &anyhow::Error) {
        let message = format!("{:#}", error);
        self.line(format!("    {}", format!("--> aborted: {}", message).red()));
        if let Some(open) = self.current.take() {
            self.reports.push(ScenarioReport {
                description: open.description,
                outcome: ScenarioOutcome::Errored(message),
            });
        }
    }

    /// Close the open scenario and return its outcome. Without an open
    /// scenario there is nothing to judge and `Passed` is returned.
    pub fn finish_scenario(&mut self) -> ScenarioOutcome {
        self.close_open_scenario()
            .unwrap_or(ScenarioOutcome::Passed)
    }

    pub fn reports(&self) -> &[ScenarioReport] {
        &self.reports
    }

    pub fn summary(&self) -> SuiteSummary {
        let mut summary = SuiteSummary::default();
        for report in &self.reports {
            match report.outcome {
                ScenarioOutcome::Passed => summary.passed += 1,
                ScenarioOutcome::Failed => summary.failed += 1,
                ScenarioOutcome::Skipped(_) => summary.skipped += 1,
                ScenarioOutcome::Errored(_) => summary.errored += 1,
            }
        }
        summary
    }

    pub fn print_summary(&mut self) -> SuiteSummary {
        self.close_open_scenario();
        let summary = self.summary();
        let line = format!("[SUMMARY] {}", summary);
        if summary.is_clean() {
            self.line(line.green().to_string());
        } else {
            self.line(line.red().to_string());
        }
        summary
    }

    fn record_failure(&mut self) {
        self.line(format!("    {}", "--> test failed".red()));
        if let Some(open) = self.current.as_mut() {
            open.failures += 1;
        }
    }

    fn close_open_scenario(&mut self) -> Option<ScenarioOutcome> {
        let open = self.current.take()?;
        let outcome = if open.failures == 0 {
            ScenarioOutcome::Passed
        } else {
            ScenarioOutcome::Failed
        };
        self.reports.push(ScenarioReport {
            description: open.description,
            outcome: outcome.clone(),
        });
        Some(outcome)
    }

    // The transcript is best effort, a closed stdout must not abort a run.
    fn line(&mut self, line: String) {
        let _ = writeln!(self.out, "{}", line);
    }
}

// Strings print bare, like the values they stand for.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A cloneable in-memory sink, for inspecting a transcript.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.0.lock() {
            Ok(mut inner) => inner.write(buf),
            Err(_) => Err(std::io::Error::other("transcript buffer poisoned")),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn harness() -> (Harness, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Harness::new(Box::new(buffer.clone())), buffer)
    }

    #[test]
    fn test_evaluate_equal_values_pass() {
        let (mut harness, buffer) = harness();
        harness.report_start("Get initial supply");
        for value in [json!("1000"), json!(true), json!(null), json!(["a", 1])] {
            assert_eq!(harness.evaluate(&value, &value), Verdict::Passed);
        }
        assert_eq!(harness.finish_scenario(), ScenarioOutcome::Passed);

        let transcript = buffer.contents();
        assert!(transcript.contains("[TEST]"));
        assert!(transcript.contains("Get initial supply"));
        assert_eq!(transcript.matches("--> test passed").count(), 4);
        assert!(!transcript.contains("test failed"));
    }

    #[test]
    fn test_evaluate_is_type_aware() {
        let (mut harness, buffer) = harness();
        harness.report_start("Mint new coins");
        assert_eq!(harness.evaluate(&json!("1000"), &json!(1000)), Verdict::Failed);
        assert_eq!(harness.evaluate(&json!("1000"), &json!("1100")), Verdict::Failed);
        assert_eq!(harness.finish_scenario(), ScenarioOutcome::Failed);

        let transcript = buffer.contents();
        assert!(transcript.contains("Result is not expectation: 1000 != 1100"));
        assert_eq!(transcript.matches("--> test failed").count(), 2);
    }

    #[test]
    fn test_summary_counts_every_outcome() {
        let (mut harness, buffer) = harness();
        harness.report_start("passes");
        harness.evaluate(&json!(1), &json!(1));
        harness.report_start("fails");
        harness.fail("no CoinCreation event in receipt");
        harness.skip("skipped", "prerequisite `mint` did not pass");
        harness.report_start("errors");
        harness.error(&anyhow::anyhow!("connection refused"));

        let summary = harness.print_summary();
        assert_eq!(
            summary,
            SuiteSummary {
                passed: 1,
                failed: 1,
                skipped: 1,
                errored: 1
            }
        );
        assert!(!summary.is_clean());
        assert_eq!(harness.reports().len(), 4);
        assert_eq!(harness.reports()[1].outcome, ScenarioOutcome::Failed);

        let transcript = buffer.contents();
        assert!(transcript.contains("[SKIP]"));
        assert!(transcript.contains("aborted: connection refused"));
        assert!(transcript.contains("1 passed, 1 failed, 1 skipped, 1 errored"));
    }
}
