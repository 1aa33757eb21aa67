//! Diagnostics for schema validation.
//!
//! Issues are collected, never thrown. A run is invalid when at least one
//! Error-level issue was reported (or a schema declaration had to be removed
//! for failing validation, see the sanitizer).

use serde::Serialize;
use std::fmt;

use crate::ast::Span;

/// How bad an issue is.
///
/// - `Error` invalidates the run.
/// - `Warning` does not invalidate on its own; used for denied property
///   names and non-fatal cleanup failures.
/// - `Info` is available but unused by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// A single diagnostic tied to a source location.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub severity: Severity,
    /// 1-based line of the offending node.
    pub line: u32,
    /// 0-based column, if known.
    pub column: Option<u32>,
    pub message: String,
    /// ESTree-style kind of the offending node ("File" for file-level issues).
    pub node_kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Issue {
    /// Render as a single report block: severity, message, kind, location,
    /// plus the suggestion on its own line when present.
    pub fn format(&self) -> String {
        let mut out = format!(
            "{}: {} ({}) at {}:{}",
            self.severity,
            self.message,
            self.node_kind,
            self.line,
            self.column.unwrap_or(0)
        );
        if let Some(suggestion) = &self.suggestion {
            out.push_str(&format!("\n  suggestion: {}", suggestion));
        }
        out
    }
}

/// Byte-offset to line/column mapping for one source text.
///
/// Lines are 1-based, columns 0-based, matching what JS tooling prints.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line.
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Map a byte offset to `(line, column)`.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let col = offset - self.line_starts[line];
        ((line + 1) as u32, col as u32)
    }
}

/// Append-only issue collection for one validation run.
pub struct IssueReporter {
    issues: Vec<Issue>,
    index: LineIndex,
}

impl IssueReporter {
    pub fn new(source: &str) -> Self {
        Self {
            issues: Vec::new(),
            index: LineIndex::new(source),
        }
    }

    /// Report an issue located at `span`. `None` means file-level: the
    /// synthetic `(1, 0)` location is used.
    pub fn report(
        &mut self,
        span: Option<Span>,
        node_kind: &'static str,
        message: impl Into<String>,
        severity: Severity,
        suggestion: Option<String>,
    ) {
        let (line, column) = match span {
            Some(span) => {
                let (line, col) = self.index.line_col(span.start);
                (line, Some(col))
            }
            None => (1, Some(0)),
        };
        self.issues.push(Issue {
            severity,
            line,
            column,
            message: message.into(),
            node_kind,
            suggestion,
        });
    }

    pub fn error(&mut self, span: Option<Span>, node_kind: &'static str, message: impl Into<String>) {
        self.report(span, node_kind, message, Severity::Error, None);
    }

    pub fn error_with_suggestion(
        &mut self,
        span: Option<Span>,
        node_kind: &'static str,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.report(span, node_kind, message, Severity::Error, Some(suggestion.into()));
    }

    pub fn warning(&mut self, span: Option<Span>, node_kind: &'static str, message: impl Into<String>) {
        self.report(span, node_kind, message, Severity::Warning, None);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    pub fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn clear(&mut self) {
        self.issues.clear();
    }

    /// Human-readable multi-line rendering of every issue, in report order.
    pub fn formatted_report(&self) -> String {
        self.issues
            .iter()
            .map(Issue::format)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_index_maps_offsets() {
        let index = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.line_col(0), (1, 0));
        assert_eq!(index.line_col(1), (1, 1));
        assert_eq!(index.line_col(3), (2, 0));
        assert_eq!(index.line_col(6), (3, 0));
        assert_eq!(index.line_col(7), (4, 0));
    }

    #[test]
    fn file_level_issue_gets_synthetic_location() {
        let mut reporter = IssueReporter::new("const a = 1;");
        reporter.error(None, "File", "Missing 'z' import from 'zod'");

        let issue = &reporter.issues()[0];
        assert_eq!(issue.line, 1);
        assert_eq!(issue.column, Some(0));
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let mut reporter = IssueReporter::new("x");
        reporter.warning(None, "ObjectExpression", "Property name 'constructor' is not allowed");
        assert!(!reporter.has_errors());

        reporter.error(None, "CallExpression", "Method not allowed in chain: parse");
        assert!(reporter.has_errors());
        assert_eq!(reporter.by_severity(Severity::Warning).count(), 1);
        assert_eq!(reporter.by_severity(Severity::Error).count(), 1);
    }

    #[test]
    fn formatted_report_includes_suggestion() {
        let mut reporter = IssueReporter::new("z.foo()");
        reporter.error_with_suggestion(
            None,
            "CallExpression",
            "Method not allowed in chain: foo",
            "Use only allowed Zod methods",
        );

        let report = reporter.formatted_report();
        assert!(report.contains("ERROR: Method not allowed in chain: foo"));
        assert!(report.contains("suggestion: Use only allowed Zod methods"));
    }

    #[test]
    fn clear_resets_collection() {
        let mut reporter = IssueReporter::new("x");
        reporter.error(None, "File", "boom");
        reporter.clear();
        assert!(reporter.issues().is_empty());
        assert!(!reporter.has_errors());
    }
}
