//! Recoverable issues found while annotating one diagram.
//!
//! Fatal problems (a malformed transform, an unreadable raster) abort the
//! diagram with a [`FlowlabelError`](crate::FlowlabelError). Everything else
//! lands here so the caller can log it and still keep the record.

use std::fmt;

use serde::Serialize;

/// Issues collected while annotating a diagram.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AnnotationReport {
    pub issues: Vec<AnnotationIssue>,
}

impl AnnotationReport {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn add(&mut self, issue: AnnotationIssue) {
        self.issues.push(issue);
    }

    /// Returns the number of warnings in the report.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns how many issues carry `code`.
    pub fn count(&self, code: IssueCode) -> usize {
        self.issues.iter().filter(|i| i.code == code).count()
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for AnnotationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Annotation completed: no issues found");
        }

        writeln!(
            f,
            "Annotation completed with {} warning(s):",
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single non-fatal annotation issue.
#[derive(Clone, Debug, Serialize)]
pub struct AnnotationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    pub context: IssueContext,
}

impl AnnotationIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }

    pub fn info(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Info, code, message, context)
    }
}

impl fmt::Display for AnnotationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "WARN ",
            Severity::Info => "INFO ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Informational; the output is complete.
    Info,
    /// Something was skipped or defaulted.
    Warning,
}

/// A stable code identifying the type of annotation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCode {
    /// A node is drawn with a primitive other than polygon, circle or rect;
    /// the node was skipped.
    UnsupportedShape,
    /// A node label had no text; the node box has no key.
    MissingLabelText,
    /// The node classifier had no class for a node; the default was used.
    UnclassifiedNode,
    /// An edge label placeholder without text was skipped.
    EmptyEdgeLabel,
}

/// Where in the SVG an issue occurred.
#[derive(Clone, Debug, Serialize)]
pub enum IssueContext {
    /// The diagram as a whole.
    Diagram,
    /// The n-th member of the nodes group, with its `id` when present.
    Node { index: usize, id: Option<String> },
    /// The n-th member of the edge labels group.
    EdgeLabel { index: usize },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Diagram => write!(f, "diagram"),
            IssueContext::Node { index, id: Some(id) } => write!(f, "node {} ({})", index, id),
            IssueContext::Node { index, id: None } => write!(f, "node {}", index),
            IssueContext::EdgeLabel { index } => write!(f, "edge label {}", index),
        }
    }
}
