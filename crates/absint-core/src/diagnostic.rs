//! Error rendering using ariadne
//!
//! This module provides rich diagnostic output for parse errors, analysis
//! errors, and postcondition verdicts. Errors are converted to ariadne
//! Reports for display.

use ariadne::{Color, ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;

use crate::span::Span;

/// A diagnostic that can be rendered with ariadne
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The severity of this diagnostic
    pub severity: Severity,
    /// The main message
    pub message: String,
    /// The primary span (highlighted in red)
    pub span: Option<DiagnosticSpan>,
    /// Additional labels (notes, related locations)
    pub labels: Vec<DiagnosticLabel>,
    /// Help text shown at the bottom
    pub help: Option<String>,
    /// Note text shown at the bottom
    pub note: Option<String>,
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A span for diagnostic display
#[derive(Debug, Clone)]
pub struct DiagnosticSpan {
    /// Start byte offset
    pub start: usize,
    /// End byte offset
    pub end: usize,
    /// Optional label text
    pub label: Option<String>,
}

/// An additional label on a diagnostic
#[derive(Debug, Clone)]
pub struct DiagnosticLabel {
    /// Start byte offset
    pub start: usize,
    /// End byte offset
    pub end: usize,
    /// Label text
    pub text: String,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span: None,
            labels: Vec::new(),
            help: None,
            note: None,
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            span: None,
            labels: Vec::new(),
            help: None,
            note: None,
        }
    }

    /// Set the primary span
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(DiagnosticSpan {
            start: span.start as usize,
            end: span.end as usize,
            label: None,
        });
        self
    }

    /// Set the primary span with a label
    pub fn with_span_label(mut self, span: Span, label: impl Into<String>) -> Self {
        self.span = Some(DiagnosticSpan {
            start: span.start as usize,
            end: span.end as usize,
            label: Some(label.into()),
        });
        self
    }

    /// Add a secondary label
    pub fn with_label(mut self, span: Span, text: impl Into<String>) -> Self {
        self.labels.push(DiagnosticLabel {
            start: span.start as usize,
            end: span.end as usize,
            text: text.into(),
        });
        self
    }

    /// Add help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Render this diagnostic to a writer
    pub fn render(
        &self,
        file_path: &str,
        source: &str,
        writer: &mut impl Write,
    ) -> std::io::Result<()> {
        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Info => ReportKind::Advice,
        };

        let primary_offset = self.span.as_ref().map(|s| s.start).unwrap_or(0);

        let mut builder =
            Report::build(kind, file_path, primary_offset).with_message(&self.message);

        let mut colors = ColorGenerator::new();

        if let Some(ref span) = self.span {
            let label = Label::new((file_path, span.start..span.end))
                .with_color(Color::Red)
                .with_order(0);
            let label = if let Some(ref text) = span.label {
                label.with_message(text)
            } else {
                label
            };
            builder = builder.with_label(label);
        }

        for (i, lab) in self.labels.iter().enumerate() {
            builder = builder.with_label(
                Label::new((file_path, lab.start..lab.end))
                    .with_color(colors.next())
                    .with_message(&lab.text)
                    .with_order((i + 1) as i32),
            );
        }

        if let Some(ref help) = self.help {
            builder = builder.with_help(help);
        }

        if let Some(ref note) = self.note {
            builder = builder.with_note(note);
        }

        let report = builder.finish();
        report.write((file_path, Source::from(source)), writer)
    }

    /// Render this diagnostic to stderr
    pub fn eprint(&self, file_path: &str, source: &str) {
        let mut buf = Vec::new();
        let _ = self.render(file_path, source, &mut buf);
        let _ = std::io::stderr().write_all(&buf);
    }
}

/// Create a diagnostic from a parse error
pub fn parse_error_diagnostic(message: &str, span: Span) -> Diagnostic {
    Diagnostic::error(format!("syntax error: {}", message)).with_span_label(span, "here")
}

/// Create a diagnostic for a fatal analysis error
pub fn analysis_error_diagnostic(message: &str, span: Span) -> Diagnostic {
    Diagnostic::error(format!("analysis error: {}", message)).with_span_label(span, "here")
}

/// Create a diagnostic for a violated postcondition
pub fn violated_postcondition_diagnostic(condition: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(format!("postcondition violated: {}", condition))
        .with_span_label(span, "cannot be proven from the inferred intervals")
        .with_help("the interval analysis over-approximates; the assertion may still hold on some runs")
}
