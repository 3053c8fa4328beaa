use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which stage produced a recoverable diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// Input matched no token production.
    Scan,
    /// The parser expected a token that did not occur.
    Syntax,
    /// A well-formed literal has no valid interpretation.
    Semantic,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Scan => write!(f, "Scan"),
            DiagnosticKind::Syntax => write!(f, "Syntax"),
            DiagnosticKind::Semantic => write!(f, "Semantic"),
        }
    }
}

/// One entry of the error list accumulated during a parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub hint: Option<String>,
    pub code: u32,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        message: impl Into<String>,
        line: usize,
        column: usize,
        code: u32,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            column,
            hint: None,
            code,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[SKEMA] {} Error at {}:{}: {}{} Code: {}",
            self.kind,
            self.line,
            self.column,
            self.message,
            self.hint.as_ref().map_or(String::new(), |h| format!(" Hint: {}", h)),
            self.code
        )
    }
}

/// The main error type for SKEMA documents and schemas.
///
/// Recoverable problems found while parsing are collected as [`Diagnostic`]s
/// and only surface here, bundled, when a caller asks for a strict parse.
/// Every other variant is fatal for the operation that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkemaError {
    #[error("[SKEMA] Parse failed with {} error(s){}", .diagnostics.len(), first_diagnostic(.diagnostics))]
    Parse { diagnostics: Vec<Diagnostic> },

    #[error("[SKEMA] Cyclic definitions: {}", format_components(.components))]
    CyclicReference { components: Vec<Vec<String>> },

    #[error("[SKEMA] Definition '{name}' not found")]
    DefinitionNotFound { name: String },

    /// Raised when validation reaches a reference the resolver never touched.
    #[error("[SKEMA] Reference '#{name}' is unresolved")]
    UnresolvedReference { name: String },

    #[error("[SKEMA] Value contains itself")]
    SelfContainment,

    #[error("[SKEMA] Float value {value} cannot be written")]
    NonFiniteFloat { value: f64 },

    #[error("[SKEMA] Datetime {value} has a year outside 0000-9999 and cannot be written")]
    DatetimeOutOfRange { value: String },

    #[error("[SKEMA] Document root must be a map")]
    RootNotMap,

    #[error("[SKEMA] Path '{path}' not found")]
    PathNotFound { path: String },

    #[error("[SKEMA] Type Error at '{path}': expected {expected}, got {found}")]
    Type {
        path: String,
        expected: String,
        found: String,
    },

    #[error("[SKEMA] Validation Error at line {line}: {message}{}", .hint.as_ref().map_or(String::new(), |h| format!(" Hint: {}", h)))]
    Validation {
        message: String,
        line: usize,
        hint: Option<String>,
    },

    #[error("[SKEMA] File Error '{path}': {message}")]
    File { path: String, message: String },

    #[error("[SKEMA] Export Error: {message}")]
    Export { message: String },
}

impl SkemaError {
    /// Diagnostics carried by a failed strict parse, empty for other variants.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            SkemaError::Parse { diagnostics } => diagnostics,
            _ => &[],
        }
    }
}

fn first_diagnostic(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .first()
        .map_or(String::new(), |d| format!(", first: {}", d))
}

fn format_components(components: &[Vec<String>]) -> String {
    components
        .iter()
        .map(|c| format!("{{{}}}", c.join(", ")))
        .collect::<Vec<_>>()
        .join(" ")
}
