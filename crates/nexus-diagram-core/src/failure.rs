use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// The source was empty; the engine was never invoked.
    NoChartData,
    /// The engine's lexer rejected the input.
    SyntaxError,
    UnrecognizedToken,
    ParseError,
    Timeout,
    Unknown,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoChartData => "noChartData",
            Self::SyntaxError => "syntaxError",
            Self::UnrecognizedToken => "unrecognizedToken",
            Self::ParseError => "parseError",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed render, ready for presentation.
///
/// `source` is always the original, unmodified diagram text so the user can inspect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFailure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub source: String,
}

impl RenderFailure {
    pub fn no_chart_data(source: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::NoChartData,
            message: "No chart data provided".to_string(),
            detail: None,
            source: source.into(),
        }
    }

    pub fn timeout(source: impl Into<String>, after: std::time::Duration) -> Self {
        Self {
            kind: FailureKind::Timeout,
            message: format!("Diagram rendering timed out after {} ms", after.as_millis()),
            detail: None,
            source: source.into(),
        }
    }

    /// Classifies an engine failure message. `None` stands for a failure that carried no
    /// readable message at all.
    pub fn from_engine_message(message: Option<&str>, source: impl Into<String>) -> Self {
        let (kind, text) = classify_engine_message(message);
        Self {
            kind,
            message: text,
            detail: message.map(str::to_string),
            source: source.into(),
        }
    }

    /// Replaces the user-facing message, keeping the classification and engine detail.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl std::fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

/// Maps an engine error message to a failure kind and a user-facing message.
///
/// Triggers are checked in priority order: `Lexical error`, `Unrecognized`, `Parse error`.
pub fn classify_engine_message(message: Option<&str>) -> (FailureKind, String) {
    let Some(message) = message else {
        return (
            FailureKind::Unknown,
            "Failed to render diagram: Unknown error".to_string(),
        );
    };

    if message.contains("Lexical error") {
        (
            FailureKind::SyntaxError,
            "Syntax error in diagram: Invalid characters or structure detected".to_string(),
        )
    } else if message.contains("Unrecognized") {
        (
            FailureKind::UnrecognizedToken,
            "Diagram contains unrecognized syntax".to_string(),
        )
    } else if message.contains("Parse error") {
        (
            FailureKind::ParseError,
            "Failed to parse diagram: Check diagram structure".to_string(),
        )
    } else {
        (
            FailureKind::Unknown,
            format!("Failed to render diagram: {message}"),
        )
    }
}
