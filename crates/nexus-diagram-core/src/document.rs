//! Diagram fields carried by document and documentation-generation payloads.
//!
//! The backend is inconsistent about casing (`erDiagram` on stored documents, `er_diagram` on
//! generation responses), so both spellings are accepted. Nothing here checks that a diagram is
//! renderable; an empty or missing field is reported as `None`.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramField {
    EntityRelationship,
    UseCase,
}

impl DiagramField {
    pub fn keys(self) -> [&'static str; 2] {
        match self {
            Self::EntityRelationship => ["erDiagram", "er_diagram"],
            Self::UseCase => ["useCaseDiagram", "use_case_diagram"],
        }
    }
}

impl std::str::FromStr for DiagramField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "er" | "erDiagram" | "er_diagram" => Ok(Self::EntityRelationship),
            "use-case" | "usecase" | "useCaseDiagram" | "use_case_diagram" => Ok(Self::UseCase),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentDiagrams {
    pub er_diagram: Option<String>,
    pub use_case_diagram: Option<String>,
}

impl DocumentDiagrams {
    pub fn from_value(payload: &Value) -> Self {
        Self {
            er_diagram: field(payload, DiagramField::EntityRelationship),
            use_case_diagram: field(payload, DiagramField::UseCase),
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&value))
    }

    pub fn get(&self, field: DiagramField) -> Option<&str> {
        match field {
            DiagramField::EntityRelationship => self.er_diagram.as_deref(),
            DiagramField::UseCase => self.use_case_diagram.as_deref(),
        }
    }

    /// A missing field counts as an issue.
    pub fn has_known_issues(&self, field: DiagramField) -> bool {
        self.get(field).is_none_or(diagram_has_known_issues)
    }
}

/// Fragments generators leave behind in ER output that the engine rejects.
const KNOWN_ISSUE_MARKERS: [&str; 2] = ["[pk]", "-----------------------^"];

/// Whether `diagram` is empty or carries generator artifacts known to break rendering.
///
/// Advisory only: normalization repairs both artifacts, so a flagged diagram may still render.
pub fn diagram_has_known_issues(diagram: &str) -> bool {
    diagram.trim().is_empty()
        || KNOWN_ISSUE_MARKERS
            .iter()
            .any(|marker| diagram.contains(marker))
}

fn field(payload: &Value, field: DiagramField) -> Option<String> {
    let obj = payload.as_object()?;
    field
        .keys()
        .iter()
        .filter_map(|key| obj.get(*key)?.as_str())
        .map(strip_code_fence)
        .find(|text| !text.trim().is_empty())
        .map(str::to_string)
}

/// Removes a surrounding Markdown code fence (```` ```mermaid ... ``` ````), if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return text;
    };
    let body = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => return text,
    };
    body.strip_suffix("```").unwrap_or(body).trim_end()
}
