use crate::document::strip_code_fence;
use crate::*;
use serde_json::json;

#[test]
fn reads_camel_case_document_fields() {
    let doc = DocumentDiagrams::from_value(&json!({
        "title": "Checkout design",
        "erDiagram": "erDiagram\nA ||--o{ B : has",
        "useCaseDiagram": "graph TD\nUser --> Login"
    }));
    assert_eq!(doc.get(DiagramField::EntityRelationship), Some("erDiagram\nA ||--o{ B : has"));
    assert_eq!(doc.get(DiagramField::UseCase), Some("graph TD\nUser --> Login"));
}

#[test]
fn reads_snake_case_generation_fields() {
    let doc = DocumentDiagrams::from_json(
        r#"{ "er_diagram": "erDiagram\nA ||--|| B : x", "use_case_diagram": "" }"#,
    )
    .unwrap();
    assert_eq!(doc.er_diagram.as_deref(), Some("erDiagram\nA ||--|| B : x"));
    assert_eq!(doc.use_case_diagram, None);
}

#[test]
fn non_string_and_missing_fields_are_none() {
    let doc = DocumentDiagrams::from_value(&json!({ "erDiagram": 42 }));
    assert_eq!(doc, DocumentDiagrams::default());
    assert_eq!(DocumentDiagrams::from_value(&json!([1, 2])), DocumentDiagrams::default());
}

#[test]
fn mermaid_code_fences_are_unwrapped() {
    assert_eq!(strip_code_fence("```mermaid\ngraph TD\nA-->B\n```"), "graph TD\nA-->B");
    assert_eq!(strip_code_fence("```\nerDiagram\n```\n"), "erDiagram");
    assert_eq!(strip_code_fence("graph TD"), "graph TD");

    let doc = DocumentDiagrams::from_value(&json!({
        "use_case_diagram": "```mermaid\ngraph TD\nA-->B\n```"
    }));
    assert_eq!(doc.use_case_diagram.as_deref(), Some("graph TD\nA-->B"));
}

#[test]
fn field_names_parse() {
    assert_eq!("er".parse::<DiagramField>(), Ok(DiagramField::EntityRelationship));
    assert_eq!("use_case_diagram".parse::<DiagramField>(), Ok(DiagramField::UseCase));
    assert!("gantt".parse::<DiagramField>().is_err());
}

#[test]
fn generator_artifacts_are_flagged() {
    assert!(diagram_has_known_issues(""));
    assert!(diagram_has_known_issues("  \n"));
    assert!(diagram_has_known_issues("erDiagram\n  USER {\n    int id [pk]\n  }"));
    assert!(diagram_has_known_issues(
        "erDiagram\n  A ||--o{ B : has\n-----------------------^"
    ));
    assert!(!diagram_has_known_issues("erDiagram\n  USER {\n    int id PK\n  }"));
}

#[test]
fn missing_or_broken_fields_have_issues() {
    let doc = DocumentDiagrams::from_value(&json!({
        "erDiagram": "erDiagram\n  USER {\n    int id [pk]\n  }",
    }));
    assert!(doc.has_known_issues(DiagramField::EntityRelationship));
    assert!(doc.has_known_issues(DiagramField::UseCase));

    let doc = DocumentDiagrams::from_value(&json!({ "use_case_diagram": "graph TD\nA-->B" }));
    assert!(!doc.has_known_issues(DiagramField::UseCase));
}
