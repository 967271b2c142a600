use crate::normalize::escape_quotes;
use crate::*;

fn normalize(text: &str) -> String {
    Normalizer::new(NormalizeOptions::default())
        .unwrap()
        .try_normalize(text)
        .unwrap()
}

#[test]
fn er_one_to_one_cardinality_is_rewritten() {
    let out = normalize("erDiagram\nCUSTOMER ||--|| ORDER : places");
    assert!(out.contains("CUSTOMER }|--|| ORDER : places"), "{out}");
    assert!(!out.contains("||--||"), "{out}");
}

#[test]
fn er_cardinality_variants_collapse_whitespace() {
    assert_eq!(normalize("A   ||--||   B"), "A }|--|| B");
    assert_eq!(normalize("A ||--| B"), "A }|--| B");
    assert_eq!(normalize("A\t|--||  B"), "A |--|| B");
}

#[test]
fn er_cardinality_rewrite_can_be_disabled() {
    let normalizer = Normalizer::new(NormalizeOptions {
        rewrite_er_cardinality: false,
        ..NormalizeOptions::default()
    })
    .unwrap();
    let text = "erDiagram\nCUSTOMER ||--|| ORDER : places";
    assert_eq!(normalizer.normalize(text), text);
}

#[test]
fn sequence_actor_dash_becomes_directional() {
    assert_eq!(
        normalize("sequenceDiagram\nUser -- System: request"),
        "sequenceDiagram\nUser --> System: request"
    );
    assert_eq!(normalize("actor -- db"), "actor --> db");
    assert_eq!(normalize("ACTOR  --  Backend"), "ACTOR  -->  Backend");
}

#[test]
fn actor_arrow_requires_a_target() {
    assert_eq!(normalize("User -- : oops"), "User -- : oops");
    assert_eq!(normalize("superuser -- x"), "superuser -- x");
}

#[test]
fn unspaced_actor_edge_is_spaced_then_made_directional() {
    assert_eq!(normalize("User--System"), "User --> System");
}

#[test]
fn strips_bom_and_normalizes_line_endings() {
    assert_eq!(
        normalize("\u{FEFF}graph TD\r\nA-->B\rB-->C\r\n"),
        "graph TD\nA-->B\nB-->C\n"
    );
}

#[test]
fn only_a_leading_bom_is_stripped() {
    assert_eq!(normalize("graph TD\nA[\u{FEFF}]"), "graph TD\nA[\u{FEFF}]");
}

#[test]
fn quotes_are_escaped_once() {
    assert_eq!(normalize(r#"A["Hello"]"#), r#"A[\"Hello\"]"#);
    assert_eq!(normalize("B['x']"), r"B[\'x\']");
    assert_eq!(normalize(r#"A[\"kept\"]"#), r#"A[\"kept\"]"#);
}

#[test]
fn quote_after_escaped_backslash_is_escaped() {
    assert_eq!(escape_quotes(r#"a\\"b"#), r#"a\\\"b"#);
}

#[test]
fn flowchart_edges_get_spaces_including_chains() {
    assert_eq!(normalize("graph TD\nA--B"), "graph TD\nA -- B");
    assert_eq!(normalize("graph TD\nA--B--C"), "graph TD\nA -- B -- C");
    assert_eq!(normalize("graph TD\nA-->B"), "graph TD\nA-->B");
}

#[test]
fn er_cardinality_markers_are_not_spaced_like_edges() {
    let text = "erDiagram\n  CUSTOMER }o--o{ ORDER : places\n  ORDER |o--o| ITEM : holds";
    assert_eq!(normalize(text), text);
}

#[test]
fn er_attribute_lines_are_canonicalized() {
    let input = "erDiagram\n  CUSTOMER {\n    string id [PK]\n    int age (pk)\n    int ref (PK)\n    string code [pk]\n    string name\n  }";
    let out = normalize(input);
    assert_eq!(
        out,
        "erDiagram\n  CUSTOMER {\n    string id PK\n    int age PK\n    int ref PK\n    string code \n    string name\n  }"
    );
}

#[test]
fn er_arrow_artifacts_are_removed() {
    assert_eq!(
        normalize("erDiagram\n  A ||--o{ B : has --^"),
        "erDiagram\n  A ||--o{ B : has"
    );
}

#[test]
fn er_line_repairs_only_apply_to_er_diagrams() {
    let text = "graph TD\n  A --^ B";
    assert_eq!(normalize(text), text);
}

#[test]
fn normalization_is_idempotent() {
    let samples = [
        "erDiagram\nCUSTOMER ||--|| ORDER : places",
        "erDiagram\n  CUSTOMER {\n    string id [PK]\n    int age (pk)\n  }\n  A ||--| B\n  C |--|| D",
        "sequenceDiagram\nUser -- System: request\nActor -- Db",
        "graph TD\nA--B--C\nUser--System\nA[\"label\"]",
        "\u{FEFF}flowchart LR\r\nA['x']-->B\r\n",
        "\u{FEFF}\u{FEFF}graph TD",
        "erDiagram\nA ||--|| B ||--|| C\nD ||--| E ||--| F\nG |--|| H  |--||  I",
        "",
        "   ",
        r#"a\\"b"#,
    ];
    for sample in samples {
        let once = normalize(sample);
        let twice = normalize(&once);
        assert_eq!(once, twice, "not idempotent for {sample:?}");
    }
}

#[test]
fn chained_relationships_are_rewritten_in_one_pass() {
    assert_eq!(
        normalize("erDiagram\nA ||--|| B ||--|| C"),
        "erDiagram\nA }|--|| B }|--|| C"
    );
    assert_eq!(normalize("A ||--| B ||--| C"), "A }|--| B }|--| C");
    assert_eq!(normalize("A  |--|| B\t|--||  C"), "A |--|| B |--|| C");
}

#[test]
fn every_leading_bom_is_stripped() {
    assert_eq!(normalize("\u{FEFF}\u{FEFF}graph TD"), "graph TD");
}

#[test]
fn oversized_input_fails_open() {
    let normalizer = Normalizer::new(NormalizeOptions {
        max_input_bytes: 8,
        ..NormalizeOptions::default()
    })
    .unwrap();
    let text = "graph TD\r\nA--B";

    let err = normalizer.try_normalize(text).unwrap_err();
    assert!(matches!(err, Error::InputTooLarge { limit: 8, .. }));
    assert_eq!(normalizer.normalize(text), text);
}

#[test]
fn absent_or_empty_source_normalizes_to_empty() {
    assert_eq!(normalize_source(None), "");
    assert_eq!(normalize_source(Some("")), "");
}

#[test]
fn default_entry_point_matches_normalizer() {
    let text = "sequenceDiagram\nUser -- System: request";
    assert_eq!(normalize_source(Some(text)), normalize(text));
}
