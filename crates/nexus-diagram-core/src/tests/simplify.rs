use crate::*;

#[test]
fn flowchart_drops_styles_and_double_brackets() {
    let input = "graph TD\nA[[Start]] --> B\nstyle A fill:#fff\nB --> C";
    assert_eq!(simplify(input), "graph TD\nA[Start] --> B\nB --> C");
}

#[test]
fn style_lines_only_dropped_for_flowcharts() {
    let flow = "flowchart LR\n  style A fill:#fff\n  A --> B";
    let seq = "sequenceDiagram\n  style A fill:#fff\n  Alice->>Bob: hi";

    assert_eq!(simplify(flow), "flowchart LR\n  A --> B");
    assert_eq!(simplify(seq), seq);
}

#[test]
fn sequence_drops_notes_and_activations() {
    let input = "sequenceDiagram\nAlice->>Bob: Hi\nNote right of Bob: thinks\n  Note over Alice,Bob: both\nactivate Bob\nBob-->>Alice: Hello\ndeactivate Bob";
    assert_eq!(
        simplify(input),
        "sequenceDiagram\nAlice->>Bob: Hi\nBob-->>Alice: Hello"
    );
}

#[test]
fn er_drops_attribute_blocks_but_keeps_relationships() {
    let input = "erDiagram\nCUSTOMER ||--o{ ORDER : places\nCUSTOMER {\n  string name\n  int id PK\n}\nORDER { int id }";
    assert_eq!(
        simplify(input),
        "erDiagram\nCUSTOMER ||--o{ ORDER : places\nCUSTOMER\nORDER"
    );
}

#[test]
fn class_drops_member_lines() {
    let input = "classDiagram\nclass Animal {\n  +String name\n  -int age\n  +eat()\n}\nAnimal <|-- Dog";
    assert_eq!(
        simplify(input),
        "classDiagram\nclass Animal {\n}\nAnimal <|-- Dog"
    );
}

#[test]
fn unknown_kind_is_unchanged() {
    let input = "pie title Pets\n  \"Dogs\" : 386\n  style x";
    assert_eq!(simplify(input), input);
}

#[test]
fn simplify_as_skips_detection() {
    let input = "A[[x]]\nstyle A fill:#000";
    assert_eq!(simplify_as(DiagramKind::Flowchart, input), "A[x]");
    assert_eq!(simplify_as(DiagramKind::Unknown, input), input);
}
