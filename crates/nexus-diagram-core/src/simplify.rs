//! Lossy rewrites used for the single retry after a failed render.
//!
//! Simplification trades fidelity for a better chance of rendering: styling, notes, activation
//! markers, attribute blocks and class members are dropped depending on the detected dialect.

use crate::detect::{DiagramKind, detect_kind};
use regex::Regex;
use std::sync::OnceLock;

fn double_bracket_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[(.*?)\]\]").ok()).as_ref()
}

fn attribute_block_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    // Only braces that open an entity's attribute block; `o{` in a relationship is cardinality.
    RE.get_or_init(|| Regex::new(r"(?m)^([ \t]*[A-Za-z0-9_\-]+)[ \t]*\{[^{}]*\}").ok())
        .as_ref()
}

/// Simplifies `input` according to its detected diagram kind.
pub fn simplify(input: &str) -> String {
    simplify_as(detect_kind(input), input)
}

/// Simplifies `input` as the given kind, skipping detection.
pub fn simplify_as(kind: DiagramKind, input: &str) -> String {
    let out = match kind {
        DiagramKind::Flowchart => {
            let without_style = drop_lines(input, is_style_line);
            match double_bracket_regex() {
                Some(re) => re.replace_all(&without_style, "[$1]").into_owned(),
                None => without_style,
            }
        }
        DiagramKind::Sequence => drop_lines(input, |line| {
            is_note_line(line) || is_activation_line(line)
        }),
        DiagramKind::EntityRelationship => match attribute_block_regex() {
            Some(re) => re.replace_all(input, "${1}").into_owned(),
            None => input.to_string(),
        },
        DiagramKind::Class => drop_lines(input, |line| {
            line.trim_start().starts_with('+') || line.trim_start().starts_with('-')
        }),
        DiagramKind::Unknown => input.to_string(),
    };

    tracing::debug!(
        kind = %kind,
        input_bytes = input.len(),
        output_bytes = out.len(),
        "simplified diagram source"
    );
    out
}

fn drop_lines(input: &str, drop: impl Fn(&str) -> bool) -> String {
    input
        .split('\n')
        .filter(|line| !drop(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn first_word(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

fn is_style_line(line: &str) -> bool {
    let mut words = line.split_whitespace();
    words.next() == Some("style") && words.next().is_some()
}

fn is_note_line(line: &str) -> bool {
    let mut words = line.split_whitespace();
    words.next() == Some("Note")
        && matches!(words.next(), Some(w) if w.starts_with("right") || w.starts_with("left") || w.starts_with("over"))
}

fn is_activation_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    matches!(first_word(trimmed), Some("activate") | Some("deactivate"))
        && trimmed.split_whitespace().nth(1).is_some()
}
