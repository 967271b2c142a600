//! Syntax normalization applied to every diagram source before it reaches the engine.
//!
//! Each rule rewrites one family of syntax that generated diagrams commonly get wrong. Rules are
//! pure and idempotent: running the normalizer on its own output is a no-op.
//!
//! Rule order:
//! 1. strip leading byte-order marks
//! 2. normalize line endings to `\n`
//! 3. escape unescaped `"` / `'`
//! 4. space out edges written as `A--B` (skipped for `erDiagram` sources)
//! 5. make `User -- Target` / `Actor -- Target` arrows directional
//! 6. repair entity-relationship attribute lines (only for `erDiagram` sources)
//! 7. rewrite `||--||`-style cardinality tokens
//!
//! Edge spacing runs before the actor-arrow rule so that `User--System` ends up as
//! `User --> System` in a single pass.

use crate::detect::detector_er;
use crate::{Error, Result};
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

pub const DEFAULT_MAX_INPUT_BYTES: usize = 512 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Sources above this size are passed through untouched.
    pub max_input_bytes: usize,
    /// Rewrites `A ||--|| B` to `A }|--|| B`.
    ///
    /// Note that this changes the relationship's cardinality, not only its syntax.
    pub rewrite_er_cardinality: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            rewrite_er_cardinality: true,
        }
    }
}

#[derive(Debug, Clone)]
struct Patterns {
    line_endings: Regex,
    edge_spacing: Regex,
    actor_arrow: Regex,
    er_arrow_artifact: Regex,
    er_attribute: Regex,
    cardinality_one_to_one: Regex,
    cardinality_one_to_bar: Regex,
    cardinality_bar_to_one: Regex,
}

fn compile(pattern: &'static str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::InvalidPattern {
        pattern,
        message: e.to_string(),
    })
}

impl Patterns {
    fn new() -> Result<Self> {
        Ok(Self {
            line_endings: compile(r"\r\n?")?,
            edge_spacing: compile(r"([A-Za-z0-9_]+)--([A-Za-z0-9_]+)")?,
            actor_arrow: compile(r"(?i)\b(user|actor)([ \t]+)--([ \t]+)([^:\s])")?,
            er_arrow_artifact: compile(r"\s+-+\^")?,
            er_attribute: compile(
                r"(\s*)([A-Za-z0-9_]+)(\s+)([A-Za-z0-9_]+)(\s+)(?:PK|pk|\[PK\]|\[pk\]|\(PK\)|\(pk\))(?:\s|$)",
            )?,
            // `\b` anchors keep the entity names out of the match, so chained relationships
            // (`A ||--|| B ||--|| C`) are all rewritten in one pass.
            cardinality_one_to_one: compile(r"\b[ \t]+\|\|--\|\|[ \t]+\b")?,
            cardinality_one_to_bar: compile(r"\b[ \t]+\|\|--\|[ \t]+\b")?,
            cardinality_bar_to_one: compile(r"\b[ \t]+\|--\|\|[ \t]+\b")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    options: NormalizeOptions,
    patterns: Patterns,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Result<Self> {
        Ok(Self {
            options,
            patterns: Patterns::new()?,
        })
    }

    pub fn options(&self) -> NormalizeOptions {
        self.options
    }

    /// Normalizes `input`, falling back to the unmodified input if any rule fails.
    pub fn normalize(&self, input: &str) -> String {
        match self.try_normalize(input) {
            Ok(out) => out,
            Err(err) => {
                tracing::warn!(error = %err, "diagram normalization failed; using original source");
                input.to_string()
            }
        }
    }

    pub fn try_normalize(&self, input: &str) -> Result<String> {
        if input.len() > self.options.max_input_bytes {
            return Err(Error::InputTooLarge {
                len: input.len(),
                limit: self.options.max_input_bytes,
            });
        }

        let text = input.trim_start_matches('\u{FEFF}');
        let text = self.patterns.line_endings.replace_all(text, "\n");
        let text = escape_quotes(&text);
        let is_er = detector_er(&text);
        // ER cardinality markers such as `}o--o{` look like unspaced edges.
        let text = if is_er { text } else { self.space_edges(&text) };
        let text = self
            .patterns
            .actor_arrow
            .replace_all(&text, "${1}${2}-->${3}${4}")
            .into_owned();

        let text = if is_er {
            self.repair_er_lines(&text)
        } else {
            text
        };

        let text = if self.options.rewrite_er_cardinality {
            self.rewrite_cardinality(&text)
        } else {
            text
        };

        tracing::debug!(
            input_bytes = input.len(),
            output_bytes = text.len(),
            changed = text != input,
            "normalized diagram source"
        );
        Ok(text)
    }

    fn space_edges(&self, text: &str) -> String {
        let mut out = Cow::Borrowed(text);
        // Matches are non-overlapping, so `A--B--C` needs a second pass for `B--C`. Every pass
        // strictly reduces the number of unspaced edges.
        while self.patterns.edge_spacing.is_match(&out) {
            let next = self
                .patterns
                .edge_spacing
                .replace_all(&out, "${1} -- ${2}")
                .into_owned();
            out = Cow::Owned(next);
        }
        out.into_owned()
    }

    fn repair_er_lines(&self, text: &str) -> String {
        text.split('\n')
            .map(|line| self.repair_er_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn repair_er_line(&self, line: &str) -> String {
        let line = self.patterns.er_arrow_artifact.replace_all(line, "");
        let line = line.replace("[pk]", "").replace("(PK)", "PK");

        if let Some(caps) = self.patterns.er_attribute.captures(&line) {
            return format!("{}{}{}{} PK", &caps[1], &caps[2], &caps[3], &caps[4]);
        }
        line
    }

    fn rewrite_cardinality(&self, text: &str) -> String {
        let p = &self.patterns;
        let text = p.cardinality_one_to_one.replace_all(text, " }|--|| ");
        let text = p.cardinality_one_to_bar.replace_all(&text, " }|--| ");
        let text = p.cardinality_bar_to_one.replace_all(&text, " |--|| ");
        text.into_owned()
    }
}

/// Prefixes every `"` and `'` that is not already escaped with a backslash.
///
/// A quote counts as escaped when it follows an odd number of backslashes.
pub fn escape_quotes(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    let mut backslashes = 0usize;
    for ch in input.chars() {
        match ch {
            '\\' => backslashes += 1,
            '"' | '\'' => {
                if backslashes % 2 == 0 {
                    out.push('\\');
                }
                backslashes = 0;
            }
            _ => backslashes = 0,
        }
        out.push(ch);
    }
    out
}

fn default_normalizer() -> Option<&'static Normalizer> {
    static NORMALIZER: OnceLock<Option<Normalizer>> = OnceLock::new();
    NORMALIZER
        .get_or_init(|| match Normalizer::new(NormalizeOptions::default()) {
            Ok(n) => Some(n),
            Err(err) => {
                tracing::warn!(error = %err, "diagram normalizer unavailable");
                None
            }
        })
        .as_ref()
}

/// Normalizes a possibly-absent diagram source with default options.
///
/// Never fails: an absent source yields an empty string, and any internal failure yields the
/// original source unchanged.
pub fn normalize_source(input: Option<&str>) -> String {
    let input = input.unwrap_or_default();
    match default_normalizer() {
        Some(normalizer) => normalizer.normalize(input),
        None => input.to_string(),
    }
}
