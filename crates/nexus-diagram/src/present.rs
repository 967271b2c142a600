//! What a [`crate::DiagramView`] shows, plus a plain HTML rendering of it.

pub const SOURCE_SUMMARY: &str = "View Original Diagram Source";
pub const RETRY_LABEL: &str = "Try simplified version";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    Spinner,
    Diagram {
        markup: String,
        background: String,
    },
    Error {
        message: String,
        detail: Option<String>,
        /// Always the original source, shown collapsed.
        source: String,
        retry: bool,
    },
}

impl Presentation {
    /// Renders an HTML fragment. Diagram markup is embedded as-is; every other piece of text is
    /// escaped.
    pub fn to_html(&self) -> String {
        match self {
            Self::Spinner => {
                r#"<div class="diagram diagram-loading" role="status"><span class="spinner"></span>Rendering diagram...</div>"#
                    .to_string()
            }
            Self::Diagram { markup, background } => format!(
                r#"<div class="diagram" style="background-color: {}">{}</div>"#,
                escape_attr(background),
                markup
            ),
            Self::Error {
                message,
                detail,
                source,
                retry,
            } => {
                let mut out = String::from(r#"<div class="diagram diagram-error" role="alert">"#);
                out.push_str(r#"<p class="diagram-error-message">"#);
                out.push_str(&escape_text(message));
                out.push_str("</p>");
                if let Some(detail) = detail {
                    out.push_str(r#"<p class="diagram-error-detail">"#);
                    out.push_str(&escape_text(detail));
                    out.push_str("</p>");
                }
                out.push_str("<details><summary>");
                out.push_str(SOURCE_SUMMARY);
                out.push_str("</summary><pre><code>");
                out.push_str(&escape_text(source));
                out.push_str("</code></pre></details>");
                if *retry {
                    out.push_str(r#"<button type="button" class="diagram-retry" data-action="retry">"#);
                    out.push_str(RETRY_LABEL);
                    out.push_str("</button>");
                }
                out.push_str("</div>");
                out
            }
        }
    }
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;").replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_panel_escapes_source_and_message() {
        let html = Presentation::Error {
            message: "Failed to render diagram: <oops>".to_string(),
            detail: None,
            source: "graph TD\n  A[\"<b>x</b>\"] --> B & C".to_string(),
            retry: true,
        }
        .to_html();

        assert!(html.contains("Failed to render diagram: &lt;oops&gt;"));
        assert!(html.contains("A[\"&lt;b&gt;x&lt;/b&gt;\"] --&gt; B &amp; C"));
        assert!(!html.contains("<b>"));
        assert!(html.contains(SOURCE_SUMMARY));
        assert!(html.contains(RETRY_LABEL));
    }

    #[test]
    fn error_panel_omits_retry_when_not_offered() {
        let html = Presentation::Error {
            message: "m".to_string(),
            detail: Some("Parse error on line 2".to_string()),
            source: "x".to_string(),
            retry: false,
        }
        .to_html();
        assert!(!html.contains("<button"));
        assert!(html.contains("Parse error on line 2"));
    }

    #[test]
    fn diagram_embeds_markup_and_escapes_background() {
        let html = Presentation::Diagram {
            markup: "<svg id=\"mermaid-1\"></svg>".to_string(),
            background: "#fff\" onload=\"x".to_string(),
        }
        .to_html();
        assert!(html.contains("<svg id=\"mermaid-1\"></svg>"));
        assert!(html.contains("#fff&quot; onload=&quot;x"));
    }
}
