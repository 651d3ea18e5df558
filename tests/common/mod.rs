#![allow(dead_code)]

use report_pdf::{
    AnalysisCategory, NodeKind, Notice, Progress, ReportConfig, ReportListener, ReportRequest,
    VisualNode,
};
use serde_json::{Value, json};

/// Default layout with uncompressed streams, so stamped text can be searched.
pub fn plain_config() -> ReportConfig {
    ReportConfig {
        compress_streams: false,
        ..ReportConfig::default()
    }
}

pub fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|w| w == needle.as_bytes())
}

/// Count `/Type /Page` dictionaries, skipping the `/Type /Pages` tree node.
pub fn count_pdf_pages(pdf: &[u8]) -> usize {
    let needle = b"/Type /Page";
    pdf.windows(needle.len() + 1)
        .filter(|w| &w[..needle.len()] == needle && w[needle.len()] != b's')
        .count()
}

/// Bodies of the uncompressed page content streams, in page order.
///
/// Form and image XObjects carry a `/Subtype`, page contents do not, and the
/// composer writes page contents last, cover first.
pub fn content_streams(pdf: &[u8]) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut rest = pdf;
    while let Some(start) = find(rest, b">>\nstream\n") {
        let dict_start = rfind(&rest[..start], b" obj\n").unwrap_or(0);
        let dict = &rest[dict_start..start];
        let body_start = start + b">>\nstream\n".len();
        let body_len = find(&rest[body_start..], b"\nendstream").expect("unterminated stream");
        if find(dict, b"/Subtype").is_none() {
            out.push(rest[body_start..body_start + body_len].to_vec());
        }
        rest = &rest[body_start + body_len..];
    }
    out
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

#[derive(Default)]
pub struct Recorder {
    pub progress: Vec<Progress>,
    pub notices: Vec<Notice>,
}

impl ReportListener for Recorder {
    fn progress(&mut self, progress: Progress) {
        self.progress.push(progress);
    }

    fn notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

pub fn request(analysis: Option<Value>, fallback: Option<VisualNode>) -> ReportRequest {
    ReportRequest {
        analysis,
        category: AnalysisCategory::Numerology,
        title: "Numerology Report".to_string(),
        fallback,
    }
}

pub fn summary_only() -> Value {
    json!({ "overall": "Your numbers point to a year of steady growth." })
}

pub fn numerology_result() -> Value {
    json!({
        "overall": "A balanced chart with a strong creative streak.",
        "numbers": {
            "lifePath": {
                "content": "Life path 7 favours study and reflection."
            },
            "expression": {
                "calculation": "J(1) + A(1) + N(5) = 7",
                "meaning": "Seven is the seeker.",
                "personalInterpretation": "You learn best alone."
            },
            "soulUrge": { "content": "   " },
            "personality": {
                "title": "Outer Personality",
                "narrative": "Others see you as calm."
            }
        }
    })
}

/// A body tall enough to overflow any single page on its own.
pub fn long_body(lines: usize) -> String {
    (1..=lines)
        .map(|i| format!("Line {i} of a very long interpretation."))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn fallback_view() -> VisualNode {
    let mut clamped = VisualNode::text(NodeKind::Text, "First line\nSecond line\nThird line");
    clamped.line_clamp = Some(1);
    let mut collapsed = VisualNode::new(NodeKind::Container)
        .with_children(vec![VisualNode::text(NodeKind::Text, "Hidden details")]);
    collapsed.collapsed = true;
    VisualNode::new(NodeKind::Container).with_children(vec![
        VisualNode::text(NodeKind::Heading { level: 1 }, "Your reading"),
        clamped,
        collapsed,
        VisualNode::new(NodeKind::Image {
            src: "missing.png".to_string(),
            width: None,
            height: None,
        }),
        VisualNode::text(NodeKind::Share, "Share this"),
    ])
}
