use serde_json::{Map, Value};

use crate::model::{AnalysisCategory, ContentSection};

const SUMMARY_KEYS: &[&str] = &["overall", "summary", "general"];

/// Single-field narrative written by current analysis versions.
const NARRATIVE_KEYS: &[&str] = &["content", "narrative", "interpretation"];

/// Multi-field layout written by older analysis versions, in output order.
/// Each entry lists the spellings seen for the same field.
const LEGACY_FIELDS: &[&[&str]] = &[
    &["calculation"],
    &["meaning"],
    &["personalInterpretation", "personal_interpretation"],
    &["references"],
];

/// Normalize an analysis result into ordered sections: summary first, then
/// topics in the order they appear. Missing or oddly shaped data yields fewer
/// sections, never an error.
pub fn extract_sections(
    result: &Value,
    category: AnalysisCategory,
    summary_title: &str,
) -> Vec<ContentSection> {
    let Some(root) = result.as_object() else {
        return Vec::new();
    };
    let mut sections = Vec::new();

    if let Some(summary) = SUMMARY_KEYS.iter().find_map(|k| root.get(*k).and_then(text_of)) {
        sections.push(ContentSection {
            title: summary_title.to_string(),
            body: summary,
        });
    }

    for container_key in category.topic_containers() {
        match root.get(*container_key) {
            Some(Value::Object(topics)) => {
                for (key, record) in topics {
                    push_topic(&mut sections, Some(key), record);
                }
            }
            Some(Value::Array(topics)) => {
                for record in topics {
                    push_topic(&mut sections, None, record);
                }
            }
            _ => {}
        }
    }

    log::debug!(
        "extract_sections: category={category:?} → {} sections",
        sections.len()
    );
    sections
}

fn push_topic(sections: &mut Vec<ContentSection>, key: Option<&str>, record: &Value) {
    let Some(body) = topic_body(record) else {
        return;
    };
    let title = record
        .as_object()
        .and_then(|r| field(r, &["title", "name"]))
        .or_else(|| key.map(humanize_key))
        .unwrap_or_else(|| format!("Topic {}", sections.len() + 1));
    sections.push(ContentSection { title, body });
}

fn topic_body(record: &Value) -> Option<String> {
    let obj = match record {
        Value::Object(obj) => obj,
        other => return text_of(other),
    };
    if let Some(narrative) = field(obj, NARRATIVE_KEYS) {
        return Some(narrative);
    }
    let parts: Vec<String> = LEGACY_FIELDS
        .iter()
        .filter_map(|spellings| field(obj, spellings))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

fn field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(text_of))
}

/// Text of a scalar or list value, trimmed; `None` when nothing printable remains.
fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(text_of)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null | Value::Object(_) => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

/// `life_path` / `lifePath` / `life-path` → `Life Path`
fn humanize_key(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in key.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
