mod common;

use report_pdf::{AnalysisCategory, ContentSection, extract_sections};
use serde_json::json;

fn titles(sections: &[ContentSection]) -> Vec<&str> {
    sections.iter().map(|s| s.title.as_str()).collect()
}

#[test]
fn summary_first_then_topics_in_encounter_order() {
    let sections = extract_sections(
        &common::numerology_result(),
        AnalysisCategory::Numerology,
        "Overview",
    );
    assert_eq!(
        titles(&sections),
        vec!["Overview", "Life Path", "Expression", "Outer Personality"]
    );
}

#[test]
fn legacy_fields_are_joined_with_blank_lines() {
    let sections = extract_sections(
        &common::numerology_result(),
        AnalysisCategory::Numerology,
        "Overview",
    );
    assert_eq!(
        sections[2].body,
        "J(1) + A(1) + N(5) = 7\n\nSeven is the seeker.\n\nYou learn best alone."
    );
}

#[test]
fn consolidated_field_beats_legacy_fields() {
    let result = json!({
        "numbers": {
            "destiny": {
                "content": "New style text.",
                "meaning": "Old style text."
            }
        }
    });
    let sections = extract_sections(&result, AnalysisCategory::Numerology, "Overview");
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].body, "New style text.");
}

#[test]
fn topics_without_text_are_dropped() {
    let result = json!({
        "overall": "",
        "numbers": {
            "empty": {},
            "blank": { "content": "  ", "meaning": null },
            "odd": 42.5,
            "nested": { "content": { "unexpected": "shape" } }
        }
    });
    let sections = extract_sections(&result, AnalysisCategory::Numerology, "Overview");
    assert_eq!(titles(&sections), vec!["Odd"]);
    assert_eq!(sections[0].body, "42.5");
}

#[test]
fn summary_alone_gives_one_section() {
    let sections = extract_sections(
        &common::summary_only(),
        AnalysisCategory::Numerology,
        "Overview",
    );
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].title, "Overview");
}

#[test]
fn astrology_reads_all_its_containers() {
    let result = json!({
        "summary": "Sun in Leo, Moon in Pisces.",
        "planets": {
            "sun": { "interpretation": "Warm and expressive." }
        },
        "houses": [
            { "name": "First House", "content": "Strong presence." },
            { "content": "Shared resources." }
        ],
        "aspects": {
            "sun_trine_moon": { "content": "Ease between will and feeling." }
        },
        "cards": { "ignored": { "content": "Not an astrology container." } }
    });
    let sections = extract_sections(&result, AnalysisCategory::Astrology, "Chart overview");
    assert_eq!(
        titles(&sections),
        vec!["Chart overview", "Sun", "First House", "Topic 4", "Sun Trine Moon"]
    );
}

#[test]
fn tarot_cards_and_list_values() {
    let result = json!({
        "cards": [
            {
                "title": "The Star",
                "meaning": ["Hope", "Renewal"],
                "references": "Major Arcana XVII"
            }
        ]
    });
    let sections = extract_sections(&result, AnalysisCategory::Tarot, "Overview");
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].title, "The Star");
    assert_eq!(sections[0].body, "Hope\nRenewal\n\nMajor Arcana XVII");
}

#[test]
fn non_object_result_yields_nothing() {
    for result in [json!(null), json!("text"), json!([1, 2, 3]), json!({})] {
        assert!(extract_sections(&result, AnalysisCategory::General, "Overview").is_empty());
    }
}
