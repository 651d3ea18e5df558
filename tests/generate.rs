mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{Datelike, Local};
use common::{
    Recorder, contains, content_streams, count_pdf_pages, fallback_view, long_body,
    numerology_result, plain_config, request, summary_only,
};
use report_pdf::{
    AssetLoader, Error, FsAssetLoader, NodeKind, NoopListener, Notice, ReportConfig,
    StrategyKind, VisualNode, generate, generate_with_assets,
};
use serde_json::json;

#[test]
fn summary_only_result_is_cover_plus_one_page() {
    let config = plain_config();
    let report = generate(
        &request(Some(summary_only()), None),
        &"Ayla",
        &config,
        &mut NoopListener,
    )
    .unwrap();

    assert_eq!(report.strategy, StrategyKind::Structured);
    assert_eq!(report.content_pages, 1);
    assert_eq!(report.page_count, 2);
    assert_eq!(count_pdf_pages(&report.bytes), 2);
    assert!(contains(&report.bytes, "(Page 2 / 2)"));
}

#[test]
fn every_content_page_carries_the_final_total() {
    let config = plain_config();
    let analysis = json!({
        "overall": "Short opening.",
        "numbers": {
            "destiny": { "content": long_body(120) },
            "maturity": { "content": long_body(20) }
        }
    });
    let report = generate(&request(Some(analysis), None), &"Ayla", &config, &mut NoopListener)
        .unwrap();

    let total = report.page_count;
    assert!(report.content_pages >= 2);
    assert_eq!(total, report.content_pages + 1);
    assert_eq!(count_pdf_pages(&report.bytes), total);
    for page in 2..=total {
        assert!(
            contains(&report.bytes, &format!("(Page {page} / {total})")),
            "missing label for page {page}"
        );
    }
    assert!(!contains(&report.bytes, &format!("(Page 1 / {total})")));
}

#[test]
fn oversized_section_is_placed_alone_and_not_split() {
    let config = plain_config();
    let analysis = json!({
        "overall": "Short opening.",
        "numbers": {
            "destiny": { "content": long_body(300) },
            "maturity": { "content": "A short closing note." }
        }
    });
    let report = generate(&request(Some(analysis), None), &"Ayla", &config, &mut NoopListener)
        .unwrap();

    // summary, the oversized block, then the closing note
    assert_eq!(report.content_pages, 3);
    assert_eq!(report.page_count, 4);
    assert!(contains(&report.bytes, "(Line 300 of a very long interpretation.)"));
}

#[test]
fn structured_content_wins_over_fallback() {
    let config = plain_config();
    let report = generate(
        &request(Some(numerology_result()), Some(fallback_view())),
        &"Ayla",
        &config,
        &mut NoopListener,
    )
    .unwrap();

    assert_eq!(report.strategy, StrategyKind::Structured);
    assert!(!contains(&report.bytes, "Your reading"));
}

#[test]
fn empty_result_falls_back_to_capture() {
    let config = plain_config();
    let assets_dir = tempfile::tempdir().unwrap();
    let assets: Arc<dyn AssetLoader> = Arc::new(FsAssetLoader::new(assets_dir.path()));

    for analysis in [None, Some(json!({})), Some(json!({ "numbers": {} }))] {
        let report = generate_with_assets(
            &request(analysis, Some(fallback_view())),
            &"Ayla",
            &config,
            Arc::clone(&assets),
            &mut NoopListener,
        )
        .unwrap();

        assert_eq!(report.strategy, StrategyKind::Capture);
        assert_eq!(report.page_count, report.content_pages + 1);
        assert_eq!(count_pdf_pages(&report.bytes), report.page_count);
        assert!(contains(&report.bytes, "(Your reading)"));
        assert!(contains(&report.bytes, "(Hidden details)"));
        assert!(contains(&report.bytes, "(Third line)"));
        assert!(!contains(&report.bytes, "Share this"));
    }
}

#[test]
fn tall_capture_is_sliced_across_pages() {
    let config = plain_config();
    let mut view = fallback_view();
    view.children.push(report_pdf::VisualNode::text(
        report_pdf::NodeKind::Text,
        long_body(400),
    ));
    let report = generate(&request(None, Some(view)), &"Ayla", &config, &mut NoopListener)
        .unwrap();

    assert_eq!(report.strategy, StrategyKind::Capture);
    assert!(report.content_pages > 1);
    let total = report.page_count;
    for page in 2..=total {
        assert!(contains(&report.bytes, &format!("(Page {page} / {total})")));
    }
}

/// Never returns before `delay`, however small the image budget is.
struct SlowLoader {
    delay: Duration,
}

impl AssetLoader for SlowLoader {
    fn load(&self, _src: &str) -> Result<Vec<u8>, Error> {
        thread::sleep(self.delay);
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "loader woke up too late",
        )))
    }
}

#[test]
fn slow_image_load_is_abandoned_at_the_budget() {
    let config = ReportConfig {
        capture_asset_budget_ms: 100,
        ..plain_config()
    };
    let view = VisualNode::new(NodeKind::Container).with_children(vec![
        VisualNode::text(NodeKind::Heading { level: 1 }, "Your reading"),
        VisualNode::new(NodeKind::Image {
            src: "portrait.png".to_string(),
            width: Some(120.0),
            height: Some(80.0),
        }),
    ]);
    let assets: Arc<dyn AssetLoader> = Arc::new(SlowLoader {
        delay: Duration::from_millis(1500),
    });

    let t0 = Instant::now();
    let report = generate_with_assets(
        &request(None, Some(view)),
        &"Ayla",
        &config,
        assets,
        &mut NoopListener,
    )
    .unwrap();
    let elapsed = t0.elapsed();

    assert_eq!(report.strategy, StrategyKind::Capture);
    assert!(contains(&report.bytes, "(Your reading)"));
    assert!(
        elapsed < Duration::from_millis(1000),
        "generation waited {elapsed:?} on a 100ms image budget"
    );
}

#[test]
fn cover_and_content_pages_carry_their_stamps() {
    let config = ReportConfig {
        date_format: "%Y".to_string(),
        ..plain_config()
    };
    let report = generate(
        &request(Some(summary_only()), None),
        &"Ayla",
        &config,
        &mut NoopListener,
    )
    .unwrap();
    let year = Local::now().year();
    let year_stamp = format!("({year}) Tj");

    let streams = content_streams(&report.bytes);
    assert_eq!(streams.len(), 2);

    let cover = &streams[0];
    assert!(contains(cover, "(Numerology Report) Tj"));
    assert!(contains(cover, "(Ayla) Tj"));
    assert!(contains(cover, "(Astralis) Tj"));
    assert!(contains(cover, "(v2.4) Tj"));
    assert!(contains(cover, &year_stamp));
    assert!(!contains(cover, "(Page "));

    let page = &streams[1];
    assert!(contains(page, "(Astralis) Tj"));
    assert!(contains(page, &year_stamp));
    assert!(contains(page, "(Page 2 / 2) Tj"));
    assert!(!contains(page, "(Ayla) Tj"));
    assert!(!contains(page, "(v2.4) Tj"));
}

#[test]
fn nothing_to_render_fails_once() {
    let config = plain_config();
    let mut recorder = Recorder::default();
    let result = generate(&request(Some(json!({})), None), &"Ayla", &config, &mut recorder);

    assert!(matches!(result, Err(Error::NothingToRender)));
    assert_eq!(recorder.notices, vec![Notice::Started, Notice::Failed]);
}

#[test]
fn invalid_config_fails_without_output() {
    let mut config = plain_config();
    config.margins.top = 800.0;
    let mut recorder = Recorder::default();
    let result = generate(&request(Some(summary_only()), None), &"Ayla", &config, &mut recorder);

    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(recorder.notices, vec![Notice::Started, Notice::Failed]);
}

#[test]
fn progress_is_monotonic_and_single_shot() {
    let config = plain_config();
    let mut recorder = Recorder::default();
    let report = generate(
        &request(Some(numerology_result()), None),
        &"Ayla",
        &config,
        &mut recorder,
    )
    .unwrap();

    let percents: Vec<u8> = recorder.progress.iter().map(|p| p.percent).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    assert_eq!(percents.last(), Some(&100));
    let steps: Vec<&str> = recorder.progress.iter().map(|p| p.step).collect();
    for step in ["Preparing content", "Estimating pages", "Drawing pages", "Finalizing"] {
        assert!(steps.contains(&step), "missing step {step}");
    }

    // No cancellation hook exists: one call, one start, one outcome.
    assert_eq!(
        recorder.notices,
        vec![
            Notice::Started,
            Notice::Succeeded {
                filename: report.filename.clone()
            }
        ]
    );
}

#[test]
fn identical_input_gives_identical_page_counts() {
    let config = plain_config();
    let analysis = json!({
        "overall": long_body(30),
        "numbers": {
            "a": { "content": long_body(45) },
            "b": { "meaning": long_body(12), "references": "Pythagorean table" },
            "c": { "content": long_body(60) }
        }
    });
    let first = generate(&request(Some(analysis.clone()), None), &"Ayla", &config, &mut NoopListener)
        .unwrap();
    let second = generate(&request(Some(analysis), None), &"Ayla", &config, &mut NoopListener)
        .unwrap();

    assert_eq!(first.page_count, second.page_count);
    assert_eq!(first.content_pages, second.content_pages);
    assert_ne!(first.filename, second.filename);
}

#[test]
fn metadata_is_written() {
    let config = plain_config();
    let report = generate(
        &request(Some(summary_only()), None),
        &"Ayla",
        &config,
        &mut NoopListener,
    )
    .unwrap();

    let bytes = &report.bytes;
    assert!(contains(bytes, "/Title (Numerology Report)"));
    assert!(contains(bytes, "/Author (Ayla)"));
    assert!(contains(bytes, "/Creator (Astralis)"));
    assert!(contains(bytes, "/Subject (Astralis analysis report (v2.4))"));
    assert!(contains(bytes, "version:2.4; generated:"));
    assert!(contains(
        bytes,
        &format!("/Producer (report-pdf {})", env!("CARGO_PKG_VERSION"))
    ));
}

#[test]
fn failed_author_lookup_uses_default_name() {
    let config = plain_config();
    let lookup = || Err::<String, _>("profile service offline");
    let report = generate(&request(Some(summary_only()), None), &lookup, &config, &mut NoopListener)
        .unwrap();
    assert!(contains(&report.bytes, "/Author (Guest)"));

    let blank = String::from("   ");
    let report = generate(&request(Some(summary_only()), None), &blank, &config, &mut NoopListener)
        .unwrap();
    assert!(contains(&report.bytes, "/Author (Guest)"));
}

#[test]
fn missing_logo_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = ReportConfig {
        logo_path: Some(dir.path().join("no-such-logo.png")),
        ..plain_config()
    };
    let report = generate(&request(Some(summary_only()), None), &"Ayla", &config, &mut NoopListener)
        .unwrap();
    assert_eq!(report.page_count, 2);
    assert!(!contains(&report.bytes, "/Logo Do"));
}

#[test]
fn logo_is_stamped_on_content_pages() {
    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("logo.png");
    image::RgbaImage::from_pixel(16, 16, image::Rgba([180, 40, 120, 255]))
        .save(&logo)
        .unwrap();
    let config = ReportConfig {
        logo_path: Some(logo),
        ..plain_config()
    };
    let report = generate(
        &request(Some(numerology_result()), None),
        &"Ayla",
        &config,
        &mut NoopListener,
    )
    .unwrap();

    assert!(contains(&report.bytes, "/Logo Do"));
    assert!(contains(&report.bytes, "/Subtype /Image"));
}

#[test]
fn compressed_output_is_a_pdf() {
    let config = ReportConfig::default();
    let report = generate(
        &request(Some(numerology_result()), None),
        &"Ayla",
        &config,
        &mut NoopListener,
    )
    .unwrap();
    assert!(report.bytes.starts_with(b"%PDF-"));
    assert!(contains(&report.bytes, "/FlateDecode"));
    assert_eq!(count_pdf_pages(&report.bytes), report.page_count);
}
