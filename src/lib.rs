mod assets;
mod config;
mod error;
mod extract;
mod fonts;
mod model;
mod package;
mod pdf;
mod stage;

pub use assets::{AssetLoader, FsAssetLoader};
pub use config::{Margins, PageSize, Palette, ReportConfig};
pub use error::Error;
pub use extract::extract_sections;
pub use model::{
    AnalysisCategory, ContentSection, DocumentMetadata, NodeKind, Notice, Progress, Report,
    StrategyKind, VisualNode,
};
pub use package::{sanitize_title, suggested_filename, write_report};
pub use pdf::paginate::{PageGeometry, Placement, count_pages, pages_opened, place_blocks};

use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use serde_json::Value;

use pdf::Strategy;

/// Everything one document is generated from.
#[derive(Clone, Debug)]
pub struct ReportRequest {
    /// Loosely typed analysis result; `None` or an empty object means there
    /// is no structured content.
    pub analysis: Option<Value>,
    pub category: AnalysisCategory,
    pub title: String,
    /// Snapshot of the on-screen view, captured when no sections are found.
    pub fallback: Option<VisualNode>,
}

/// Looks up the display name printed on the cover.
pub trait NameResolver {
    fn display_name(&self) -> Result<String, String>;
}

impl<F, E> NameResolver for F
where
    F: Fn() -> Result<String, E>,
    E: Display,
{
    fn display_name(&self) -> Result<String, String> {
        self().map_err(|e| e.to_string())
    }
}

impl NameResolver for &str {
    fn display_name(&self) -> Result<String, String> {
        Ok(self.to_string())
    }
}

impl NameResolver for String {
    fn display_name(&self) -> Result<String, String> {
        Ok(self.clone())
    }
}

/// Receives progress and the user-facing start/success/failure notices.
pub trait ReportListener {
    fn progress(&mut self, _progress: Progress) {}
    fn notice(&mut self, _notice: Notice) {}
}

pub struct NoopListener;

impl ReportListener for NoopListener {}

/// Forwards progress to the listener, never letting the percentage go back.
struct ProgressTracker<'a> {
    listener: &'a mut dyn ReportListener,
    last: u8,
}

impl ProgressTracker<'_> {
    fn report(&mut self, percent: u8, step: &'static str) {
        let percent = percent.clamp(self.last, 100);
        self.last = percent;
        self.listener.progress(Progress { percent, step });
    }
}

/// Generate a report, loading capture images from the working directory.
pub fn generate(
    request: &ReportRequest,
    author: &dyn NameResolver,
    config: &ReportConfig,
    listener: &mut dyn ReportListener,
) -> Result<Report, Error> {
    let assets: Arc<dyn AssetLoader> = Arc::new(FsAssetLoader::new("."));
    generate_with_assets(request, author, config, assets, listener)
}

/// Generate a report. The listener sees exactly one `Started` notice and then
/// exactly one of `Succeeded` or `Failed`; on failure nothing is returned.
pub fn generate_with_assets(
    request: &ReportRequest,
    author: &dyn NameResolver,
    config: &ReportConfig,
    assets: Arc<dyn AssetLoader>,
    listener: &mut dyn ReportListener,
) -> Result<Report, Error> {
    listener.notice(Notice::Started);
    let mut tracker = ProgressTracker { listener, last: 0 };
    let result = run(request, author, config, &assets, &mut tracker);
    match &result {
        Ok(report) => tracker.listener.notice(Notice::Succeeded {
            filename: report.filename.clone(),
        }),
        Err(e) => {
            log::error!("Report generation failed: {e}");
            tracker.listener.notice(Notice::Failed);
        }
    }
    result
}

fn run(
    request: &ReportRequest,
    author: &dyn NameResolver,
    config: &ReportConfig,
    assets: &Arc<dyn AssetLoader>,
    tracker: &mut ProgressTracker<'_>,
) -> Result<Report, Error> {
    let t0 = Instant::now();
    config.validate()?;
    tracker.report(5, "Preparing content");

    let sections = match &request.analysis {
        Some(analysis) => extract_sections(analysis, request.category, &config.summary_title),
        None => Vec::new(),
    };
    let strategy = Strategy::choose(sections, request.fallback.as_ref())?;
    let kind = strategy.kind();
    log::debug!("Strategy: {kind:?}");

    let meta = DocumentMetadata {
        title: request.title.clone(),
        author: resolve_author(author, config),
        generated_at: Local::now(),
        version_tag: config.version_tag.clone(),
    };
    let t_prepare = t0.elapsed();

    let composed = pdf::render(strategy, &meta, config, assets, &mut |percent, step| {
        tracker.report(percent, step)
    })?;
    let t_render = t0.elapsed();

    let filename = suggested_filename(&meta.title, &meta.generated_at);
    tracker.report(100, "Done");

    log::info!(
        "Timing: prepare={:.1}ms, render={:.1}ms, total={:.1}ms (output {} bytes, {} pages)",
        t_prepare.as_secs_f64() * 1000.0,
        (t_render - t_prepare).as_secs_f64() * 1000.0,
        t0.elapsed().as_secs_f64() * 1000.0,
        composed.bytes.len(),
        composed.page_count,
    );

    Ok(Report {
        bytes: composed.bytes,
        filename,
        page_count: composed.page_count,
        content_pages: composed.content_pages,
        strategy: kind,
    })
}

fn resolve_author(author: &dyn NameResolver, config: &ReportConfig) -> String {
    match author.display_name() {
        Ok(name) if !name.trim().is_empty() => name.trim().to_string(),
        Ok(_) => {
            log::warn!("Author name is empty, using {:?}", config.default_author);
            config.default_author.clone()
        }
        Err(e) => {
            log::warn!("Author lookup failed ({e}), using {:?}", config.default_author);
            config.default_author.clone()
        }
    }
}
