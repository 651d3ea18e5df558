mod block;
mod capture;
mod cover;
mod decorate;
mod images;
mod layout;
pub(crate) mod paginate;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref};

use crate::assets::AssetLoader;
use crate::config::ReportConfig;
use crate::error::Error;
use crate::fonts::FontSet;
use crate::model::{ContentSection, DocumentMetadata, StrategyKind, VisualNode};
use crate::package::write_document_info;
use crate::stage::Stage;

use block::{RenderedBlock, render_block};
use capture::{capture_view, collect_text, prepare_view};
use cover::build_cover;
use decorate::{decorate_page, load_logo};
use images::EmbeddedImage;
use paginate::{PageGeometry, count_pages, pages_opened, place_blocks, slice_count};

/// Shared, read-only state for everything that draws.
pub(crate) struct RenderContext<'a> {
    pub(crate) config: &'a ReportConfig,
    pub(crate) fonts: &'a FontSet,
    pub(crate) stage: &'a Stage,
    pub(crate) logo: Option<&'a EmbeddedImage>,
    pub(crate) date_text: &'a str,
}

/// How content pages are produced; decided once per document.
pub(crate) enum Strategy<'a> {
    Structured(Vec<ContentSection>),
    Capture(&'a VisualNode),
}

impl<'a> Strategy<'a> {
    pub(crate) fn choose(
        sections: Vec<ContentSection>,
        fallback: Option<&'a VisualNode>,
    ) -> Result<Self, Error> {
        if !sections.is_empty() {
            return Ok(Strategy::Structured(sections));
        }
        fallback.map(Strategy::Capture).ok_or(Error::NothingToRender)
    }

    pub(crate) fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Structured(_) => StrategyKind::Structured,
            Strategy::Capture(_) => StrategyKind::Capture,
        }
    }
}

pub(crate) struct Composed {
    pub(crate) bytes: Vec<u8>,
    pub(crate) page_count: usize,
    pub(crate) content_pages: usize,
}

struct PageOut {
    content: Content,
    xobjects: Vec<(String, Ref)>,
}

impl PageOut {
    fn new(content: Content) -> Self {
        Self {
            content,
            xobjects: Vec::new(),
        }
    }
}

pub(crate) fn geometry(config: &ReportConfig) -> PageGeometry {
    PageGeometry {
        top: config.content_top(),
        limit: config.content_bottom(),
        gap: config.block_gap,
    }
}

fn compress(config: &ReportConfig, raw: &[u8]) -> Option<Vec<u8>> {
    config
        .compress_streams
        .then(|| miniz_oxide::deflate::compress_to_vec_zlib(raw, 6))
}

/// Write drawn operations as a Form XObject with the report fonts (and any
/// images it paints) as resources.
fn write_form(
    pdf: &mut Pdf,
    id: Ref,
    ops: &[u8],
    bbox: Rect,
    ctx: &RenderContext<'_>,
    images: &[(&str, Ref)],
) -> Result<(), Error> {
    let (w, h) = (bbox.x2 - bbox.x1, bbox.y2 - bbox.y1);
    if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        return Err(Error::Pdf(format!("degenerate XObject bounds {w}x{h}")));
    }

    let compressed = compress(ctx.config, ops);
    let mut form = pdf.form_xobject(id, compressed.as_deref().unwrap_or(ops));
    form.bbox(bbox);
    if compressed.is_some() {
        form.filter(Filter::FlateDecode);
    }
    let mut resources = form.resources();
    {
        let mut fonts = resources.fonts();
        for (name, font_ref) in ctx.fonts.resource_pairs() {
            fonts.pair(Name(name.as_bytes()), font_ref);
        }
    }
    if !images.is_empty() {
        let mut xobjects = resources.x_objects();
        for (name, xobj_ref) in images {
            xobjects.pair(Name(name.as_bytes()), *xobj_ref);
        }
    }
    Ok(())
}

fn used_chars(
    strategy: &Strategy<'_>,
    meta: &DocumentMetadata,
    config: &ReportConfig,
    date_text: &str,
) -> BTreeSet<char> {
    let mut chars: BTreeSet<char> = BTreeSet::new();
    for text in [
        meta.title.as_str(),
        meta.author.as_str(),
        meta.version_tag.as_str(),
        config.brand.as_str(),
        config.page_label.as_str(),
        date_text,
        "v0123456789 /",
    ] {
        chars.extend(text.chars());
    }
    match strategy {
        Strategy::Structured(sections) => {
            for s in sections {
                chars.extend(s.title.chars());
                chars.extend(s.body.chars());
            }
        }
        Strategy::Capture(view) => {
            let mut texts = Vec::new();
            collect_text(view, &mut texts);
            for t in texts {
                chars.extend(t.chars());
            }
        }
    }
    chars
}

/// Compose the whole document: cover, content pages for the chosen strategy,
/// decoration, and the final PDF object graph. Any error aborts the document.
pub(crate) fn render(
    strategy: Strategy<'_>,
    meta: &DocumentMetadata,
    config: &ReportConfig,
    assets: &Arc<dyn AssetLoader>,
    progress: &mut dyn FnMut(u8, &'static str),
) -> Result<Composed, Error> {
    let t0 = Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    // The fallback draws a prepared clone; the caller's view is never mutated.
    let prepared;
    let strategy = match strategy {
        Strategy::Capture(view) => {
            prepared = prepare_view(view);
            Strategy::Capture(&prepared)
        }
        structured => structured,
    };

    let date_text = meta.generated_at.format(&config.date_format).to_string();
    let chars = used_chars(&strategy, meta, config, &date_text);
    let fonts = FontSet::register(&mut pdf, &mut alloc, config.font_family.as_deref(), &chars);
    let logo = load_logo(&mut pdf, &mut alloc, config);
    let t_assets = t0.elapsed();

    let stage = Stage::new();
    let ctx = RenderContext {
        config,
        fonts: &fonts,
        stage: &stage,
        logo: logo.as_ref(),
        date_text: &date_text,
    };

    let mut pages = vec![PageOut::new(build_cover(&ctx, meta))];
    let content_pages = match &strategy {
        Strategy::Structured(sections) => {
            compose_sections(&mut pdf, &mut alloc, &ctx, sections, &mut pages, progress)?
        }
        Strategy::Capture(view) => {
            compose_capture(&mut pdf, &mut alloc, &ctx, view, assets, &mut pages, progress)?
        }
    };
    let t_layout = t0.elapsed();

    progress(95, "Finalizing");
    let page_count = pages.len();
    let page_ids: Vec<Ref> = (0..page_count).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..page_count).map(|_| alloc()).collect();

    let font_pairs = fonts.resource_pairs();
    for (i, page) in pages.into_iter().enumerate() {
        let raw = page.content.finish();
        match compress(config, raw.as_slice()) {
            Some(data) => {
                pdf.stream(content_ids[i], &data).filter(Filter::FlateDecode);
            }
            None => {
                pdf.stream(content_ids[i], raw.as_slice());
            }
        }

        let mut pdf_page = pdf.page(page_ids[i]);
        pdf_page
            .media_box(Rect::new(0.0, 0.0, config.page.width, config.page.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = pdf_page.resources();
        {
            let mut fonts = resources.fonts();
            for (name, font_ref) in font_pairs {
                fonts.pair(Name(name.as_bytes()), font_ref);
            }
        }
        if !page.xobjects.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &page.xobjects {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_count as i32);
    write_document_info(&mut pdf, info_id, meta, config);

    let bytes = pdf.finish();
    let t_total = t0.elapsed();
    log::info!(
        "Render phases: fonts+assets={:.1}ms, layout={:.1}ms, assembly={:.1}ms ({page_count} pages, peak stage mounts {})",
        t_assets.as_secs_f64() * 1000.0,
        (t_layout - t_assets).as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        stage.peak(),
    );
    debug_assert_eq!(stage.live(), 0);

    Ok(Composed {
        bytes,
        page_count,
        content_pages,
    })
}

/// Structured path: measure every block once, estimate the page count from
/// those heights, then place the very same heights and draw.
fn compose_sections(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    ctx: &RenderContext<'_>,
    sections: &[ContentSection],
    pages: &mut Vec<PageOut>,
    progress: &mut dyn FnMut(u8, &'static str),
) -> Result<usize, Error> {
    let config = ctx.config;
    progress(10, "Rendering sections");

    let mut blocks: Vec<RenderedBlock> = Vec::with_capacity(sections.len());
    for (i, section) in sections.iter().enumerate() {
        blocks.push(render_block(pdf, alloc, ctx, section, i)?);
        progress(10 + (40 * (i + 1) / sections.len()) as u8, "Rendering sections");
    }
    let heights: Vec<f32> = blocks.iter().map(|b| b.height).collect();

    progress(55, "Estimating pages");
    let geometry = geometry(config);
    let estimated = count_pages(&heights, &geometry);
    let total_pages = estimated + 1;
    log::debug!("compose_sections: {} blocks → {estimated} content pages", blocks.len());

    progress(60, "Drawing pages");
    let placements = place_blocks(&heights, &geometry);
    let first_content = pages.len();
    for placement in &placements {
        if placement.page + first_content >= pages.len() {
            let page_number = pages.len() + 1;
            let mut content = Content::new();
            decorate_page(&mut content, ctx, page_number, total_pages);
            pages.push(page_with_logo(content, ctx));
            progress(
                60 + (30 * (placement.page + 1) / estimated.max(1)) as u8,
                "Drawing pages",
            );
        }
        let block = &blocks[placement.block];
        let page = pages
            .last_mut()
            .ok_or_else(|| Error::Layout("no open page".into()))?;
        log::trace!(
            "place {} ({:.1}x{:.1}) on content page {} at y={:.1}",
            block.name,
            block.width,
            block.height,
            placement.page + 1,
            placement.y
        );
        let y_bottom = config.page.height - placement.y - block.height;
        page.content.save_state();
        page.content
            .transform([1.0, 0.0, 0.0, 1.0, config.margins.left, y_bottom]);
        page.content.x_object(Name(block.name.as_bytes()));
        page.content.restore_state();
        page.xobjects.push((block.name.clone(), block.xobject));
    }

    let drawn = pages_opened(&placements);
    if drawn != estimated || pages.len() - first_content != estimated {
        return Err(Error::Layout(format!(
            "estimated {estimated} content pages but placed {drawn}"
        )));
    }
    Ok(estimated)
}

/// Fallback path: one tall capture, shown through a page-sized window that
/// moves down by one content height per page.
fn compose_capture(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    ctx: &RenderContext<'_>,
    view: &VisualNode,
    assets: &Arc<dyn AssetLoader>,
    pages: &mut Vec<PageOut>,
    progress: &mut dyn FnMut(u8, &'static str),
) -> Result<usize, Error> {
    let config = ctx.config;
    progress(10, "Capturing view");
    let capture = capture_view(pdf, alloc, ctx, view, assets)?;

    progress(55, "Estimating pages");
    let scale = config.content_width() / capture.width;
    let scaled_height = capture.height * scale;
    let window = config.content_height();
    let slices = slice_count(scaled_height, window);
    let total_pages = slices + 1;
    log::debug!(
        "compose_capture: {:.0}pt tall at scale {scale:.3} → {slices} pages",
        scaled_height
    );

    progress(60, "Drawing pages");
    let band_top = config.page.height - config.content_top();
    let band_bottom = config.page.height - config.content_bottom();
    for i in 0..slices {
        let page_number = pages.len() + 1;
        let mut content = Content::new();
        decorate_page(&mut content, ctx, page_number, total_pages);

        let y0 = band_top - scaled_height + i as f32 * window;
        content.save_state();
        content.rect(config.margins.left, band_bottom, config.content_width(), window);
        content.clip_nonzero();
        content.end_path();
        content.transform([scale, 0.0, 0.0, scale, config.margins.left, y0]);
        content.x_object(Name(capture.name.as_bytes()));
        content.restore_state();

        let mut page = page_with_logo(content, ctx);
        page.xobjects.push((capture.name.clone(), capture.xobject));
        pages.push(page);
        progress(60 + (30 * (i + 1) / slices) as u8, "Drawing pages");
    }
    Ok(slices)
}

fn page_with_logo(content: Content, ctx: &RenderContext<'_>) -> PageOut {
    let mut page = PageOut::new(content);
    if let Some(logo) = ctx.logo {
        page.xobjects.push((logo.name.clone(), logo.xobject));
    }
    page
}
