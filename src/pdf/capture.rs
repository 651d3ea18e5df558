use std::collections::HashMap;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use pdf_writer::{Content, Name, Pdf, Rect, Ref};

use crate::assets::AssetLoader;
use crate::config::CAPTURE_EDGE_PADDING;
use crate::error::Error;
use crate::fonts::FontStyle;
use crate::model::{NodeKind, VisualNode};

use super::RenderContext;
use super::images::{EmbeddedImage, embed_image};
use super::layout::{Alignment, TextLine, TextStyle, draw_lines, fill_rgb, wrap_text};

const NODE_SPACING: f32 = 10.0;
const CHILD_INDENT: f32 = 16.0;

/// The whole view drawn once as a single tall XObject, in capture units.
pub(crate) struct Capture {
    pub(crate) name: String,
    pub(crate) xobject: Ref,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

/// Deep-clone the view and make it print-ready: everything hidden, collapsed
/// or clamped is opened up, and share controls are removed. The caller's tree
/// is left untouched.
pub(crate) fn prepare_view(node: &VisualNode) -> VisualNode {
    let mut clone = node.clone();
    expand(&mut clone);
    strip_share_controls(&mut clone);
    clone
}

fn expand(node: &mut VisualNode) {
    node.hidden = false;
    node.collapsed = false;
    node.line_clamp = None;
    node.max_height = None;
    if node.open == Some(false) {
        node.open = Some(true);
    }
    node.children.iter_mut().for_each(expand);
}

fn strip_share_controls(node: &mut VisualNode) {
    node.children.retain(|c| c.kind != NodeKind::Share);
    node.children.iter_mut().for_each(strip_share_controls);
}

pub(crate) fn collect_text<'a>(node: &'a VisualNode, out: &mut Vec<&'a str>) {
    if let Some(text) = &node.text {
        out.push(text);
    }
    for child in &node.children {
        collect_text(child, out);
    }
}

fn collect_image_sources(node: &VisualNode, out: &mut Vec<String>) {
    if let NodeKind::Image { src, .. } = &node.kind
        && !out.contains(src)
    {
        out.push(src.clone());
    }
    for child in &node.children {
        collect_image_sources(child, out);
    }
}

/// Load every image the view shows, waiting at most `budget` in total. Loads
/// run on a worker thread; whatever has not arrived by the deadline is dropped
/// with a warning, and broken images likewise. Capture never fails on them.
fn load_images(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    node: &VisualNode,
    assets: &Arc<dyn AssetLoader>,
    budget: Duration,
) -> HashMap<String, EmbeddedImage> {
    let mut sources = Vec::new();
    collect_image_sources(node, &mut sources);
    let mut loaded = HashMap::new();
    if sources.is_empty() {
        return loaded;
    }

    let t0 = Instant::now();
    let deadline = t0.checked_add(budget);
    let requested = sources.len();
    let (tx, rx) = mpsc::channel();
    let worker_assets = Arc::clone(assets);
    let worker_sources = sources.clone();
    thread::spawn(move || {
        for src in worker_sources {
            let data = worker_assets.load(&src);
            if tx.send((src, data)).is_err() {
                break;
            }
        }
    });

    let mut pending: Vec<String> = sources;
    while !pending.is_empty() {
        let remaining = deadline.map_or(Duration::MAX, |d| {
            d.saturating_duration_since(Instant::now())
        });
        let Ok((src, data)) = rx.recv_timeout(remaining) else {
            break;
        };
        pending.retain(|p| *p != src);
        let data = match data {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Image {src} unavailable: {e}; capturing without it");
                continue;
            }
        };
        let name = format!("Cap{}", loaded.len() + 1);
        match embed_image(pdf, alloc, name, &data) {
            Ok(img) => {
                loaded.insert(src, img);
            }
            Err(e) => log::warn!("Image {src} could not be decoded: {e}; capturing without it"),
        }
    }
    for src in &pending {
        log::warn!("Image budget of {budget:?} exhausted; skipping {src}");
    }

    log::debug!(
        "load_images: {}/{requested} loaded in {:.1}ms",
        loaded.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );
    loaded
}

enum Item {
    Text {
        lines: Vec<TextLine>,
        style: TextStyle,
        x: f32,
        top: f32,
        width: f32,
    },
    Image {
        name: String,
        x: f32,
        top: f32,
        width: f32,
        height: f32,
    },
    Rule {
        x: f32,
        top: f32,
        width: f32,
    },
}

struct FlowLayout<'a, 'c> {
    ctx: &'a RenderContext<'c>,
    images: &'a HashMap<String, EmbeddedImage>,
    /// Capture units per printed point, so text prints at the configured size.
    scale_up: f32,
    items: Vec<Item>,
    cursor: f32,
}

impl FlowLayout<'_, '_> {
    fn text_style(&self, kind: &NodeKind) -> TextStyle {
        let palette = &self.ctx.config.palette;
        match kind {
            NodeKind::Heading { level } => TextStyle {
                face: FontStyle::Bold,
                size: self.scale_up
                    * match level {
                        1 => 20.0,
                        2 => 16.0,
                        3 => 13.0,
                        _ => 11.5,
                    },
                spacing: 1.15,
                color: palette.title,
            },
            _ => TextStyle {
                face: FontStyle::Regular,
                size: self.scale_up * self.ctx.config.body_size,
                spacing: self.ctx.config.line_spacing,
                color: palette.body,
            },
        }
    }

    fn node(&mut self, node: &VisualNode, x: f32, width: f32, depth: usize) {
        match &node.kind {
            NodeKind::Image {
                src,
                width: want_w,
                height: want_h,
            } => {
                if let Some(img) = self.images.get(src) {
                    let w = want_w
                        .map(|w| w * self.scale_up)
                        .unwrap_or(img.pixel_width as f32)
                        .min(width);
                    let h = want_h
                        .map(|h| h * self.scale_up)
                        .unwrap_or(w * img.aspect());
                    self.items.push(Item::Image {
                        name: img.name.clone(),
                        x,
                        top: self.cursor,
                        width: w,
                        height: h,
                    });
                    self.cursor += h + NODE_SPACING;
                }
            }
            NodeKind::Divider => {
                self.items.push(Item::Rule {
                    x,
                    top: self.cursor,
                    width,
                });
                self.cursor += NODE_SPACING;
            }
            kind => {
                if let Some(text) = node.text.as_deref().filter(|t| !t.trim().is_empty()) {
                    let style = self.text_style(kind);
                    let lines = wrap_text(text, self.ctx.fonts.get(style.face), style.size, width);
                    let h = lines.len() as f32 * style.line_height(self.ctx.fonts);
                    self.items.push(Item::Text {
                        lines,
                        style,
                        x,
                        top: self.cursor,
                        width,
                    });
                    self.cursor += h + NODE_SPACING;
                }
            }
        }

        let indent = if depth == 0 { 0.0 } else { CHILD_INDENT };
        for child in &node.children {
            self.node(child, x + indent, (width - indent).max(1.0), depth + 1);
        }
    }
}

/// Flow a prepared view (see [`prepare_view`]) top to bottom. Every node is
/// shown; nothing is hidden, clamped or collapsed any more.
fn layout_view(
    ctx: &RenderContext<'_>,
    node: &VisualNode,
    images: &HashMap<String, EmbeddedImage>,
) -> (Vec<Item>, f32) {
    let config = ctx.config;
    let mut flow = FlowLayout {
        ctx,
        images,
        scale_up: config.capture_width / config.content_width(),
        items: Vec::new(),
        cursor: CAPTURE_EDGE_PADDING,
    };
    let inner_width = config.capture_width - 2.0 * CAPTURE_EDGE_PADDING;
    flow.node(node, CAPTURE_EDGE_PADDING, inner_width, 0);
    let height = flow.cursor + CAPTURE_EDGE_PADDING;
    (flow.items, height)
}

/// Mount the prepared view off-screen at the capture width, lay it out with
/// unconstrained height and draw it once into a single tall XObject.
pub(crate) fn capture_view(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    ctx: &RenderContext<'_>,
    view: &VisualNode,
    assets: &Arc<dyn AssetLoader>,
) -> Result<Capture, Error> {
    let config = ctx.config;
    let width = config.capture_width;
    let mut mount = ctx.stage.mount("capture", width);

    let budget = Duration::from_millis(config.capture_asset_budget_ms);
    let images = load_images(pdf, alloc, view, assets, budget);
    let (items, height) = layout_view(ctx, view, &images);

    let content = &mut mount.content;
    content.save_state();
    fill_rgb(content, config.palette.page_background);
    content.rect(0.0, 0.0, width, height);
    content.fill_nonzero();
    content.restore_state();

    for item in &items {
        draw_item(content, ctx, item, height);
    }

    let ops = mount.finish();
    let xobject = alloc();
    let mut image_pairs: Vec<(&str, Ref)> = images
        .values()
        .map(|img| (img.name.as_str(), img.xobject))
        .collect();
    image_pairs.sort_by_key(|&(name, _)| name);
    super::write_form(
        pdf,
        xobject,
        &ops,
        Rect::new(0.0, 0.0, width, height),
        ctx,
        &image_pairs,
    )?;

    log::debug!(
        "capture_view: {} items, {} images, {width:.0}x{height:.0}",
        items.len(),
        images.len()
    );

    Ok(Capture {
        name: "View".to_string(),
        xobject,
        width,
        height,
    })
}

fn draw_item(content: &mut Content, ctx: &RenderContext<'_>, item: &Item, height: f32) {
    match item {
        Item::Text {
            lines,
            style,
            x,
            top,
            width,
        } => {
            draw_lines(
                content,
                ctx.fonts,
                lines,
                style,
                *x,
                height - top,
                *width,
                Alignment::Left,
            );
        }
        Item::Image {
            name,
            x,
            top,
            width,
            height: img_h,
        } => {
            content.save_state();
            content.transform([*width, 0.0, 0.0, *img_h, *x, height - top - img_h]);
            content.x_object(Name(name.as_bytes()));
            content.restore_state();
        }
        Item::Rule { x, top, width } => {
            content.save_state();
            fill_rgb(content, ctx.config.palette.muted);
            content.rect(*x, height - top - 1.0, *width, 1.0);
            content.fill_nonzero();
            content.restore_state();
        }
    }
}
