use pdf_writer::{Pdf, Rect, Ref};

use crate::error::Error;
use crate::fonts::FontStyle;
use crate::model::ContentSection;

use super::RenderContext;
use super::layout::{Alignment, TextStyle, draw_lines, fill_rgb, wrap_text};

const TITLE_GAP: f32 = 6.0;

/// One content section drawn into a reusable Form XObject.
pub(crate) struct RenderedBlock {
    pub(crate) name: String,
    pub(crate) xobject: Ref,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

/// Lay a section out into a fixed-width styled box (accent bar, title, body with
/// its line breaks preserved) and record it once as an XObject. The returned
/// height is the exact height the composer will reserve for it.
pub(crate) fn render_block(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    ctx: &RenderContext<'_>,
    section: &ContentSection,
    index: usize,
) -> Result<RenderedBlock, Error> {
    let config = ctx.config;
    let palette = &config.palette;
    let accent = index % 2;

    let width = config.content_width();
    let pad = config.block_padding;
    let text_x = config.accent_bar_width + pad;
    let text_width = (width - text_x - pad).max(1.0);

    let title_style = TextStyle {
        face: FontStyle::Bold,
        size: config.title_size,
        spacing: 1.1,
        color: palette.title,
    };
    let body_style = TextStyle {
        face: FontStyle::Regular,
        size: config.body_size,
        spacing: config.line_spacing,
        color: palette.body,
    };

    let title_lines = wrap_text(
        &section.title,
        ctx.fonts.get(FontStyle::Bold),
        title_style.size,
        text_width,
    );
    let body_lines = wrap_text(
        &section.body,
        ctx.fonts.get(FontStyle::Regular),
        body_style.size,
        text_width,
    );
    let title_h = title_lines.len() as f32 * title_style.line_height(ctx.fonts);
    let body_h = body_lines.len() as f32 * body_style.line_height(ctx.fonts);
    let height = pad + title_h + TITLE_GAP + body_h + pad;

    let mut mount = ctx.stage.mount("block", width);
    let content = &mut mount.content;

    content.save_state();
    fill_rgb(content, palette.block_fill[accent]);
    content.rect(0.0, 0.0, width, height);
    content.fill_nonzero();
    fill_rgb(content, palette.accent[accent]);
    content.rect(0.0, 0.0, config.accent_bar_width, height);
    content.fill_nonzero();
    content.restore_state();

    let mut top = height - pad;
    top -= draw_lines(
        content,
        ctx.fonts,
        &title_lines,
        &title_style,
        text_x,
        top,
        text_width,
        Alignment::Left,
    );

    // thin rule under the title in the accent color
    content.save_state();
    fill_rgb(content, palette.accent[accent]);
    content.rect(text_x, top - TITLE_GAP / 2.0 - 0.25, text_width.min(48.0), 0.5);
    content.fill_nonzero();
    content.restore_state();
    top -= TITLE_GAP;

    draw_lines(
        content,
        ctx.fonts,
        &body_lines,
        &body_style,
        text_x,
        top,
        text_width,
        Alignment::Left,
    );

    let ops = mount.finish();
    let xobject = alloc();
    let name = format!("Blk{}", index + 1);
    super::write_form(
        pdf,
        xobject,
        &ops,
        Rect::new(0.0, 0.0, width, height),
        ctx,
        &[],
    )?;

    log::debug!(
        "render_block #{index} '{}': {} title + {} body lines → {height:.1}pt",
        section.title,
        title_lines.len(),
        body_lines.len(),
    );

    Ok(RenderedBlock {
        name,
        xobject,
        width,
        height,
    })
}
