use pdf_writer::{Content, Name, Pdf, Ref};

use crate::config::ReportConfig;
use crate::fonts::FontStyle;

use super::RenderContext;
use super::images::{EmbeddedImage, embed_image};
use super::layout::{Alignment, TextStyle, draw_label, fill_rgb};

/// Load the configured logo once per document. Any failure is logged and the
/// pages are stamped without it.
pub(crate) fn load_logo(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    config: &ReportConfig,
) -> Option<EmbeddedImage> {
    let path = config.logo_path.as_ref()?;
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("Logo {} unavailable: {e}; continuing without it", path.display());
            return None;
        }
    };
    match embed_image(pdf, alloc, "Logo".to_string(), &data) {
        Ok(img) => Some(img),
        Err(e) => {
            log::warn!("Logo {} could not be decoded: {e}; continuing without it", path.display());
            None
        }
    }
}

/// Stamp logo, brand, date and "Page X / N" into the header and footer strips.
/// Nothing here touches the content band, so it can run before or after the
/// page's blocks are drawn.
pub(crate) fn decorate_page(
    content: &mut Content,
    ctx: &RenderContext<'_>,
    page_number: usize,
    total_pages: usize,
) {
    let config = ctx.config;
    let palette = &config.palette;
    let page_h = config.page.height;
    let left = config.margins.left;
    let width = config.content_width();

    let header_top = page_h - config.margins.top;
    let header_bottom = header_top - config.header_band;
    let logo_size = config.logo_size.min(config.header_band - 4.0).max(0.0);

    let mut brand_x = left;
    if let Some(logo) = ctx.logo
        && logo_size > 0.0
    {
        let logo_h = logo_size * logo.aspect();
        let logo_y = header_bottom + (config.header_band - logo_h) / 2.0;
        content.save_state();
        content.transform([logo_size, 0.0, 0.0, logo_h, left, logo_y]);
        content.x_object(Name(logo.name.as_bytes()));
        content.restore_state();
        brand_x += logo_size + 6.0;
    }

    let stamp = TextStyle {
        face: FontStyle::Bold,
        size: 9.0,
        spacing: 1.0,
        color: palette.title,
    };
    let muted = TextStyle {
        face: FontStyle::Regular,
        size: 8.0,
        spacing: 1.0,
        color: palette.muted,
    };
    let header_text_top = header_bottom + config.header_band / 2.0 + 5.0;
    draw_label(
        content,
        ctx.fonts,
        &config.brand,
        &stamp,
        brand_x,
        header_text_top,
        width - (brand_x - left),
        Alignment::Left,
    );
    draw_label(
        content,
        ctx.fonts,
        ctx.date_text,
        &muted,
        left,
        header_text_top,
        width,
        Alignment::Right,
    );

    content.save_state();
    fill_rgb(content, palette.accent[0]);
    content.rect(left, header_bottom + 2.0, width, 0.6);
    content.fill_nonzero();
    content.restore_state();

    let footer_top = config.margins.bottom + config.footer_band;
    content.save_state();
    fill_rgb(content, palette.muted);
    content.rect(left, footer_top - 6.0, width, 0.4);
    content.fill_nonzero();
    content.restore_state();

    let label = config.format_page_label(page_number, total_pages);
    draw_label(
        content,
        ctx.fonts,
        &label,
        &muted,
        left,
        footer_top - 12.0,
        width,
        Alignment::Center,
    );
}
