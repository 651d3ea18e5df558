use std::f32::consts::PI;

use pdf_writer::Content;

use crate::fonts::FontStyle;
use crate::model::DocumentMetadata;

use super::RenderContext;
use super::layout::{
    Alignment, TextStyle, circle_path, draw_label, draw_lines, fill_rgb, stroke_rgb, wrap_text,
};

const TITLE_WRAP_WIDTH: f32 = 380.0;

/// Page 1. Everything sits at fixed positions relative to the page size.
pub(crate) fn build_cover(ctx: &RenderContext<'_>, meta: &DocumentMetadata) -> Content {
    let config = ctx.config;
    let palette = &config.palette;
    let (w, h) = (config.page.width, config.page.height);
    let cx = w / 2.0;
    let mut content = Content::new();

    content.save_state();
    fill_rgb(&mut content, palette.cover_background);
    content.rect(0.0, 0.0, w, h);
    content.fill_nonzero();

    // layered circles, largest first so the smaller ones sit on top
    let circles = [
        (w * 0.92, h * 0.88, w * 0.42, palette.cover_circles[0]),
        (w * 0.08, h * 0.12, w * 0.36, palette.cover_circles[0]),
        (w * 0.85, h * 0.80, w * 0.24, palette.cover_circles[1]),
        (w * 0.15, h * 0.20, w * 0.18, palette.cover_circles[1]),
        (w * 0.80, h * 0.74, w * 0.10, palette.cover_circles[2]),
    ];
    for (x, y, r, color) in circles {
        fill_rgb(&mut content, color);
        circle_path(&mut content, x, y, r);
        content.fill_nonzero();
    }

    draw_star(&mut content, cx, h * 0.68, 26.0, palette.cover_ornament);
    content.restore_state();

    let title_style = TextStyle {
        face: FontStyle::Bold,
        size: 26.0,
        spacing: 1.15,
        color: palette.cover_text,
    };
    let wrap_width = TITLE_WRAP_WIDTH.min(w - 2.0 * config.margins.left);
    let title_lines = wrap_text(
        &meta.title,
        ctx.fonts.get(FontStyle::Bold),
        title_style.size,
        wrap_width,
    );
    let title_top = h * 0.58;
    let title_h = draw_lines(
        &mut content,
        ctx.fonts,
        &title_lines,
        &title_style,
        cx - wrap_width / 2.0,
        title_top,
        wrap_width,
        Alignment::Center,
    );

    let rule_y = title_top - title_h - 18.0;
    content.save_state();
    stroke_rgb(&mut content, palette.cover_ornament);
    content.set_line_width(0.8);
    content.move_to(cx - 60.0, rule_y);
    content.line_to(cx + 60.0, rule_y);
    content.stroke();
    content.restore_state();

    let author_style = TextStyle {
        face: FontStyle::Regular,
        size: 15.0,
        spacing: 1.0,
        color: palette.cover_text,
    };
    let date_style = TextStyle {
        face: FontStyle::Regular,
        size: 10.0,
        spacing: 1.0,
        color: palette.cover_circles[2],
    };
    draw_label(
        &mut content,
        ctx.fonts,
        &meta.author,
        &author_style,
        0.0,
        rule_y - 16.0,
        w,
        Alignment::Center,
    );
    draw_label(
        &mut content,
        ctx.fonts,
        ctx.date_text,
        &date_style,
        0.0,
        rule_y - 40.0,
        w,
        Alignment::Center,
    );

    let brand_style = TextStyle {
        face: FontStyle::Bold,
        size: 12.0,
        spacing: 1.0,
        color: palette.cover_ornament,
    };
    let version_style = TextStyle {
        face: FontStyle::Regular,
        size: 8.0,
        spacing: 1.0,
        color: palette.cover_circles[2],
    };
    draw_label(
        &mut content,
        ctx.fonts,
        &config.brand,
        &brand_style,
        0.0,
        config.margins.bottom + 40.0,
        w,
        Alignment::Center,
    );
    draw_label(
        &mut content,
        ctx.fonts,
        &format!("v{}", meta.version_tag),
        &version_style,
        0.0,
        config.margins.bottom + 22.0,
        w,
        Alignment::Center,
    );

    content
}

/// Eight-pointed radial ornament.
fn draw_star(content: &mut Content, cx: f32, cy: f32, r: f32, color: [u8; 3]) {
    const POINTS: usize = 8;
    fill_rgb(content, color);
    for i in 0..POINTS * 2 {
        let angle = PI / 2.0 + i as f32 * PI / POINTS as f32;
        let radius = if i % 2 == 0 { r } else { r * 0.38 };
        let (x, y) = (cx + radius * angle.cos(), cy + radius * angle.sin());
        if i == 0 {
            content.move_to(x, y);
        } else {
            content.line_to(x, y);
        }
    }
    content.close_path();
    content.fill_nonzero();

    stroke_rgb(content, color);
    content.set_line_width(0.5);
    for i in 0..POINTS {
        let angle = i as f32 * PI / (POINTS / 2) as f32 + PI / POINTS as f32;
        content.move_to(cx + r * 0.5 * angle.cos(), cy + r * 0.5 * angle.sin());
        content.line_to(cx + r * 1.6 * angle.cos(), cy + r * 1.6 * angle.sin());
    }
    content.stroke();
}
