use pdf_writer::{Content, Name};

use crate::fonts::{FontEntry, FontSet, FontStyle};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Alignment {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct TextStyle {
    pub(crate) face: FontStyle,
    pub(crate) size: f32,
    /// Multiplier on the face's natural line height.
    pub(crate) spacing: f32,
    pub(crate) color: [u8; 3],
}

impl TextStyle {
    pub(crate) fn line_height(&self, fonts: &FontSet) -> f32 {
        fonts.get(self.face).line_height(self.size) * self.spacing
    }
}

pub(crate) struct TextLine {
    pub(crate) text: String,
    pub(crate) width: f32,
}

/// Greedy word wrap. Explicit `\n` always starts a new line and blank lines are
/// kept, so paragraph breaks in the source survive. A word wider than the line
/// is broken between characters rather than allowed to overflow.
pub(crate) fn wrap_text(text: &str, font: &FontEntry, size: f32, max_width: f32) -> Vec<TextLine> {
    let space_w = font.text_width(" ", size);
    let mut lines = Vec::new();

    for raw_line in text.lines() {
        let mut current = String::new();
        let mut current_w = 0.0f32;

        for word in raw_line.split_whitespace() {
            let word_w = font.text_width(word, size);
            let proposed = if current.is_empty() {
                word_w
            } else {
                current_w + space_w + word_w
            };
            if proposed <= max_width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_w = proposed;
                continue;
            }
            if !current.is_empty() {
                lines.push(TextLine {
                    text: std::mem::take(&mut current),
                    width: current_w,
                });
                current_w = 0.0;
            }
            if word_w <= max_width {
                current.push_str(word);
                current_w = word_w;
            } else {
                for ch in word.chars() {
                    let ch_w = font.text_width(ch.encode_utf8(&mut [0; 4]), size);
                    if !current.is_empty() && current_w + ch_w > max_width {
                        lines.push(TextLine {
                            text: std::mem::take(&mut current),
                            width: current_w,
                        });
                        current_w = 0.0;
                    }
                    current.push(ch);
                    current_w += ch_w;
                }
            }
        }

        lines.push(TextLine {
            text: current,
            width: current_w,
        });
    }

    lines
}

/// Draw pre-wrapped lines with their first line's top edge at `top` (PDF space).
/// Returns the height consumed.
pub(crate) fn draw_lines(
    content: &mut Content,
    fonts: &FontSet,
    lines: &[TextLine],
    style: &TextStyle,
    x: f32,
    top: f32,
    width: f32,
    alignment: Alignment,
) -> f32 {
    let font = fonts.get(style.face);
    let line_h = style.line_height(fonts);
    let [r, g, b] = style.color;

    content.save_state();
    content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    content.begin_text();
    content.set_font(Name(font.pdf_name.as_bytes()), style.size);

    let mut td_x = 0.0f32;
    let mut td_y = 0.0f32;
    for (i, line) in lines.iter().enumerate() {
        if line.text.is_empty() {
            continue;
        }
        let line_x = match alignment {
            Alignment::Left => x,
            Alignment::Center => x + (width - line.width) / 2.0,
            Alignment::Right => x + width - line.width,
        };
        let baseline = top - font.ascent(style.size) - i as f32 * line_h;
        content.next_line(line_x - td_x, baseline - td_y);
        td_x = line_x;
        td_y = baseline;
        font.show(content, &line.text);
    }

    content.end_text();
    content.restore_state();
    lines.len() as f32 * line_h
}

/// Single-line convenience for stamps and labels.
pub(crate) fn draw_label(
    content: &mut Content,
    fonts: &FontSet,
    text: &str,
    style: &TextStyle,
    x: f32,
    top: f32,
    width: f32,
    alignment: Alignment,
) {
    let font = fonts.get(style.face);
    let line = TextLine {
        text: text.to_string(),
        width: font.text_width(text, style.size),
    };
    draw_lines(content, fonts, &[line], style, x, top, width, alignment);
}

pub(crate) fn fill_rgb(content: &mut Content, color: [u8; 3]) {
    content.set_fill_rgb(
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
    );
}

pub(crate) fn stroke_rgb(content: &mut Content, color: [u8; 3]) {
    content.set_stroke_rgb(
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
    );
}

/// Circle approximated by four cubic Béziers.
pub(crate) fn circle_path(content: &mut Content, cx: f32, cy: f32, r: f32) {
    const K: f32 = 0.552_284_8;
    let k = r * K;
    content.move_to(cx + r, cy);
    content.cubic_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r);
    content.cubic_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy);
    content.cubic_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r);
    content.cubic_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy);
    content.close_path();
}
