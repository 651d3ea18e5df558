use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

use crate::error::Error;

/// Blank margin around a captured view, in capture units, on every side.
pub(crate) const CAPTURE_EDGE_PADDING: f32 = 24.0;

/// Page size in points. Defaults to A4 portrait.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl Default for PageSize {
    fn default() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 28.0,
            bottom: 28.0,
            left: 42.0,
            right: 42.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Palette {
    pub page_background: [u8; 3],
    pub block_fill: [[u8; 3]; 2],
    pub accent: [[u8; 3]; 2],
    pub title: [u8; 3],
    pub body: [u8; 3],
    pub muted: [u8; 3],
    pub cover_background: [u8; 3],
    pub cover_circles: [[u8; 3]; 3],
    pub cover_ornament: [u8; 3],
    pub cover_text: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            page_background: [255, 255, 255],
            block_fill: [[246, 243, 252], [252, 246, 240]],
            accent: [[124, 77, 255], [230, 126, 34]],
            title: [44, 31, 84],
            body: [51, 51, 51],
            muted: [136, 136, 136],
            cover_background: [28, 20, 56],
            cover_circles: [[58, 41, 112], [79, 56, 150], [104, 75, 191]],
            cover_ornament: [241, 196, 15],
            cover_text: [255, 255, 255],
        }
    }
}

/// Everything the composer needs to know about geometry, typography and branding.
/// Passed explicitly to every component; nothing is read from global state.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub page: PageSize,
    pub margins: Margins,
    /// Height of the strip above the content band reserved for decoration.
    pub header_band: f32,
    /// Height of the strip below the content band reserved for decoration.
    pub footer_band: f32,
    pub block_gap: f32,
    pub block_padding: f32,
    pub accent_bar_width: f32,
    /// Family to look up in font directories. `None` uses built-in Helvetica.
    pub font_family: Option<String>,
    pub title_size: f32,
    pub body_size: f32,
    /// Multiplier applied to the font's natural line height.
    pub line_spacing: f32,
    pub palette: Palette,
    pub brand: String,
    pub version_tag: String,
    /// chrono strftime pattern used on the cover and page stamps.
    pub date_format: String,
    /// Page stamp template; `{page}` and `{total}` are substituted.
    pub page_label: String,
    pub logo_path: Option<PathBuf>,
    pub logo_size: f32,
    /// Width in points the fallback view is laid out at before scaling to the page.
    pub capture_width: f32,
    /// Upper bound on time spent loading images for a fallback capture.
    pub capture_asset_budget_ms: u64,
    pub default_author: String,
    pub summary_title: String,
    pub compress_streams: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page: PageSize::default(),
            margins: Margins::default(),
            header_band: 40.0,
            footer_band: 36.0,
            block_gap: 10.0,
            block_padding: 14.0,
            accent_bar_width: 4.0,
            font_family: None,
            title_size: 14.0,
            body_size: 10.5,
            line_spacing: 1.25,
            palette: Palette::default(),
            brand: "Astralis".to_string(),
            version_tag: "2.4".to_string(),
            date_format: "%d.%m.%Y %H:%M".to_string(),
            page_label: "Page {page} / {total}".to_string(),
            logo_path: None,
            logo_size: 22.0,
            capture_width: 900.0,
            capture_asset_budget_ms: 4000,
            default_author: "Guest".to_string(),
            summary_title: "Overview".to_string(),
            compress_streams: true,
        }
    }
}

impl ReportConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", e, path.display()),
            ))
        })?;
        let config: ReportConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.page.width <= 0.0 || self.page.height <= 0.0 {
            return Err(Error::Config("page size must be positive".into()));
        }
        if self.content_width() <= 0.0 {
            return Err(Error::Config("horizontal margins leave no content width".into()));
        }
        if self.content_bottom() <= self.content_top() {
            return Err(Error::Config(
                "margins and decoration bands leave no content height".into(),
            ));
        }
        if self.capture_width <= 2.0 * CAPTURE_EDGE_PADDING {
            return Err(Error::Config(format!(
                "capture width must exceed {} units of edge padding",
                2.0 * CAPTURE_EDGE_PADDING
            )));
        }
        if self.block_gap < 0.0 || self.block_padding < 0.0 {
            return Err(Error::Config("block gap and padding must not be negative".into()));
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::Config(format!(
                "invalid date format {:?}",
                self.date_format
            )));
        }
        Ok(())
    }

    pub fn content_width(&self) -> f32 {
        self.page.width - self.margins.left - self.margins.right
    }

    /// Top of the content band, measured down from the top edge of the page.
    pub fn content_top(&self) -> f32 {
        self.margins.top + self.header_band
    }

    /// Bottom of the content band, measured down from the top edge of the page.
    pub fn content_bottom(&self) -> f32 {
        self.page.height - self.margins.bottom - self.footer_band
    }

    pub fn content_height(&self) -> f32 {
        self.content_bottom() - self.content_top()
    }

    pub fn format_page_label(&self, page: usize, total: usize) -> String {
        self.page_label
            .replace("{page}", &page.to_string())
            .replace("{total}", &total.to_string())
    }
}
