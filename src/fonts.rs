use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::OnceLock;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref, Str};
use ttf_parser::Face;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FontStyle {
    Regular,
    Bold,
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    /// WinAnsi widths for bytes 32..=255 at 1000 units/em.
    widths_1000: Vec<f32>,
    line_h_ratio: f32,
    ascender_ratio: f32,
    /// Present when a TrueType face was embedded; text is then written as glyph IDs.
    char_to_gid: Option<HashMap<char, u16>>,
    char_widths_1000: HashMap<char, f32>,
}

impl FontEntry {
    fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(&w) = self.char_widths_1000.get(&ch) {
            return w;
        }
        let byte = char_to_winansi(ch);
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            0.0
        }
    }

    pub(crate) fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub(crate) fn line_height(&self, font_size: f32) -> f32 {
        font_size * self.line_h_ratio
    }

    pub(crate) fn ascent(&self, font_size: f32) -> f32 {
        font_size * self.ascender_ratio
    }

    /// Bytes for a `Tj` string operand in this font's encoding.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }

    pub(crate) fn show(&self, content: &mut pdf_writer::Content, text: &str) {
        let bytes = self.encode(text);
        content.show(Str(&bytes));
    }
}

/// The two faces every report uses: body text and headings.
pub(crate) struct FontSet {
    regular: FontEntry,
    bold: FontEntry,
}

impl FontSet {
    pub(crate) fn get(&self, style: FontStyle) -> &FontEntry {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
        }
    }

    pub(crate) fn resource_pairs(&self) -> [(&str, Ref); 2] {
        [
            (self.regular.pdf_name.as_str(), self.regular.font_ref),
            (self.bold.pdf_name.as_str(), self.bold.font_ref),
        ]
    }

    /// Embed the configured family (subset to `used_chars`) or fall back to the
    /// standard Helvetica pair. A missing or broken font file is never fatal.
    pub(crate) fn register(
        pdf: &mut Pdf,
        alloc: &mut impl FnMut() -> Ref,
        family: Option<&str>,
        used_chars: &BTreeSet<char>,
    ) -> FontSet {
        FontSet {
            regular: register_font(pdf, alloc, family, FontStyle::Regular, "F1", used_chars),
            bold: register_font(pdf, alloc, family, FontStyle::Bold, "F2", used_chars),
        }
    }
}

/// (lowercase family name, bold) -> (file path, face index within a collection)
type FontLookup = HashMap<(String, bool), (PathBuf, u32)>;

static FONT_INDEX: OnceLock<FontLookup> = OnceLock::new();

fn font_family_name(face: &Face) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
        .find_map(|name| name.to_string())
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(val) = std::env::var("REPORT_PDF_FONTS") {
        let sep = if cfg!(windows) { ';' } else { ':' };
        dirs.extend(
            val.split(sep)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        );
    }

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        match std::env::var("WINDIR") {
            Ok(windir) => dirs.push(PathBuf::from(windir).join("Fonts")),
            Err(_) => dirs.push("C:\\Windows\\Fonts".into()),
        }
    }

    dirs
}

fn is_font_file(path: &std::path::Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

fn scan_font_dirs() -> FontLookup {
    let t0 = std::time::Instant::now();
    let mut index = FontLookup::new();
    let mut files_scanned = 0u32;
    let mut visited: std::collections::HashSet<PathBuf> = std::collections::HashSet::new();
    let mut stack = font_directories();

    while let Some(dir) = stack.pop() {
        if !visited.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if !is_font_file(&path) {
                continue;
            }
            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            // SAFETY: font files are opened read-only and not modified while mapped.
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            files_scanned += 1;
            let face_count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
            for face_idx in 0..face_count {
                let Ok(face) = Face::parse(&data, face_idx) else {
                    continue;
                };
                if face.is_italic() {
                    continue;
                }
                if let Some(family) = font_family_name(&face) {
                    index
                        .entry((family.to_lowercase(), face.is_bold()))
                        .or_insert((path.clone(), face_idx));
                }
            }
        }
    }

    log::debug!(
        "Font index: {} faces from {files_scanned} files in {:.1}ms",
        index.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    index
}

fn find_font_file(family: &str, bold: bool) -> Option<(PathBuf, u32)> {
    let index = FONT_INDEX.get_or_init(scan_font_dirs);
    let key = family.to_lowercase();
    index
        .get(&(key.clone(), bold))
        .or_else(|| if bold { index.get(&(key, false)) } else { None })
        .cloned()
}

/// Windows-1252 byte to Unicode char. Bytes 0x80-0x9F are remapped; the rest
/// map to the same codepoint.
fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x85 => '\u{2026}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x99 => '\u{2122}',
        _ => byte as char,
    }
}

/// Unicode char to WinAnsi byte. Turkish letters outside Latin-1 degrade to
/// their unaccented base; anything else unmappable becomes `?`.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x2026 => 0x85,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x2122 => 0x99,
        0x0131 => b'i',
        0x0130 => b'I',
        0x015F => b's',
        0x015E => b'S',
        0x011F => b'g',
        0x011E => b'G',
        0x0000..=0x001F => 0,
        _ => b'?',
    }
}

pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(char_to_winansi)
        .filter(|&b| b >= 32)
        .collect()
}

/// Big-endian 2-byte glyph IDs for Identity-H encoded CID fonts.
fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    text.chars()
        .flat_map(|ch| char_to_gid.get(&ch).copied().unwrap_or(0).to_be_bytes())
        .collect()
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi bytes 32..=255.
fn helvetica_widths(bold: bool) -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| {
            let w = match b {
                32 => 278.0,
                33..=47 => 333.0,
                48..=57 => 556.0,
                58..=64 => 333.0,
                73 | 74 => 278.0,
                77 => 833.0,
                65..=90 => 667.0,
                91..=96 => 333.0,
                102 | 105 | 106 | 108 | 116 => 278.0,
                109 | 119 => 833.0,
                97..=122 => 556.0,
                _ => 556.0,
            };
            if bold && b != 32 { w * 1.06 } else { w }
        })
        .collect()
}

struct EmbeddedMetrics {
    widths_1000: Vec<f32>,
    line_h_ratio: f32,
    ascender_ratio: f32,
    char_to_gid: HashMap<char, u16>,
    char_widths_1000: HashMap<char, f32>,
}

/// Embed a TrueType/OpenType face as a Type0 font with Identity-H encoding,
/// subset to the characters the report uses.
fn embed_truetype(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    font_ref: Ref,
    font_name: &str,
    font_data: &[u8],
    face_index: u32,
    used_chars: &BTreeSet<char>,
) -> Option<EmbeddedMetrics> {
    let face = Face::parse(font_data, face_index).ok()?;
    let units = face.units_per_em() as f32;
    let to_1000 = |v: f32| v / units * 1000.0;

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        to_1000(bb.x_min as f32),
        to_1000(bb.y_min as f32),
        to_1000(bb.x_max as f32),
        to_1000(bb.y_max as f32),
    );

    let widths_1000: Vec<f32> = (32u8..=255u8)
        .map(|byte| {
            face.glyph_index(winansi_to_char(byte))
                .and_then(|gid| face.glyph_hor_advance(gid))
                .map(|adv| to_1000(adv as f32))
                .unwrap_or(0.0)
        })
        .collect();

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut char_widths_1000 = HashMap::new();
    for &ch in used_chars {
        if let Some(gid) = face.glyph_index(ch) {
            char_to_gid.insert(ch, remapper.remap(gid.0));
            let w = face
                .glyph_hor_advance(gid)
                .map(|adv| to_1000(adv as f32))
                .unwrap_or(0.0);
            char_widths_1000.insert(ch, w);
        }
    }

    let subset_data = subsetter::subset(font_data, face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {font_name}: {e}; embedding full font");
        font_data.to_vec()
    });

    let descriptor_ref = alloc();
    let data_ref = alloc();
    let cid_font_ref = alloc();
    let tounicode_ref = alloc();

    let data_len = i32::try_from(subset_data.len()).ok()?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = font_name.replace(' ', "");
    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(to_1000(face.ascender() as f32))
        .descent(to_1000(face.descender() as f32))
        .cap_height(face.capital_height().map(|h| to_1000(h as f32)).unwrap_or(700.0))
        .stem_v(80.0)
        .font_file2(data_ref);

    let system_info = pdf_writer::types::SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    };
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info);
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        let mut gid_widths: Vec<(u16, f32)> = char_to_gid
            .iter()
            .map(|(ch, &gid)| (gid, char_widths_1000.get(ch).copied().unwrap_or(0.0)))
            .collect();
        gid_widths.sort_by_key(|&(gid, _)| gid);
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(
        Name(cmap_name.as_bytes()),
        pdf_writer::types::SystemInfo {
            registry: Str(b"Adobe"),
            ordering: Str(b"Identity"),
            supplement: 0,
        },
    );
    for (&ch, &gid) in &char_to_gid {
        cmap.pair(gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    let line_h_ratio =
        (face.ascender() as f32 - face.descender() as f32 + face.line_gap() as f32) / units;
    Some(EmbeddedMetrics {
        widths_1000,
        line_h_ratio,
        ascender_ratio: face.ascender() as f32 / units,
        char_to_gid,
        char_widths_1000,
    })
}

fn register_font(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    family: Option<&str>,
    style: FontStyle,
    pdf_name: &str,
    used_chars: &BTreeSet<char>,
) -> FontEntry {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();
    let bold = style == FontStyle::Bold;

    let embedded = family.and_then(|family| {
        let Some((path, face_index)) = find_font_file(family, bold) else {
            log::warn!("Font not found: {family} bold={bold}; using Helvetica");
            return None;
        };
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Cannot read font {}: {e}; using Helvetica", path.display());
                return None;
            }
        };
        embed_truetype(pdf, alloc, font_ref, family, &data, face_index, used_chars)
    });

    let entry = match embedded {
        Some(m) => FontEntry {
            pdf_name: pdf_name.to_string(),
            font_ref,
            widths_1000: m.widths_1000,
            line_h_ratio: m.line_h_ratio,
            ascender_ratio: m.ascender_ratio,
            char_to_gid: Some(m.char_to_gid),
            char_widths_1000: m.char_widths_1000,
        },
        None => {
            let base: &[u8] = if bold { b"Helvetica-Bold" } else { b"Helvetica" };
            pdf.type1_font(font_ref)
                .base_font(Name(base))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            FontEntry {
                pdf_name: pdf_name.to_string(),
                font_ref,
                widths_1000: helvetica_widths(bold),
                line_h_ratio: 1.15,
                ascender_ratio: 0.718,
                char_to_gid: None,
                char_widths_1000: HashMap::new(),
            }
        }
    };

    log::debug!(
        "register_font: {} {style:?} → {:.1}ms",
        family.unwrap_or("Helvetica"),
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    entry
}
