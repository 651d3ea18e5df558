use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local, Offset, TimeZone, Timelike};
use pdf_writer::{Date, Pdf, Ref, TextStr};
use rand::Rng;

use crate::config::ReportConfig;
use crate::error::Error;
use crate::model::{DocumentMetadata, Report};

const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const TOKEN_LEN: usize = 6;

pub(crate) fn write_document_info(
    pdf: &mut Pdf,
    id: Ref,
    meta: &DocumentMetadata,
    config: &ReportConfig,
) {
    let subject = format!("{} analysis report (v{})", config.brand, meta.version_tag);
    let keywords = format!(
        "version:{}; generated:{}",
        meta.version_tag,
        meta.generated_at.to_rfc3339()
    );
    let producer = format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    pdf.document_info(id)
        .title(TextStr(&meta.title))
        .author(TextStr(&meta.author))
        .subject(TextStr(&subject))
        .keywords(TextStr(&keywords))
        .creator(TextStr(&config.brand))
        .producer(TextStr(&producer))
        .creation_date(pdf_date(&meta.generated_at));
}

fn pdf_date<Tz: TimeZone>(at: &DateTime<Tz>) -> Date {
    let offset_minutes = at.offset().fix().local_minus_utc() / 60;
    Date::new(at.year().clamp(0, 9999) as u16)
        .month(at.month() as u8)
        .day(at.day() as u8)
        .hour(at.hour() as u8)
        .minute(at.minute() as u8)
        .second(at.second() as u8)
        .utc_offset_hour((offset_minutes / 60) as i8)
        .utc_offset_minute((offset_minutes.abs() % 60) as u8)
}

/// Every character outside `[A-Za-z0-9]` becomes `_`; the rest is lowercased.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn random_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// `{sanitized title}_{epoch millis}_{random token}.pdf`. The token keeps
/// repeated exports of the same title from colliding.
pub fn suggested_filename(title: &str, at: &DateTime<Local>) -> String {
    format!(
        "{}_{}_{}.pdf",
        sanitize_title(title),
        at.timestamp_millis(),
        random_token()
    )
}

/// Save a finished report under its suggested filename.
pub fn write_report(report: &Report, dir: &Path) -> Result<PathBuf, Error> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&report.filename);
    std::fs::write(&path, &report.bytes).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, path.display()),
        ))
    })?;
    Ok(path)
}
