//! PDF report for one exchange
//!
//! Layout per page: title header, body lines, `Page N` footer. The first page
//! also carries the generation timestamp. The body holds an "Event" block and
//! an "Analysis" block, both wrapped at a fixed column width.
//!
//! Files are written to a temporary file next to the destination and renamed
//! into place, so a failed write never leaves a half-written report behind.

use crate::error::{DetectorError, Result};
use crate::text_wrap::{wrap_block, DEFAULT_WRAP_WIDTH};
use crate::types::{Event, Verdict};
use chrono::{DateTime, Local};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default header title
pub const DEFAULT_TITLE: &str = "Bias Analysis Report";

/// Report file name prefix
pub const FILE_PREFIX: &str = "bias-report";

// A4 in points
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN_LEFT: i64 = 50;
const TITLE_Y: i64 = 800;
const BODY_TOP: i64 = 770;
const BODY_BOTTOM: i64 = 60;
const FOOTER_Y: i64 = 30;
const LINE_HEIGHT: i64 = 14;

/// Body lines that fit on one page
pub const LINES_PER_PAGE: usize = ((BODY_TOP - BODY_BOTTOM) / LINE_HEIGHT) as usize;

/// Visual role of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Meta,
    Label,
    Body,
}

impl LineStyle {
    fn font(&self) -> (&'static str, i64) {
        match self {
            LineStyle::Meta => ("F2", 12),
            LineStyle::Label => ("F2", 10),
            LineStyle::Body => ("F1", 9),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub style: LineStyle,
    pub text: String,
}

impl ReportLine {
    fn new(style: LineStyle, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPage {
    pub number: usize,
    pub lines: Vec<ReportLine>,
}

/// Laid-out report, ready to be written
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: DateTime<Local>,
    pub pages: Vec<ReportPage>,
}

impl ReportDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Body text of every page, one line per row
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .flat_map(|p| p.lines.iter())
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builds and writes exchange reports
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    title: String,
    wrap_width: usize,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE, DEFAULT_WRAP_WIDTH)
    }
}

impl ReportBuilder {
    pub fn new(title: impl Into<String>, wrap_width: usize) -> Self {
        Self {
            title: title.into(),
            wrap_width,
        }
    }

    pub fn build(&self, event: &Event, verdict: &Verdict) -> ReportDocument {
        self.build_at(event, verdict, Local::now())
    }

    pub fn build_at(
        &self,
        event: &Event,
        verdict: &Verdict,
        generated_at: DateTime<Local>,
    ) -> ReportDocument {
        let mut lines = vec![
            ReportLine::new(
                LineStyle::Meta,
                format!(
                    "Report generated: {}",
                    generated_at.format("%Y-%m-%d %H:%M:%S")
                ),
            ),
            ReportLine::new(LineStyle::Body, ""),
            ReportLine::new(LineStyle::Label, "Event:"),
        ];
        lines.extend(
            wrap_block(event.text(), self.wrap_width)
                .into_iter()
                .map(|l| ReportLine::new(LineStyle::Body, l)),
        );
        lines.push(ReportLine::new(LineStyle::Body, ""));
        lines.push(ReportLine::new(LineStyle::Label, "Analysis:"));
        lines.extend(
            wrap_block(verdict.text(), self.wrap_width)
                .into_iter()
                .map(|l| ReportLine::new(LineStyle::Body, l)),
        );

        let pages = lines
            .chunks(LINES_PER_PAGE)
            .enumerate()
            .map(|(i, chunk)| ReportPage {
                number: i + 1,
                lines: chunk.to_vec(),
            })
            .collect();

        ReportDocument {
            title: self.title.clone(),
            generated_at,
            pages,
        }
    }

    /// Write to `path` atomically
    pub fn write(&self, document: &ReportDocument, path: &Path) -> Result<PathBuf> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| write_failed(path, e))?;

        let mut pdf = render_pdf(document).map_err(|e| write_failed(path, e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| write_failed(path, e))?;
        pdf.save_to(&mut tmp).map_err(|e| write_failed(path, e))?;
        tmp.flush().map_err(|e| write_failed(path, e))?;
        tmp.as_file().sync_all().map_err(|e| write_failed(path, e))?;
        tmp.persist(path).map_err(|e| write_failed(path, e.error))?;

        tracing::info!(
            "Report written to {} ({} page(s))",
            path.display(),
            document.page_count()
        );
        Ok(path.to_path_buf())
    }

    /// Write under `dir` with a fresh timestamped name
    pub fn write_unique(&self, document: &ReportDocument, dir: &Path) -> Result<PathBuf> {
        let path = unique_path(dir, &document.generated_at);
        self.write(document, &path)
    }
}

fn write_failed(path: &Path, e: impl std::fmt::Display) -> DetectorError {
    DetectorError::ReportWriteFailed(format!("{}: {}", path.display(), e))
}

/// `bias-report-YYYYmmdd-HHMMSS.pdf`, suffixed `-N` if that name is taken
pub fn unique_path(dir: &Path, generated_at: &DateTime<Local>) -> PathBuf {
    let stem = format!("{}-{}", FILE_PREFIX, generated_at.format("%Y%m%d-%H%M%S"));
    let mut candidate = dir.join(format!("{}.pdf", stem));
    let mut n = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{}-{}.pdf", stem, n));
        n += 1;
    }
    candidate
}

/// WinAnsiEncoding byte for a character, if the standard fonts can show it
fn win_ansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        // 0x80-0x9F are taken by the punctuation above
        '\u{0080}'..='\u{009F}' => return None,
        _ => return u8::try_from(u32::from(c)).ok(),
    };
    Some(byte)
}

/// Text bytes for the standard PDF fonts; anything WinAnsi lacks becomes '?'
fn pdf_text(text: &str) -> Object {
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| win_ansi_byte(c).unwrap_or(b'?'))
        .collect();
    Object::string_literal(bytes)
}

fn text_op(font: &str, size: i64, x: i64, y: i64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)]),
        Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
        Operation::new("Tj", vec![pdf_text(text)]),
        Operation::new("ET", vec![]),
    ]
}

fn render_pdf(document: &ReportDocument) -> std::result::Result<Document, lopdf::Error> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font = |doc: &mut Document, base: &str| -> ObjectId {
        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base,
            "Encoding" => "WinAnsiEncoding",
        })
    };
    let regular = font(&mut doc, "Helvetica");
    let bold = font(&mut doc, "Helvetica-Bold");
    let italic = font(&mut doc, "Helvetica-Oblique");
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
            "F3" => italic,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(document.pages.len());
    for page in &document.pages {
        let mut operations = text_op("F2", 16, MARGIN_LEFT, TITLE_Y, &document.title);

        let mut y = BODY_TOP;
        for line in &page.lines {
            if !line.text.is_empty() {
                let (font, size) = line.style.font();
                operations.extend(text_op(font, size, MARGIN_LEFT, y, &line.text));
            }
            y -= LINE_HEIGHT;
        }

        let footer = format!("Page {}", page.number);
        operations.extend(text_op("F3", 8, PAGE_WIDTH / 2 - 15, FOOTER_Y, &footer));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => pdf_text(&document.title),
        "Producer" => pdf_text("Risk Bias Detector"),
        "CreationDate" => Object::string_literal(
            document.generated_at.format("D:%Y%m%d%H%M%S").to_string()
        ),
    });
    doc.trailer.set("Info", info_id);

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 18, 14, 5, 9).unwrap()
    }

    #[test]
    fn test_layout_sections() {
        let builder = ReportBuilder::default();
        let doc = builder.build_at(
            &Event::new("User X denied access due to location."),
            &Verdict::new("No bias detected."),
            fixed_time(),
        );

        assert_eq!(doc.page_count(), 1);
        let lines = &doc.pages[0].lines;
        assert_eq!(lines[0].text, "Report generated: 2026-10-18 14:05:09");
        assert_eq!(lines[2], ReportLine::new(LineStyle::Label, "Event:"));
        assert_eq!(lines[3].text, "User X denied access due to location.");
        assert_eq!(lines[5], ReportLine::new(LineStyle::Label, "Analysis:"));
        assert_eq!(lines[6].text, "No bias detected.");
    }

    #[test]
    fn test_long_verdict_paginates() {
        let builder = ReportBuilder::default();
        let verdict = (0..120)
            .map(|i| format!("Paragraph {} of the remediation plan.", i))
            .collect::<Vec<_>>()
            .join("\n");
        let doc = builder.build_at(&Event::new("e"), &Verdict::new(&verdict), fixed_time());

        assert!(doc.page_count() >= 3);
        assert!(doc.pages.iter().all(|p| p.lines.len() <= LINES_PER_PAGE));
        let numbers: Vec<usize> = doc.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, (1..=doc.page_count()).collect::<Vec<_>>());
        assert!(doc.text().contains("Paragraph 119 of the remediation plan."));
    }

    #[test]
    fn test_unique_path_avoids_collisions() {
        let dir = TempDir::new().unwrap();
        let first = unique_path(dir.path(), &fixed_time());
        assert_eq!(
            first.file_name().unwrap().to_str().unwrap(),
            "bias-report-20261018-140509.pdf"
        );

        fs::write(&first, "taken").unwrap();
        let second = unique_path(dir.path(), &fixed_time());
        assert_eq!(
            second.file_name().unwrap().to_str().unwrap(),
            "bias-report-20261018-140509-1.pdf"
        );
    }

    #[test]
    fn test_write_produces_pdf() {
        let dir = TempDir::new().unwrap();
        let builder = ReportBuilder::default();
        let doc = builder.build_at(&Event::new("event"), &Verdict::new("verdict"), fixed_time());

        let path = builder.write_unique(&doc, dir.path()).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        // Only the finished report remains in the directory
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_unwritable_destination_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let builder = ReportBuilder::default();
        let doc = builder.build_at(&Event::new("e"), &Verdict::new("v"), fixed_time());
        let target = blocker.join("report.pdf");

        let err = builder.write(&doc, &target).unwrap_err();
        assert_eq!(err.code(), "report_write_failed");
        assert!(!target.exists());
    }

    #[test]
    fn test_non_latin_text_is_replaced() {
        match pdf_text("Zażółć") {
            Object::String(bytes, _) => assert_eq!(bytes, b"Za?\xf3??".to_vec()),
            other => panic!("unexpected object {:?}", other),
        }
    }

    #[test]
    fn test_typographic_punctuation_uses_win_ansi() {
        match pdf_text("a \u{2014} \u{2018}b\u{2019} \u{201C}c\u{201D}\u{2026} 5\u{20AC} \u{2013}") {
            Object::String(bytes, _) => {
                assert_eq!(bytes, b"a \x97 \x91b\x92 \x93c\x94\x85 5\x80 \x96".to_vec())
            }
            other => panic!("unexpected object {:?}", other),
        }
        assert_eq!(win_ansi_byte('\u{0081}'), None);
        assert_eq!(win_ansi_byte('\u{00E9}'), Some(0xE9));
    }
}
