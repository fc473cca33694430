//! Minimal PDF 1.4 writer.
//!
//! Supports what the client report needs: A4 pages, the two standard Helvetica
//! faces in WinAnsi encoding, filled rectangles, lines and single-line text.
//! Text outside WinAnsi (Arabic labels) is shaped and set in an embedded
//! TrueType face written as a Type0/CIDFontType2 font; the face is only
//! embedded when some page needs it. Content streams are left uncompressed
//! and no timestamps other than the supplied creation date are written, so
//! equal input gives equal bytes.

use crate::font::{self, Glyph, FONT_NAME};
use chrono::NaiveDate;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write as _;

pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    fn ops(self) -> String {
        format!(
            "{:.3} {:.3} {:.3}",
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

// Helvetica advance widths for codes 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667,
    611, 722, 667, 944, 667, 667, 611, // 'A'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, // 'a'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Width of `text` in points at `size`. WinAnsi text is measured in Helvetica
/// (bold with the regular metrics), anything else in the embedded face.
pub fn text_width(text: &str, size: f32) -> f32 {
    if !is_winansi(text) {
        if let Some(glyphs) = font::shape(text) {
            return font::shaped_width(&glyphs, size);
        }
    }
    let units: u32 = text
        .chars()
        .map(|c| match encode_char(c) {
            b @ 32..=126 => u32::from(HELVETICA_WIDTHS[usize::from(b - 32)]),
            _ => 556,
        })
        .sum();
    units as f32 * size / 1000.0
}

/// Map a character to its WinAnsi code, or `?` when the standard fonts have
/// no glyph for it.
fn encode_char(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        _ => b'?',
    }
}

fn is_winansi(text: &str) -> bool {
    text.chars().all(|c| c == '?' || encode_char(c) != b'?')
}

/// Encode `text` as the body of a PDF literal string.
fn literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match encode_char(c) {
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\\' => out.push_str("\\\\"),
            b @ 32..=126 => out.push(b as char),
            b => {
                let _ = write!(out, "\\{b:03o}");
            }
        }
    }
    out
}

/// A PDF text string for document metadata. Non-ASCII text is written as
/// UTF-16BE so viewers show it intact.
fn text_string(text: &str) -> String {
    if text.chars().all(|c| (' '..='~').contains(&c)) {
        return format!("({})", literal(text));
    }
    let mut out = String::from("<FEFF");
    for unit in text.encode_utf16() {
        let _ = write!(out, "{unit:04X}");
    }
    out.push('>');
    out
}

/// Drawing operations for one page. Coordinates are in points with the
/// origin at the bottom-left corner.
#[derive(Debug, Default, Clone)]
pub struct Canvas {
    ops: String,
    // glyphs set in the embedded face: id -> (width, source text)
    glyphs: BTreeMap<u16, (u16, String)>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        let _ = writeln!(
            self.ops,
            "q {} rg {x:.2} {y:.2} {w:.2} {h:.2} re f Q",
            color.ops()
        );
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Rgb) {
        let _ = writeln!(
            self.ops,
            "q {} RG {width:.2} w {x1:.2} {y1:.2} m {x2:.2} {y2:.2} l S Q",
            color.ops()
        );
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, width: f32, color: Rgb) {
        let _ = writeln!(
            self.ops,
            "q {} RG {width:.2} w {x:.2} {y:.2} {w:.2} {h:.2} re S Q",
            color.ops()
        );
    }

    pub fn text(&mut self, x: f32, y: f32, font: Font, size: f32, color: Rgb, text: &str) {
        if !is_winansi(text) {
            if let Some(glyphs) = font::shape(text) {
                self.glyph_text(x, y, font, size, color, &glyphs);
                return;
            }
        }
        let _ = writeln!(
            self.ops,
            "BT /{} {size:.1} Tf {} rg {x:.2} {y:.2} Td ({}) Tj ET",
            font.resource(),
            color.ops(),
            literal(text)
        );
    }

    /// Set shaped glyphs in the embedded face. It has a single weight, so
    /// bold is drawn by also stroking the outline.
    fn glyph_text(&mut self, x: f32, y: f32, font: Font, size: f32, color: Rgb, glyphs: &[Glyph]) {
        let mut hex = String::with_capacity(glyphs.len() * 4);
        for g in glyphs {
            let _ = write!(hex, "{:04X}", g.id);
            let entry = self.glyphs.entry(g.id).or_insert_with(|| (g.width, String::new()));
            if entry.1.is_empty() {
                entry.1.clone_from(&g.text);
            }
        }
        let stroke = match font {
            Font::Regular => String::new(),
            Font::Bold => format!("2 Tr {:.2} w {} RG ", size * 0.03, color.ops()),
        };
        let _ = writeln!(
            self.ops,
            "q BT /{UNICODE_FONT} {size:.1} Tf {} rg {stroke}{x:.2} {y:.2} Td <{hex}> Tj ET Q",
            color.ops()
        );
    }

    /// Text horizontally centred on `cx`.
    pub fn text_centered(&mut self, cx: f32, y: f32, font: Font, size: f32, color: Rgb, text: &str) {
        let x = cx - text_width(text, size) / 2.0;
        self.text(x, y, font, size, color, text);
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn content(&self) -> &str {
        &self.ops
    }

    /// Whether this page sets any text in the embedded face.
    pub fn uses_embedded_font(&self) -> bool {
        !self.glyphs.is_empty()
    }
}

const UNICODE_FONT: &str = "F3";

fn deflate(data: &[u8]) -> Option<Vec<u8>> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).and_then(|()| enc.finish()).ok()
}

fn stream_object(dict: &str, data: &[u8]) -> Vec<u8> {
    let mut out = format!("<< /Length {} {dict}>>\nstream\n", data.len()).into_bytes();
    out.extend_from_slice(data);
    out.extend_from_slice(b"\nendstream");
    out
}

/// CMap that lets viewers copy and search text set as glyph ids.
fn to_unicode_cmap(glyphs: &BTreeMap<u16, (u16, String)>) -> String {
    let mapped: Vec<(u16, &str)> = glyphs
        .iter()
        .filter(|(_, (_, text))| !text.is_empty())
        .map(|(id, (_, text))| (*id, text.as_str()))
        .collect();
    let mut out = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    // bfchar sections hold at most 100 entries
    for chunk in mapped.chunks(100) {
        let _ = writeln!(out, "{} beginbfchar", chunk.len());
        for (id, text) in chunk {
            let _ = write!(out, "<{id:04X}> <");
            for unit in text.encode_utf16() {
                let _ = write!(out, "{unit:04X}");
            }
            out.push_str(">\n");
        }
        out.push_str("endbfchar\n");
    }
    out.push_str("endcmap\nCMapName currentdict /defineresource pop\nend\nend\n");
    out
}

/// The five objects of the embedded face, numbered from `first`: Type0 font,
/// CID font, descriptor, font file and ToUnicode map.
fn embedded_font_objects(
    first: usize,
    glyphs: &BTreeMap<u16, (u16, String)>,
) -> Option<Vec<Vec<u8>>> {
    let m = font::metrics()?;
    let mut widths = String::new();
    for (id, (w, _)) in glyphs {
        let _ = write!(widths, "{id} [{w}] ");
    }
    let data = font::font_data();
    let file = match deflate(data) {
        Some(packed) => {
            stream_object(&format!("/Length1 {} /Filter /FlateDecode ", data.len()), &packed)
        }
        None => stream_object(&format!("/Length1 {} ", data.len()), data),
    };
    let cmap = to_unicode_cmap(glyphs);
    Some(vec![
        format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{FONT_NAME} /Encoding /Identity-H \
             /DescendantFonts [{} 0 R] /ToUnicode {} 0 R >>",
            first + 1,
            first + 4
        )
        .into_bytes(),
        format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{FONT_NAME} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /CIDToGIDMap /Identity /DW 1000 /W [{}] >>",
            first + 2,
            widths.trim_end()
        )
        .into_bytes(),
        format!(
            "<< /Type /FontDescriptor /FontName /{FONT_NAME} /Flags 32 \
             /FontBBox [{} {} {} {}] /ItalicAngle 0 /Ascent {} /Descent {} \
             /CapHeight {} /StemV 80 /FontFile2 {} 0 R >>",
            m.bbox[0],
            m.bbox[1],
            m.bbox[2],
            m.bbox[3],
            m.ascent,
            m.descent,
            m.cap_height,
            first + 3
        )
        .into_bytes(),
        file,
        stream_object("", cmap.as_bytes()),
    ])
}

#[derive(Debug, Clone)]
pub struct PdfDocument {
    title: String,
    created: NaiveDate,
    pages: Vec<Canvas>,
}

impl PdfDocument {
    pub fn new(title: impl Into<String>, created: NaiveDate) -> Self {
        Self {
            title: title.into(),
            created,
            pages: Vec::new(),
        }
    }

    pub fn push_page(&mut self, page: Canvas) {
        self.pages.push(page);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serialize the whole document. A document without pages still gets one
    /// blank page, since a page tree must not be empty.
    pub fn to_bytes(&self) -> Vec<u8> {
        let blank = [Canvas::new()];
        let pages: &[Canvas] = if self.pages.is_empty() { &blank } else { &self.pages };

        let mut glyphs: BTreeMap<u16, (u16, String)> = BTreeMap::new();
        for page in pages {
            for (id, entry) in &page.glyphs {
                glyphs.entry(*id).or_insert_with(|| entry.clone());
            }
        }

        // 1 catalog, 2 page tree, 3-4 fonts, 5 info, then a page/content pair
        // per page, then the embedded face when any page uses it.
        let page_id = |i: usize| 6 + 2 * i;
        let font_id = page_id(pages.len());
        let embedded = if glyphs.is_empty() {
            None
        } else {
            embedded_font_objects(font_id, &glyphs)
        };
        let unicode_resource = if embedded.is_some() {
            format!(" /{UNICODE_FONT} {font_id} 0 R")
        } else {
            String::new()
        };

        let mut objects: Vec<Vec<u8>> = Vec::new();
        objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
        let kids: Vec<String> = (0..pages.len()).map(|i| format!("{} 0 R", page_id(i))).collect();
        objects.push(
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                pages.len()
            )
            .into_bytes(),
        );
        objects.push(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_vec(),
        );
        objects.push(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
                .to_vec(),
        );
        let stamp = format!("(D:{}000000Z)", self.created.format("%Y%m%d"));
        objects.push(
            format!(
                "<< /Title {} /Producer (campaign_report) /CreationDate {stamp} >>",
                text_string(&self.title)
            )
            .into_bytes(),
        );
        for (i, page) in pages.iter().enumerate() {
            objects.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {A4_WIDTH:.2} {A4_HEIGHT:.2}] \
                     /Resources << /Font << /F1 3 0 R /F2 4 0 R{unicode_resource} >> >> /Contents {} 0 R >>",
                    page_id(i) + 1
                )
                .into_bytes(),
            );
            objects.push(stream_object("", page.content().as_bytes()));
        }
        objects.extend(embedded.into_iter().flatten());

        let mut out: Vec<u8> = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }
        let xref_at = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for off in offsets {
            let _ = write!(xref, "{off:010} 00000 n \n");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        );
        out.extend_from_slice(xref.as_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn escapes_literal_strings() {
        assert_eq!(literal("a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(literal("café"), "caf\\351");
        assert_eq!(literal("• x"), "\\225 x");
    }

    #[test]
    fn metadata_keeps_unicode() {
        assert_eq!(text_string("Acme"), "(Acme)");
        assert_eq!(text_string("é"), "<FEFF00E9>");
    }

    #[test]
    fn measures_helvetica() {
        // "Hi" = 722 + 222 units
        assert!((text_width("Hi", 10.0) - 9.44).abs() < 1e-4);
        assert_eq!(text_width("", 12.0), 0.0);
    }

    #[test]
    fn writes_a_well_formed_file() {
        let mut doc = PdfDocument::new("Report", date());
        let mut page = Canvas::new();
        page.text(50.0, 700.0, Font::Bold, 12.0, Rgb(0, 0, 0), "Hello (PDF)");
        page.fill_rect(10.0, 10.0, 20.0, 20.0, Rgb::WHITE);
        doc.push_page(page);
        doc.push_page(Canvas::new());
        let bytes = doc.to_bytes();
        let text = String::from_utf8_lossy(&bytes);

        assert!(bytes.starts_with(b"%PDF-1.4\n"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("/Count 2"));
        assert!(text.contains("(Hello \\(PDF\\)) Tj"));
        assert!(text.contains("/CreationDate (D:20261019000000Z)"));

        // startxref must point at the xref table
        let start: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|n| n.parse().ok())
            .unwrap();
        assert!(bytes[start..].starts_with(b"xref\n"));

        // every xref entry must point at its object header
        let xref = String::from_utf8_lossy(&bytes[start..]);
        for (i, line) in xref.lines().skip(3).take(7).enumerate() {
            let off: usize = line[..10].parse().unwrap();
            let header = format!("{} 0 obj", i + 1);
            assert!(bytes[off..].starts_with(header.as_bytes()), "object {} misplaced", i + 1);
        }
    }

    #[test]
    fn identical_input_gives_identical_bytes() {
        let build = || {
            let mut doc = PdfDocument::new("Same", date());
            let mut page = Canvas::new();
            page.text_centered(300.0, 400.0, Font::Regular, 10.0, Rgb(1, 2, 3), "centred");
            doc.push_page(page);
            doc.to_bytes()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn arabic_text_uses_the_embedded_face() {
        let mut page = Canvas::new();
        page.text(50.0, 700.0, Font::Bold, 14.0, Rgb(0, 0, 0), "تقرير أداء الحملات");
        assert!(page.uses_embedded_font());
        let line = page.content().lines().next().unwrap();
        assert!(line.contains("/F3 14.0 Tf"), "{line}");
        assert!(line.contains("2 Tr"), "{line}");
        assert!(line.contains("> Tj"), "{line}");
        assert!(!line.contains('?'), "{line}");

        let mut doc = PdfDocument::new("تقرير", date());
        doc.push_page(page);
        let bytes = doc.to_bytes();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/F3 8 0 R"));
        assert!(text.contains("/Subtype /Type0 /BaseFont /DejaVuSans /Encoding /Identity-H"));
        assert!(text.contains("/Subtype /CIDFontType2"));
        assert!(text.contains("/FontFile2 11 0 R"));
        assert!(text.contains("/ToUnicode 12 0 R"));
        // teh (U+062A) is copyable back out of the document
        assert!(text.contains("<062A>"));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn latin_documents_do_not_embed_a_font() {
        let mut doc = PdfDocument::new("Report", date());
        let mut page = Canvas::new();
        page.text(50.0, 700.0, Font::Regular, 12.0, Rgb(0, 0, 0), "Café — 50%?");
        assert!(!page.uses_embedded_font());
        doc.push_page(page);
        let text = String::from_utf8_lossy(&doc.to_bytes()).into_owned();
        assert!(text.contains("(Caf\\351 \\227 50%?) Tj"));
        assert!(!text.contains("/FontFile2"));
        assert!(!text.contains("/F3"));
    }

    #[test]
    fn measures_arabic_with_the_embedded_face() {
        let w = text_width("أفضل منصة", 10.0);
        assert!(w > 0.0);
        assert!(w < 9.0 * 10.0);
    }

    #[test]
    fn empty_document_has_one_page() {
        let bytes = PdfDocument::new("Empty", date()).to_bytes();
        assert!(String::from_utf8_lossy(&bytes).contains("/Count 1"));
    }
}
