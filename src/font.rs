//! Embedded Unicode face for text the standard PDF fonts cannot show.
//!
//! Text is split into bidi runs in visual order and each run is shaped, so
//! Arabic comes out joined and right-to-left while Latin words and digits
//! inside it keep their own direction.

use rustybuzz::ttf_parser::GlyphId;
use rustybuzz::{Direction, Face, UnicodeBuffer};
use std::collections::HashSet;
use unicode_bidi::BidiInfo;

static DEJAVU_SANS: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

pub const FONT_NAME: &str = "DejaVuSans";

/// One positioned glyph. `width` is in 1/1000 em, `text` is the source text
/// the glyph stands for (empty for the second and later glyphs of a cluster).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub id: u16,
    pub width: u16,
    pub text: String,
}

/// Values the PDF font descriptor needs, in 1/1000 em.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    pub ascent: i32,
    pub descent: i32,
    pub cap_height: i32,
    pub bbox: [i32; 4],
}

pub fn font_data() -> &'static [u8] {
    DEJAVU_SANS
}

fn face() -> Option<Face<'static>> {
    Face::from_slice(DEJAVU_SANS, 0)
}

fn scale(face: &Face<'_>) -> f32 {
    1000.0 / face.units_per_em() as f32
}

pub fn metrics() -> Option<FontMetrics> {
    let face = face()?;
    let s = scale(&face);
    let em = |v: i16| (f32::from(v) * s).round() as i32;
    let bbox = face.global_bounding_box();
    Some(FontMetrics {
        ascent: em(face.ascender()),
        descent: em(face.descender()),
        cap_height: em(face.capital_height().unwrap_or(face.ascender())),
        bbox: [em(bbox.x_min), em(bbox.y_min), em(bbox.x_max), em(bbox.y_max)],
    })
}

/// Shape `text` into glyphs in drawing order. `None` when the embedded face
/// cannot be parsed.
pub fn shape(text: &str) -> Option<Vec<Glyph>> {
    let face = face()?;
    let s = scale(&face);
    let bidi = BidiInfo::new(text, None);
    let mut glyphs = Vec::new();
    for para in &bidi.paragraphs {
        let (levels, runs) = bidi.visual_runs(para, para.range.clone());
        for run in runs {
            let rtl = levels[run.start].is_rtl();
            shape_run(&face, &text[run], rtl, s, &mut glyphs);
        }
    }
    Some(glyphs)
}

fn shape_run(face: &Face<'_>, run: &str, rtl: bool, scale: f32, out: &mut Vec<Glyph>) {
    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(run);
    buffer.set_direction(if rtl {
        Direction::RightToLeft
    } else {
        Direction::LeftToRight
    });
    buffer.guess_segment_properties();
    let shaped = rustybuzz::shape(face, &[], buffer);

    let mut starts: Vec<usize> = shaped
        .glyph_infos()
        .iter()
        .map(|g| g.cluster as usize)
        .collect();
    starts.sort_unstable();
    starts.dedup();

    let mut claimed = HashSet::new();
    for info in shaped.glyph_infos() {
        let start = info.cluster as usize;
        let end = starts
            .iter()
            .copied()
            .find(|&s| s > start)
            .unwrap_or(run.len());
        let text = if claimed.insert(start) {
            run.get(start..end).unwrap_or_default().to_string()
        } else {
            String::new()
        };
        let id = u16::try_from(info.glyph_id).unwrap_or(0);
        let advance = face.glyph_hor_advance(GlyphId(id)).unwrap_or(0);
        out.push(Glyph {
            id,
            width: (f32::from(advance) * scale).round() as u16,
            text,
        });
    }
}

/// Width of `text` in points at `size` when set in the embedded face.
pub fn shaped_width(glyphs: &[Glyph], size: f32) -> f32 {
    let units: u32 = glyphs.iter().map(|g| u32::from(g.width)).sum();
    units as f32 * size / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_face_parses() {
        let m = metrics().unwrap();
        assert!(m.ascent > 0);
        assert!(m.descent < 0);
        assert!(m.bbox[2] > m.bbox[0]);
    }

    #[test]
    fn arabic_has_real_glyphs() {
        let glyphs = shape("تقرير").unwrap();
        assert!(!glyphs.is_empty());
        assert!(glyphs.iter().all(|g| g.id != 0), "missing glyph in {glyphs:?}");
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text.chars().count(), 5);
    }

    #[test]
    fn arabic_runs_are_drawn_right_to_left() {
        // visual order puts the last logical letter first
        let glyphs = shape("من").unwrap();
        assert_eq!(glyphs.first().map(|g| g.text.as_str()), Some("ن"));
        assert_eq!(glyphs.last().map(|g| g.text.as_str()), Some("م"));
    }

    #[test]
    fn latin_inside_arabic_keeps_its_order() {
        let glyphs = shape("تقرير Acme").unwrap();
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert!(text.starts_with("Acme"), "{text}");
    }

    #[test]
    fn width_grows_with_text() {
        let one = shape("م").unwrap();
        let three = shape("ممم").unwrap();
        assert!(shaped_width(&three, 10.0) > shaped_width(&one, 10.0));
        assert_eq!(shaped_width(&[], 10.0), 0.0);
    }
}
