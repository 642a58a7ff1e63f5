//! Text placement over a template page
//!
//! Decides where a field's value goes before anything touches the PDF:
//! uppercasing, right-edge anchoring for Arabic, and the per-character
//! positions that emulate letter spacing.

use crate::layout::{Field, FieldPosition};
use pdf_core::Align;

/// Width of a field slot beyond which the value likely spills over the
/// printed ruling of the template
const OVERFLOW_WIDTH: f64 = 300.0;

/// Text measurement, decoupled from any loaded font
pub trait Measure {
    /// Width of `text` in points at the given size
    fn width(&self, text: &str, bold: bool, size: f32) -> f64;
}

/// A single character pinned at an absolute X
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedChar {
    pub ch: char,
    pub x: f64,
}

/// How a field value is drawn
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Nothing to draw
    Skip,
    /// One text run at an anchor
    Run { text: String, x: f64, align: Align },
    /// Individual characters, for letter-spaced fields
    Chars(Vec<PlacedChar>),
}

/// Place a field value according to its layout entry
///
/// `page_width` is needed because right-to-left fields measure their
/// anchor from the right page edge.
pub fn place(
    field: Field,
    pos: &FieldPosition,
    value: &str,
    measure: &dyn Measure,
    page_width: f64,
) -> Placement {
    if value.is_empty() {
        return Placement::Skip;
    }

    let text = if pos.uppercase {
        value.to_uppercase()
    } else {
        value.to_string()
    };

    if let Some(spacing) = pos.letter_spacing {
        if pos.arabic {
            // Spacing out glyphs breaks Arabic shaping; draw the field
            // left-to-right like the other spaced fields.
            log::warn!("{field:?}: letter spacing is not supported for right-to-left text");
        }

        let mut chars = Vec::new();
        let mut x = pos.x;
        for ch in text.chars() {
            chars.push(PlacedChar { ch, x });
            x += measure.width(&ch.to_string(), pos.bold, pos.font_size) + spacing;
        }

        let total = x - pos.x - spacing;
        if total > OVERFLOW_WIDTH {
            log::warn!("{field:?}: value wider than its slot ({total:.0}pt)");
        }

        return Placement::Chars(chars);
    }

    if pos.arabic {
        return Placement::Run {
            text,
            x: page_width - pos.x,
            align: Align::Right,
        };
    }

    let width = measure.width(&text, pos.bold, pos.font_size);
    if width > OVERFLOW_WIDTH {
        log::warn!("{field:?}: value wider than its slot ({width:.0}pt)");
    }

    Placement::Run {
        text,
        x: pos.x,
        align: Align::Left,
    }
}
