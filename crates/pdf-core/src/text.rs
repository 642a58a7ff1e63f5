//! Text operator generation

use crate::document::Color;
use crate::Align;

/// Parameters shared by every text run of one draw call
pub struct TextRenderContext {
    /// Page font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Measured run width in points, used for anchoring
    pub text_width: f64,
    /// Fill color
    pub color: Color,
}

/// Content stream operators for one text run
///
/// `x`/`y` are bottom-origin PDF coordinates. `align` interprets `x`
/// as the run's left edge, midpoint or right edge, shifting by the
/// measured width accordingly.
pub fn generate_text_operators(
    text_hex: &str,
    x: f64,
    y: f64,
    align: Align,
    ctx: &TextRenderContext,
) -> Vec<u8> {
    let anchored_x = match align {
        Align::Left => x,
        Align::Center => x - ctx.text_width / 2.0,
        Align::Right => x - ctx.text_width,
    };

    let Color { r, g, b } = ctx.color;
    format!(
        "BT\n{r} {g} {b} rg\n/{} {} Tf\n{anchored_x} {y} Td\n{text_hex} Tj\nET\n",
        ctx.font_name, ctx.font_size,
    )
    .into_bytes()
}
