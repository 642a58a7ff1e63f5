//! Document assembly
//!
//! Builds the two-page registration PDF: scanned template images as
//! full-page backgrounds, then the form values placed field by field
//! according to the variant's layout.

use crate::assets::{AssetSource, Face};
use crate::form::{variant_for, HardcodedValues, Kinship, RegistrationForm};
use crate::layout::{Field, FieldPosition, Layout, Variant, PAGE_HEIGHT, PAGE_WIDTH};
use crate::placement::{place, Measure, Placement};
use crate::{GenerateError, Result};
use chrono::NaiveDate;
use pdf_core::{Align, FontData, FontFamilyBuilder, FontWeight, PdfDocument};
use std::sync::atomic::{AtomicBool, Ordering};

/// A layout gap found while generating
///
/// Missing layout entries skip the field and surface here instead of
/// failing the whole document.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationWarning {
    pub field: Field,
    pub message: String,
}

impl std::fmt::Display for ConfigurationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.field, self.message)
    }
}

/// A generated PDF with the warnings collected along the way
pub struct GeneratedDocument {
    pub bytes: Vec<u8>,
    pub warnings: Vec<ConfigurationWarning>,
}

/// Measures text with the same faces the document embeds
struct FontMeasure {
    regular: FontData,
    bold: FontData,
}

impl FontMeasure {
    fn new(regular: &[u8], bold: &[u8]) -> Result<Self> {
        Ok(Self {
            regular: FontData::from_ttf("measure", regular)?,
            bold: FontData::from_ttf("measure-bold", bold)?,
        })
    }
}

impl Measure for FontMeasure {
    fn width(&self, text: &str, bold: bool, size: f32) -> f64 {
        let font = if bold { &self.bold } else { &self.regular };
        font.text_width_points(text, size) as f64
    }
}

/// Clears the in-flight flag when a generation ends, on any path
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Registration document generator
///
/// One generator can be shared; concurrent generations are rejected
/// with `GenerateError::Busy` rather than queued, mirroring the
/// submit-button lockout on the site.
pub struct Generator {
    layout: Layout,
    hardcoded: HardcodedValues,
    in_flight: AtomicBool,
}

impl Generator {
    /// Generator with the standard layout and club identity
    pub fn new() -> Self {
        Self::with_layout(Layout::standard(), HardcodedValues::default())
    }

    pub fn with_layout(layout: Layout, hardcoded: HardcodedValues) -> Self {
        Self {
            layout,
            hardcoded,
            in_flight: AtomicBool::new(false),
        }
    }

    fn begin(&self) -> Result<FlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| GenerateError::Busy)?;
        Ok(FlightGuard(&self.in_flight))
    }

    /// Generate the registration document for a form
    ///
    /// The variant is chosen from the player's date of birth against
    /// today's date.
    pub fn generate(
        &self,
        form: &RegistrationForm,
        kinship: Option<Kinship>,
        other_kinship: &str,
        assets: &dyn AssetSource,
    ) -> Result<GeneratedDocument> {
        self.generate_at(
            form,
            kinship,
            other_kinship,
            assets,
            chrono::Local::now().date_naive(),
        )
    }

    /// Generate the registration document against a fixed date
    pub fn generate_at(
        &self,
        form: &RegistrationForm,
        kinship: Option<Kinship>,
        other_kinship: &str,
        assets: &dyn AssetSource,
        today: NaiveDate,
    ) -> Result<GeneratedDocument> {
        let _guard = self.begin()?;

        let variant = variant_for(&form.date_of_birth, today);

        let mut doc = PdfDocument::new();
        doc.add_page(PAGE_WIDTH, PAGE_HEIGHT);
        doc.add_page(PAGE_WIDTH, PAGE_HEIGHT);

        let regular = assets.font(Face::Regular)?;
        let bold = assets.font(Face::Bold)?;
        let symbol = assets.font(Face::Symbol)?;

        let measure = FontMeasure::new(&regular, &bold)?;
        doc.register_font_family(
            "main",
            FontFamilyBuilder::new().regular(regular).bold(bold),
        )?;
        doc.add_font("symbol", &symbol)?;

        for page in 1..=2 {
            let scan = assets.template(variant, page)?;
            doc.insert_image(&scan, page, 0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT)?;
        }

        let mut warnings = Vec::new();

        for &field in Layout::fields(variant) {
            let Some(pos) = self.layout.position(variant, field) else {
                log::warn!("no layout entry for {field:?} on the {variant:?} document");
                warnings.push(ConfigurationWarning {
                    field,
                    message: "no layout entry, field skipped".to_string(),
                });
                continue;
            };

            let value = if field.hardcoded() {
                self.hardcoded.value(field).unwrap_or("")
            } else {
                form.value(field).unwrap_or("")
            };

            self.draw_field(&mut doc, field, pos, value, &measure)
                .map_err(|source| GenerateError::Draw { field, source })?;
        }

        if variant == Variant::Minor {
            self.draw_kinship(&mut doc, kinship, other_kinship, &measure, &mut warnings)?;
        }

        Ok(GeneratedDocument {
            bytes: doc.to_bytes()?,
            warnings,
        })
    }

    /// Generate the placeholder for the supplementary document
    pub fn generate_additional(&self, assets: &dyn AssetSource) -> Result<GeneratedDocument> {
        let _guard = self.begin()?;

        let mut doc = PdfDocument::new();
        doc.add_page(PAGE_WIDTH, PAGE_HEIGHT);

        let regular = assets.font(Face::Regular)?;
        doc.add_font("main", &regular)?;
        doc.set_font("main", 24.0)?;
        doc.insert_text("Additional Document", 1, 50.0, 50.0, Align::Left)?;

        Ok(GeneratedDocument {
            bytes: doc.to_bytes()?,
            warnings: Vec::new(),
        })
    }

    /// Draw one field: a checkbox glyph, or a placed text value
    fn draw_field(
        &self,
        doc: &mut PdfDocument,
        field: Field,
        pos: &FieldPosition,
        value: &str,
        measure: &FontMeasure,
    ) -> std::result::Result<(), pdf_core::PdfError> {
        if let Some(symbol) = pos.symbol {
            doc.set_font("symbol", pos.font_size)?;
            doc.insert_text(&symbol.to_string(), pos.page, pos.x, pos.y, Align::Left)?;
            return Ok(());
        }

        doc.set_font("main", pos.font_size)?;
        doc.set_font_weight(if pos.bold {
            FontWeight::Bold
        } else {
            FontWeight::Regular
        })?;

        match place(field, pos, value, measure, PAGE_WIDTH) {
            Placement::Skip => {}
            Placement::Run { text, x, align } => {
                doc.insert_text(&text, pos.page, x, pos.y, align)?;
            }
            Placement::Chars(chars) => {
                for placed in chars {
                    doc.insert_text(
                        &placed.ch.to_string(),
                        pos.page,
                        placed.x,
                        pos.y,
                        Align::Left,
                    )?;
                }
            }
        }

        Ok(())
    }

    /// Tick the selected kinship box, or write the free-text kinship
    fn draw_kinship(
        &self,
        doc: &mut PdfDocument,
        kinship: Option<Kinship>,
        other_kinship: &str,
        measure: &FontMeasure,
        warnings: &mut Vec<ConfigurationWarning>,
    ) -> Result<()> {
        let Some(kinship) = kinship else {
            return Ok(());
        };

        let (field, value) = match kinship {
            Kinship::Father => (Field::FatherCheckbox, ""),
            Kinship::Mother => (Field::MotherCheckbox, ""),
            Kinship::Brother => (Field::BrotherCheckbox, ""),
            Kinship::Other => (Field::OtherKinshipText, other_kinship),
        };

        let Some(pos) = self.layout.position(Variant::Minor, field) else {
            log::warn!("no layout entry for {field:?} on the Minor document");
            warnings.push(ConfigurationWarning {
                field,
                message: "no layout entry, field skipped".to_string(),
            });
            return Ok(());
        };

        self.draw_field(doc, field, pos, value, measure)
            .map_err(|source| GenerateError::Draw { field, source })
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}
