//! Declarative field layout over the scanned templates
//!
//! Coordinates were calibrated against the scanned registration forms
//! and are expressed in points from the top-left corner of the page.
//! The PDF layer flips Y; right-to-left fields are anchored from the
//! right page edge at draw time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Page width of the scanned templates, in points (A4)
pub const PAGE_WIDTH: f64 = 595.0;
/// Page height of the scanned templates, in points (A4)
pub const PAGE_HEIGHT: f64 = 842.0;

/// Document variant, chosen from the player's age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Adult,
    Minor,
}

/// A field that can be drawn onto a registration document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    // Adult player
    FirstNameAr,
    LastNameAr,
    FirstName,
    LastName,
    DateOfBirth,
    PlaceOfBirthAr,
    NationalId,
    Email,
    SignatureCheckbox,

    // Club and league, printed on both variants
    Club,
    ClubNumber,
    League,
    LeagueNumber,

    // Guardian of a minor
    GuardianFirstNameAr,
    GuardianLastNameAr,
    GuardianFirstName,
    GuardianLastName,
    GuardianDateOfBirth,
    GuardianAge,
    GuardianPlaceOfBirthAr,
    GuardianNationalId,
    GuardianPhone,

    // Minor player
    MinorFirstNameAr,
    MinorLastNameAr,
    MinorFirstName,
    MinorLastName,
    MinorDateOfBirth,
    MinorPlaceOfBirthAr,
    BirthCertificateNumber,

    // Guardian kinship
    FatherCheckbox,
    MotherCheckbox,
    BrotherCheckbox,
    OtherKinshipText,
}

impl Field {
    /// Whether the field's value comes from the club configuration
    /// instead of the form
    pub fn hardcoded(&self) -> bool {
        matches!(
            self,
            Field::Club | Field::ClubNumber | Field::League | Field::LeagueNumber
        )
    }
}

/// Placement and styling of one field on the document
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPosition {
    /// X in points from the left edge. For right-to-left fields this
    /// is the distance of the text's right edge from the RIGHT page
    /// edge.
    pub x: f64,
    /// Y in points from the top edge
    pub y: f64,
    /// Page number (1-indexed)
    pub page: usize,
    /// Font size in points
    pub font_size: f32,
    /// Draw with the bold face
    pub bold: bool,
    /// Right-to-left field, anchored from the right page edge
    pub arabic: bool,
    /// Uppercase the value before drawing
    pub uppercase: bool,
    /// Extra spacing between characters, in points
    pub letter_spacing: Option<f64>,
    /// Fixed glyph drawn instead of a form value (checkboxes)
    pub symbol: Option<char>,
}

impl FieldPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            page: 1,
            font_size: 12.0,
            bold: false,
            arabic: false,
            uppercase: false,
            letter_spacing: None,
            symbol: None,
        }
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn arabic(mut self) -> Self {
        self.arabic = true;
        self
    }

    pub fn uppercase(mut self) -> Self {
        self.uppercase = true;
        self
    }

    pub fn letter_spacing(mut self, spacing: f64) -> Self {
        self.letter_spacing = Some(spacing);
        self
    }

    pub fn symbol(mut self, symbol: char) -> Self {
        self.symbol = Some(symbol);
        self
    }
}

/// Font size for Arabic fields
const AR_SIZE: f32 = 18.0;
/// Checkbox tick glyph
const TICK: char = '\u{2714}';

/// Draw order for the adult document
pub const ADULT_FIELDS: &[Field] = &[
    Field::FirstNameAr,
    Field::LastNameAr,
    Field::PlaceOfBirthAr,
    Field::FirstName,
    Field::LastName,
    Field::DateOfBirth,
    Field::NationalId,
    Field::Club,
    Field::ClubNumber,
    Field::League,
    Field::LeagueNumber,
    Field::SignatureCheckbox,
    Field::Email,
];

/// Draw order for the minor document
pub const MINOR_FIELDS: &[Field] = &[
    Field::GuardianFirstNameAr,
    Field::GuardianLastNameAr,
    Field::GuardianPlaceOfBirthAr,
    Field::MinorFirstNameAr,
    Field::MinorLastNameAr,
    Field::MinorPlaceOfBirthAr,
    Field::GuardianFirstName,
    Field::GuardianLastName,
    Field::GuardianDateOfBirth,
    Field::GuardianAge,
    Field::GuardianNationalId,
    Field::MinorDateOfBirth,
    Field::BirthCertificateNumber,
    Field::Club,
    Field::ClubNumber,
    Field::League,
    Field::LeagueNumber,
    Field::GuardianPhone,
];

/// Field positions per document variant
#[derive(Debug, Clone)]
pub struct Layout {
    adult: HashMap<Field, FieldPosition>,
    minor: HashMap<Field, FieldPosition>,
}

impl Layout {
    /// The layout calibrated against the scanned club templates
    pub fn standard() -> Self {
        let mut adult = HashMap::new();
        adult.insert(
            Field::FirstNameAr,
            FieldPosition::new(117.0, 223.0).arabic().bold().size(AR_SIZE),
        );
        adult.insert(
            Field::LastNameAr,
            FieldPosition::new(105.0, 245.0).arabic().bold().size(AR_SIZE),
        );
        adult.insert(
            Field::FirstName,
            FieldPosition::new(122.0, 220.0).bold().size(13.0).uppercase(),
        );
        adult.insert(
            Field::LastName,
            FieldPosition::new(115.0, 243.0).bold().size(13.0).uppercase(),
        );
        adult.insert(
            Field::DateOfBirth,
            FieldPosition::new(131.0, 264.0).bold().size(14.0).letter_spacing(13.0),
        );
        adult.insert(
            Field::PlaceOfBirthAr,
            FieldPosition::new(490.0, 267.0).arabic().bold().size(AR_SIZE),
        );
        adult.insert(
            Field::NationalId,
            FieldPosition::new(327.0, 290.0).bold().size(13.0).uppercase().letter_spacing(10.0),
        );
        adult.insert(
            Field::Club,
            FieldPosition::new(407.0, 175.0).bold().size(13.0).uppercase(),
        );
        adult.insert(
            Field::ClubNumber,
            FieldPosition::new(288.0, 175.0).bold().size(13.0).letter_spacing(10.0),
        );
        adult.insert(
            Field::League,
            FieldPosition::new(138.0, 175.0).bold().size(13.0).uppercase().letter_spacing(3.0),
        );
        adult.insert(
            Field::LeagueNumber,
            FieldPosition::new(22.0, 175.0).bold().size(13.0).letter_spacing(20.0),
        );
        adult.insert(Field::Email, FieldPosition::new(400.0, 210.0).page(2));
        adult.insert(
            Field::SignatureCheckbox,
            FieldPosition::new(553.0, 395.0).size(20.0).symbol(TICK),
        );

        let mut minor = HashMap::new();
        minor.insert(
            Field::GuardianFirstNameAr,
            FieldPosition::new(115.0, 238.0).arabic().bold().size(AR_SIZE),
        );
        minor.insert(
            Field::GuardianLastNameAr,
            FieldPosition::new(105.0, 260.0).arabic().bold().size(AR_SIZE),
        );
        minor.insert(
            Field::GuardianFirstName,
            FieldPosition::new(122.0, 235.0).bold().size(13.0).uppercase(),
        );
        minor.insert(
            Field::GuardianLastName,
            FieldPosition::new(115.0, 258.0).bold().size(13.0).uppercase(),
        );
        minor.insert(
            Field::GuardianDateOfBirth,
            FieldPosition::new(131.0, 279.0).bold().size(14.0).letter_spacing(13.0),
        );
        minor.insert(
            Field::GuardianPlaceOfBirthAr,
            FieldPosition::new(497.0, 282.0).arabic().bold().size(AR_SIZE),
        );
        minor.insert(
            Field::GuardianNationalId,
            FieldPosition::new(326.0, 305.0).bold().size(13.0).uppercase().letter_spacing(10.0),
        );
        // GuardianAge is collected by the form but has no slot on the
        // current template scan, so it is deliberately absent here.
        minor.insert(
            Field::Club,
            FieldPosition::new(407.0, 188.0).bold().size(13.0).uppercase(),
        );
        minor.insert(
            Field::ClubNumber,
            FieldPosition::new(275.0, 188.0).bold().size(13.0).letter_spacing(13.0),
        );
        minor.insert(
            Field::League,
            FieldPosition::new(138.0, 188.0).bold().size(13.0).uppercase().letter_spacing(3.0),
        );
        minor.insert(
            Field::LeagueNumber,
            FieldPosition::new(22.0, 188.0).bold().size(13.0).letter_spacing(20.0),
        );
        minor.insert(
            Field::MinorFirstNameAr,
            FieldPosition::new(115.0, 370.0).arabic().bold().size(AR_SIZE),
        );
        minor.insert(
            Field::MinorLastNameAr,
            FieldPosition::new(332.0, 370.0).arabic().bold().size(AR_SIZE),
        );
        // Calibrated but not in the draw order: the minor's Latin name
        // slots overlap the page header on the current scan.
        minor.insert(
            Field::MinorFirstName,
            FieldPosition::new(122.0, 135.0).bold().size(13.0).uppercase(),
        );
        minor.insert(
            Field::MinorLastName,
            FieldPosition::new(115.0, 158.0).bold().size(13.0).uppercase(),
        );
        minor.insert(
            Field::MinorDateOfBirth,
            FieldPosition::new(133.0, 387.0).bold().size(14.0).letter_spacing(13.0),
        );
        minor.insert(
            Field::MinorPlaceOfBirthAr,
            FieldPosition::new(484.0, 391.0).arabic().bold().size(AR_SIZE),
        );
        minor.insert(
            Field::BirthCertificateNumber,
            FieldPosition::new(405.0, 411.0).bold().size(14.0),
        );
        minor.insert(
            Field::GuardianPhone,
            FieldPosition::new(400.0, 300.0).page(2).size(12.0),
        );
        minor.insert(
            Field::FatherCheckbox,
            FieldPosition::new(372.0, 325.0).size(20.0).symbol(TICK),
        );
        minor.insert(
            Field::MotherCheckbox,
            FieldPosition::new(301.0, 325.0).size(20.0).symbol(TICK),
        );
        minor.insert(
            Field::BrotherCheckbox,
            FieldPosition::new(229.0, 325.0).size(20.0).symbol(TICK),
        );
        minor.insert(
            Field::OtherKinshipText,
            FieldPosition::new(457.0, 328.0).arabic().bold().size(AR_SIZE),
        );

        Self { adult, minor }
    }

    /// Look up the position of a field on a variant
    pub fn position(&self, variant: Variant, field: Field) -> Option<&FieldPosition> {
        match variant {
            Variant::Adult => self.adult.get(&field),
            Variant::Minor => self.minor.get(&field),
        }
    }

    /// The fields drawn for a variant, in draw order
    pub fn fields(variant: Variant) -> &'static [Field] {
        match variant {
            Variant::Adult => ADULT_FIELDS,
            Variant::Minor => MINOR_FIELDS,
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::standard()
    }
}
