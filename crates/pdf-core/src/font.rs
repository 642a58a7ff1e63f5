//! TrueType faces: metrics, Identity-H encoding and embedding objects

use crate::{PdfError, Result};
use lopdf::{Dictionary, Object, Stream};
use std::collections::HashSet;

/// Typeface weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// Font data for an embedded TrueType face
#[derive(Debug, Clone)]
pub struct FontData {
    /// Face identifier used for resource mapping
    pub name: String,
    /// Raw TTF bytes, embedded whole
    pub ttf_data: Vec<u8>,
    /// Characters rendered with this font (drives /W and ToUnicode)
    pub used_chars: HashSet<char>,
    /// Vertical metrics captured when the face was parsed
    metrics: FaceMetrics,
}

/// Scalar metrics lifted out of the face at parse time
#[derive(Debug, Clone, Copy)]
struct FaceMetrics {
    units_per_em: u16,
    ascender: i16,
    descender: i16,
}

impl Default for FaceMetrics {
    fn default() -> Self {
        Self {
            units_per_em: 1000,
            ascender: 800,
            descender: -200,
        }
    }
}

/// The object graph for one embedded face
///
/// Cross references between the dictionaries hold `(0, 0)` placeholders
/// until the document assigns real object ids at embed time.
pub struct FontObjects {
    /// Type0 composite font
    pub type0_font: Dictionary,
    /// CIDFontType2 descendant
    pub cid_font: Dictionary,
    /// Descriptor with the metrics
    pub font_descriptor: Dictionary,
    /// The whole TTF payload
    pub font_file_stream: Stream,
    /// ToUnicode CMap for text extraction
    pub tounicode_stream: Stream,
}

/// A font family with regular and optional bold faces
#[derive(Debug, Clone)]
pub struct FontFamily {
    pub regular: FontData,
    pub bold: Option<FontData>,
}

impl FontFamily {
    /// Get the face for the requested weight, falling back to regular
    pub fn variant(&self, weight: FontWeight) -> &FontData {
        match weight {
            FontWeight::Bold => self.bold.as_ref().unwrap_or(&self.regular),
            FontWeight::Regular => &self.regular,
        }
    }

    /// Mutable access to the face for the requested weight
    pub fn variant_mut(&mut self, weight: FontWeight) -> &mut FontData {
        match weight {
            FontWeight::Bold => match self.bold.as_mut() {
                Some(bold) => bold,
                None => &mut self.regular,
            },
            FontWeight::Regular => &mut self.regular,
        }
    }

    /// Internal font name for the variant (used for PDF resource mapping)
    pub fn variant_name(&self, family_name: &str, weight: FontWeight) -> String {
        match weight {
            FontWeight::Bold if self.bold.is_some() => format!("{family_name}-bold"),
            _ => family_name.to_string(),
        }
    }
}

/// Collects TTF payloads for a family registration
#[derive(Default)]
pub struct FontFamilyBuilder {
    regular: Option<Vec<u8>>,
    bold: Option<Vec<u8>>,
}

impl FontFamilyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regular(mut self, ttf_data: Vec<u8>) -> Self {
        self.regular = Some(ttf_data);
        self
    }

    pub fn bold(mut self, ttf_data: Vec<u8>) -> Self {
        self.bold = Some(ttf_data);
        self
    }

    /// Parse the collected faces into a family
    pub fn build(self, family_name: &str) -> Result<FontFamily> {
        let regular = match self.regular {
            Some(ttf_data) => FontData::from_ttf(family_name, &ttf_data)?,
            None => {
                return Err(PdfError::FontParseError(
                    "FontFamily must have at least a regular variant".to_string(),
                ))
            }
        };

        let bold = self
            .bold
            .map(|data| FontData::from_ttf(&format!("{family_name}-bold"), &data))
            .transpose()?;

        Ok(FontFamily { regular, bold })
    }
}

impl FontData {
    /// Parse TTF bytes into a face with empty usage tracking
    pub fn from_ttf(name: &str, ttf_data: &[u8]) -> Result<Self> {
        let data = ttf_data.to_vec();

        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| PdfError::FontParseError(format!("{e:?}")))?;
        let metrics = FaceMetrics {
            units_per_em: face.units_per_em(),
            ascender: face.ascender(),
            descender: face.descender(),
        };
        drop(face);

        Ok(Self {
            name: name.to_string(),
            ttf_data: data,
            used_chars: HashSet::new(),
            metrics,
        })
    }

    /// View the owned bytes as a face, None when they do not parse
    ///
    /// Parsing only reads the table directory, so glyph lookups borrow
    /// the buffer instead of keeping a long-lived parsed face around.
    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.ttf_data, 0).ok()
    }

    /// Record characters rendered with this font
    pub fn add_chars(&mut self, text: &str) {
        for c in text.chars() {
            self.used_chars.insert(c);
        }
    }

    /// Glyph id the face maps the character to
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.face()
            .and_then(|face| face.glyph_index(c).map(|id| id.0))
    }

    /// Whether the character maps to a real glyph (not .notdef)
    pub fn has_glyph(&self, c: char) -> bool {
        self.glyph_id(c).map(|id| id != 0).unwrap_or(false)
    }

    /// Get glyph advance width in font units
    pub fn glyph_advance(&self, c: char) -> Option<u16> {
        self.face().and_then(|face| {
            let glyph_id = face.glyph_index(c)?;
            face.glyph_hor_advance(glyph_id)
        })
    }

    /// Units per em, 1000 without a face
    pub fn units_per_em(&self) -> u16 {
        self.metrics.units_per_em
    }

    /// Ascender in font units
    pub fn ascender(&self) -> i16 {
        self.metrics.ascender
    }

    /// Descender in font units
    pub fn descender(&self) -> i16 {
        self.metrics.descender
    }

    /// Summed glyph advances in font units
    pub fn text_width(&self, text: &str) -> u32 {
        let face = match self.face() {
            Some(f) => f,
            None => return 0,
        };
        text.chars()
            .filter_map(|c| face.glyph_index(c))
            .filter_map(|gid| face.glyph_hor_advance(gid))
            .map(u32::from)
            .sum()
    }

    /// Advance width of the text in points at a font size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f32 {
        let width = self.text_width(text);
        let units_per_em = self.units_per_em() as f32;
        (width as f32 / units_per_em) * font_size
    }

    /// Build the embedding object graph for this face
    ///
    /// The font file is embedded whole, so glyph IDs in content streams
    /// stay valid without any remapping step.
    pub fn to_pdf_objects(&self) -> Result<FontObjects> {
        let font_name = Object::Name(self.name.clone().into());

        let tounicode_content = self.generate_tounicode_cmap();
        let tounicode_stream = Stream::new(
            Dictionary::from_iter(vec![
                ("Type", "CMap".into()),
                ("Length", (tounicode_content.len() as i32).into()),
            ]),
            tounicode_content.into_bytes(),
        );

        let font_file_stream = Stream::new(
            Dictionary::from_iter(vec![(
                "Length1",
                Object::from(self.ttf_data.len() as i32),
            )]),
            self.ttf_data.clone(),
        );

        let units_per_em = self.units_per_em() as i32;
        let ascender = self.ascender();
        let descender = self.descender();

        let font_bbox = vec![
            0.into(),
            descender.into(),
            units_per_em.into(),
            ascender.into(),
        ];

        let font_descriptor = Dictionary::from_iter(vec![
            ("Type", "FontDescriptor".into()),
            ("FontName", font_name.clone()),
            ("Flags", 4.into()), // Symbolic font
            ("FontBBox", font_bbox.into()),
            ("ItalicAngle", 0.into()),
            ("Ascent", ascender.into()),
            ("Descent", descender.into()),
            ("CapHeight", ascender.into()),
            ("StemV", 80.into()),
            ("FontFile2", Object::Reference((0, 0))), // Set when embedding
        ]);

        let widths_array = self.generate_widths_array();

        let cid_system_info = Dictionary::from_iter(vec![
            ("Registry", "Adobe".into()),
            ("Ordering", "Identity".into()),
            ("Supplement", 0.into()),
        ]);

        let cid_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "CIDFontType2".into()),
            ("BaseFont", font_name.clone()),
            ("CIDSystemInfo", cid_system_info.into()),
            ("FontDescriptor", Object::Reference((0, 0))), // Set when embedding
            ("W", widths_array.into()),
            ("DW", 1000.into()),
        ]);

        let type0_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type0".into()),
            ("BaseFont", font_name),
            ("Encoding", "Identity-H".into()),
            ("DescendantFonts", vec![Object::Reference((0, 0))].into()), // Set when embedding
            ("ToUnicode", Object::Reference((0, 0))),                    // Set when embedding
        ]);

        Ok(FontObjects {
            type0_font,
            cid_font,
            font_descriptor,
            font_file_stream,
            tounicode_stream,
        })
    }

    /// Encode text as a hex string for the PDF Tj operator
    ///
    /// Identity-H encoding: each character becomes its 16-bit glyph ID.
    pub fn encode_text_hex(&self, text: &str) -> String {
        let face = self.face();
        let mut result = String::new();
        for c in text.chars() {
            let gid = face
                .as_ref()
                .and_then(|face| face.glyph_index(c))
                .map_or(0, |id| id.0);
            result.push_str(&format!("{gid:04X}"));
        }
        format!("<{result}>")
    }

    /// /W widths for every glyph in use
    fn generate_widths_array(&self) -> Vec<Object> {
        let mut widths = Vec::new();
        let face = match self.face() {
            Some(f) => f,
            None => return widths,
        };

        let mut gids: Vec<u16> = self
            .used_chars
            .iter()
            .filter_map(|&c| face.glyph_index(c).map(|id| id.0))
            .collect();
        gids.sort();
        gids.dedup();

        // Individual mapping format: gid [width] gid [width] ...
        // Less compact than ranges but correct for any GID distribution.
        for gid in gids {
            let glyph_id = ttf_parser::GlyphId(gid);
            let advance = face.glyph_hor_advance(glyph_id).unwrap_or(1000);
            widths.push(gid.into());
            widths.push(vec![advance.into()].into());
        }

        widths
    }

    /// ToUnicode CMap mapping glyph ids back to Unicode
    fn generate_tounicode_cmap(&self) -> String {
        let mut cmap = String::new();

        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");

        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        let mut char_list: Vec<char> = self.used_chars.iter().copied().collect();
        char_list.sort_by_key(|c| *c as u32);

        if !char_list.is_empty() {
            let face = self.face();
            // The CMap format allows at most 100 entries per bfchar section
            for chunk in char_list.chunks(100) {
                cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
                for c in chunk {
                    let gid = face
                        .as_ref()
                        .and_then(|face| face.glyph_index(*c))
                        .map_or(0, |id| id.0);
                    let unicode = *c as u32;
                    cmap.push_str(&format!("<{gid:04X}> <{unicode:04X}>\n"));
                }
                cmap.push_str("endbfchar\n");
            }
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");

        cmap
    }
}
