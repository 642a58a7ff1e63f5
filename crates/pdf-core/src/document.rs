//! Document assembly on top of lopdf

use crate::image::{generate_image_operators, ImageXObject};
use crate::text::{generate_text_operators, TextRenderContext};
use crate::{Align, FontData, FontFamily, FontFamilyBuilder, FontWeight, PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Fill color, each channel in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Color from normalized channels
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Color from 8-bit channels
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// PDF document built from scratch
///
/// Pages are created with `add_page`, which fixes their size, so the
/// Y-flip from top-origin coordinates never has to chase inherited
/// MediaBox entries. Text and image operators are buffered per page
/// and flushed into content streams at save time, after the complete
/// character set of every font is known.
pub struct PdfDocument {
    /// Object store for the document being built
    inner: Document,
    /// Reserved object id for the page tree root
    pages_id: ObjectId,
    /// Page object ids in page order
    page_ids: Vec<ObjectId>,
    /// Page sizes in points, (width, height), in page order
    page_sizes: Vec<(f64, f64)>,
    /// Families keyed by registration name
    families: HashMap<String, FontFamily>,
    current_family: Option<String>,
    current_weight: FontWeight,
    current_font_size: f32,
    current_text_color: Color,
    /// Face name to embedded font object
    embedded_fonts: HashMap<String, ObjectId>,
    /// Per page, face name to content stream resource name
    page_font_resources: HashMap<usize, HashMap<String, String>>,
    next_font_resource: u32,
    /// Image bytes hash to embedded XObject, for deduplication
    embedded_images: HashMap<u64, ObjectId>,
    /// Per page, resource name to image object
    page_image_resources: HashMap<usize, HashMap<String, ObjectId>>,
    next_image_resource: u32,
    /// Operators accumulated per page until save
    page_content_buffer: HashMap<usize, Vec<u8>>,
}

impl PdfDocument {
    /// Create a new empty document
    ///
    /// The document has no pages until `add_page` is called.
    pub fn new() -> Self {
        let mut inner = Document::with_version("1.5");

        let pages_id = inner.new_object_id();
        let catalog = Dictionary::from_iter(vec![
            ("Type", "Catalog".into()),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = inner.add_object(catalog);
        inner.trailer.set("Root", Object::Reference(catalog_id));

        Self {
            inner,
            pages_id,
            page_ids: Vec::new(),
            page_sizes: Vec::new(),
            families: HashMap::new(),
            current_family: None,
            current_weight: FontWeight::default(),
            current_font_size: 12.0,
            current_text_color: Color::default(),
            embedded_fonts: HashMap::new(),
            page_font_resources: HashMap::new(),
            next_font_resource: 1,
            embedded_images: HashMap::new(),
            page_image_resources: HashMap::new(),
            next_image_resource: 1,
            page_content_buffer: HashMap::new(),
        }
    }

    /// Add a page of the given size in points, returning its
    /// 1-indexed page number
    pub fn add_page(&mut self, width: f64, height: f64) -> usize {
        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(self.pages_id));
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ]),
        );
        page_dict.set("Resources", Object::Dictionary(Dictionary::new()));

        let page_id = self.inner.add_object(Object::Dictionary(page_dict));
        self.page_ids.push(page_id);
        self.page_sizes.push((width, height));

        self.page_ids.len()
    }

    /// Number of pages added so far
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Get a page's size in points, (width, height)
    pub fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        self.page_sizes
            .get(page.wrapping_sub(1))
            .copied()
            .ok_or(PdfError::InvalidPage(page, self.page_ids.len()))
    }

    /// Register a single-face font under a name
    ///
    /// The face is stored as a family with no bold variant. For
    /// regular/bold pairs use `register_font_family`.
    pub fn add_font(&mut self, name: &str, ttf_data: &[u8]) -> Result<()> {
        if self.families.contains_key(name) {
            return Err(PdfError::FontAlreadyExists(name.to_string()));
        }

        let regular = FontData::from_ttf(name, ttf_data)?;
        self.families
            .insert(name.to_string(), FontFamily { regular, bold: None });

        Ok(())
    }

    /// Register a font family with its faces
    ///
    /// # Example
    /// ```ignore
    /// doc.register_font_family("amiri",
    ///     FontFamilyBuilder::new()
    ///         .regular(std::fs::read("Amiri-Regular.ttf")?)
    ///         .bold(std::fs::read("Amiri-Bold.ttf")?)
    /// )?;
    /// ```
    pub fn register_font_family(&mut self, name: &str, builder: FontFamilyBuilder) -> Result<()> {
        if self.families.contains_key(name) {
            return Err(PdfError::FontAlreadyExists(name.to_string()));
        }

        let family = builder.build(name)?;
        self.families.insert(name.to_string(), family);

        Ok(())
    }

    /// Set the current font family and size
    pub fn set_font(&mut self, family: &str, size: f32) -> Result<()> {
        if !self.families.contains_key(family) {
            return Err(PdfError::FontNotFound(family.to_string()));
        }

        self.current_family = Some(family.to_string());
        self.current_font_size = size;

        Ok(())
    }

    /// Set only the font size (keeps current family/weight)
    pub fn set_font_size(&mut self, size: f32) -> Result<()> {
        if self.current_family.is_none() {
            return Err(PdfError::FontNotFound("no current font family".to_string()));
        }

        self.current_font_size = size;
        Ok(())
    }

    /// Set the font weight (keeps current family/size)
    pub fn set_font_weight(&mut self, weight: FontWeight) -> Result<()> {
        if self.current_family.is_none() {
            return Err(PdfError::FontNotFound("no current font family".to_string()));
        }

        self.current_weight = weight;
        Ok(())
    }

    /// Color for subsequent text draws
    pub fn set_text_color(&mut self, color: Color) {
        self.current_text_color = color;
    }

    /// Name of the active font face, after weight fallback
    fn current_font_name(&self) -> Result<String> {
        let family_name = self
            .current_family
            .as_ref()
            .ok_or_else(|| PdfError::FontNotFound("no current font family".to_string()))?;

        let family = self
            .families
            .get(family_name)
            .ok_or_else(|| PdfError::FontNotFound(family_name.clone()))?;

        Ok(family.variant_name(family_name, self.current_weight))
    }

    /// Get font data by face name
    fn font_data(&self, name: &str) -> Result<&FontData> {
        for family in self.families.values() {
            for face in std::iter::once(&family.regular).chain(family.bold.as_ref()) {
                if face.name == name {
                    return Ok(face);
                }
            }
        }

        Err(PdfError::FontNotFound(name.to_string()))
    }

    /// Get mutable font data by face name
    fn font_data_mut(&mut self, name: &str) -> Result<&mut FontData> {
        for family in self.families.values_mut() {
            for face in std::iter::once(&mut family.regular).chain(family.bold.as_mut()) {
                if face.name == name {
                    return Ok(face);
                }
            }
        }

        Err(PdfError::FontNotFound(name.to_string()))
    }

    /// Draw text on a page with the current font state
    ///
    /// `y` is measured from the top edge. `align` decides whether `x`
    /// anchors the run's left edge, midpoint or right edge. Empty
    /// text draws nothing.
    pub fn insert_text(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        align: Align,
    ) -> Result<()> {
        let page_count = self.page_ids.len();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }

        // Nothing to render
        if text.is_empty() {
            return Ok(());
        }

        let font_name = self.current_font_name()?;
        let font_size = self.current_font_size;

        // Full fonts are embedded, so glyph IDs are stable and the
        // text can be encoded immediately.
        let (text_hex, text_width) = {
            let font_data = self.font_data_mut(&font_name)?;
            font_data.add_chars(text);
            (
                font_data.encode_text_hex(text),
                font_data.text_width_points(text, font_size) as f64,
            )
        };

        let font_resource_name = self.get_or_create_font_ref(&font_name, page)?;

        // Flip from top-origin to the PDF's bottom-origin
        let page_height = self.page_sizes[page - 1].1;
        let pdf_y = page_height - y;

        let start_x = match align {
            Align::Left => x,
            Align::Center => x - (text_width / 2.0),
            Align::Right => x - text_width,
        };

        let ctx = TextRenderContext {
            font_name: font_resource_name,
            font_size,
            text_width,
            color: self.current_text_color,
        };

        let operators = generate_text_operators(&text_hex, start_x, pdf_y, Align::Left, &ctx);
        self.buffer_content(page, &operators);

        Ok(())
    }

    /// Measure text width in points with the current font and size
    pub fn text_width(&self, text: &str) -> Result<f64> {
        let font_name = self.current_font_name()?;
        let font_data = self.font_data(&font_name)?;

        Ok(font_data.text_width_points(text, self.current_font_size) as f64)
    }

    /// Draw an image (JPEG or PNG bytes) stretched to the given size
    ///
    /// `y` is measured from the top edge to the image's top.
    pub fn insert_image(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let page_count = self.page_ids.len();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }

        let image_resource_name = self.get_or_create_image_ref(data, page)?;

        // Flip from top-origin to the PDF's bottom-origin
        let page_height = self.page_sizes[page - 1].1;
        let pdf_y = page_height - y - height;

        let operators = generate_image_operators(&image_resource_name, x, pdf_y, width, height);
        self.buffer_content(page, &operators);

        Ok(())
    }

    /// Finalize and write the document to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.finalize()?;

        self.inner
            .save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Finalize and serialize the document
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.finalize()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Assemble the final object graph before serialization
    fn finalize(&mut self) -> Result<()> {
        // 1. Embed fonts with their complete character sets
        self.embed_fonts()?;

        // 2. Flush buffered content streams to pages
        self.flush_content_buffers()?;

        // 3. Write Font and XObject entries into page resources
        self.finalize_page_resources()?;

        // 4. Write the page tree root
        self.write_page_tree();

        Ok(())
    }

    /// Embed all used fonts into the PDF
    fn embed_fonts(&mut self) -> Result<()> {
        // Re-embed on every save so character sets are complete
        self.embedded_fonts.clear();

        let mut font_names: Vec<String> = Vec::new();
        for family in self.families.values() {
            for face in std::iter::once(&family.regular).chain(family.bold.as_ref()) {
                if !face.used_chars.is_empty() {
                    font_names.push(face.name.clone());
                }
            }
        }

        font_names.sort();
        font_names.dedup();

        for font_name in font_names {
            self.embed_font_object(&font_name)?;
        }

        Ok(())
    }

    /// Wire one face's object graph into the document
    fn embed_font_object(&mut self, font_name: &str) -> Result<ObjectId> {
        let font_data = self.font_data(font_name)?;

        let font_objects = font_data.to_pdf_objects()?;

        let font_file_id = self.inner.add_object(font_objects.font_file_stream);

        let mut font_descriptor = font_objects.font_descriptor;
        font_descriptor.set("FontFile2", Object::Reference(font_file_id));
        let font_descriptor_id = self.inner.add_object(font_descriptor);

        let mut cid_font = font_objects.cid_font;
        cid_font.set("FontDescriptor", Object::Reference(font_descriptor_id));
        let cid_font_id = self.inner.add_object(cid_font);

        let mut type0_font = font_objects.type0_font;
        type0_font.set(
            "DescendantFonts",
            Object::Array(vec![Object::Reference(cid_font_id)]),
        );

        let tounicode_id = self.inner.add_object(font_objects.tounicode_stream);
        type0_font.set("ToUnicode", Object::Reference(tounicode_id));

        let type0_font_id = self.inner.add_object(type0_font);

        self.embedded_fonts
            .insert(font_name.to_string(), type0_font_id);

        Ok(type0_font_id)
    }

    /// Resource name for a face on a page, allocating one if new
    ///
    /// Returns the resource name (e.g., "F1", "F2") for use in content
    /// streams. The font itself is embedded at save time, once every
    /// character it renders is known.
    fn get_or_create_font_ref(&mut self, font_name: &str, page: usize) -> Result<String> {
        let page_resources = self.page_font_resources.entry(page).or_default();

        if let Some(resource_name) = page_resources.get(font_name) {
            return Ok(resource_name.clone());
        }

        let resource_name = format!("F{}", self.next_font_resource);
        self.next_font_resource += 1;

        page_resources.insert(font_name.to_string(), resource_name.clone());

        Ok(resource_name)
    }

    /// Resource name for image data on a page
    ///
    /// Returns the resource name (e.g., "Im1"). Identical image data is
    /// embedded once and shared between pages.
    fn get_or_create_image_ref(&mut self, data: &[u8], page: usize) -> Result<String> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        if !self.embedded_images.contains_key(&data_hash) {
            let xobject = ImageXObject::from_bytes(data)?;
            let object_id = self.inner.add_object(xobject.to_pdf_stream());
            self.embedded_images.insert(data_hash, object_id);
        }

        let object_id = self.embedded_images[&data_hash];

        let page_resources = self.page_image_resources.entry(page).or_default();
        for (name, id) in page_resources.iter() {
            if *id == object_id {
                return Ok(name.clone());
            }
        }

        let resource_name = format!("Im{}", self.next_image_resource);
        self.next_image_resource += 1;

        page_resources.insert(resource_name.clone(), object_id);

        Ok(resource_name)
    }

    /// Append operators to a page's pending content
    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Flush all buffered content into page content streams
    fn flush_content_buffers(&mut self) -> Result<()> {
        let buffers: Vec<(usize, Vec<u8>)> = self.page_content_buffer.drain().collect();

        for (page, content) in buffers {
            if content.is_empty() {
                continue;
            }

            let page_id = self.page_ids[page - 1];

            // Preserve any stream written by an earlier save
            let existing = {
                let page_dict = self.inner.get_object(page_id)?.as_dict()?;
                match page_dict.get(b"Contents") {
                    Ok(Object::Reference(ref_id)) => {
                        match self.inner.get_object(*ref_id) {
                            Ok(Object::Stream(stream)) => stream
                                .decompressed_content()
                                .unwrap_or_else(|_| stream.content.clone()),
                            _ => Vec::new(),
                        }
                    }
                    _ => Vec::new(),
                }
            };

            let mut combined = existing;
            combined.extend_from_slice(&content);

            let stream_id = self
                .inner
                .add_object(Stream::new(Dictionary::new(), combined));

            let mut page_dict = self.inner.get_object(page_id)?.as_dict()?.clone();
            page_dict.set("Contents", Object::Reference(stream_id));
            self.inner.objects.insert(page_id, page_dict.into());
        }

        Ok(())
    }

    /// Write Font and XObject dictionaries into each page's resources
    fn finalize_page_resources(&mut self) -> Result<()> {
        for (index, &page_id) in self.page_ids.iter().enumerate() {
            let page = index + 1;

            let mut resources = Dictionary::new();

            if let Some(fonts) = self.page_font_resources.get(&page) {
                let mut font_dict = Dictionary::new();
                for (font_name, resource_name) in fonts {
                    let font_ref = self
                        .embedded_fonts
                        .get(font_name)
                        .ok_or_else(|| PdfError::FontNotFound(font_name.clone()))?;
                    font_dict.set(resource_name.as_bytes(), Object::Reference(*font_ref));
                }
                if !font_dict.is_empty() {
                    resources.set("Font", Object::Dictionary(font_dict));
                }
            }

            if let Some(images) = self.page_image_resources.get(&page) {
                let mut xobject_dict = Dictionary::new();
                for (resource_name, object_id) in images {
                    xobject_dict.set(resource_name.as_bytes(), Object::Reference(*object_id));
                }
                if !xobject_dict.is_empty() {
                    resources.set("XObject", Object::Dictionary(xobject_dict));
                }
            }

            let mut page_dict = self.inner.get_object(page_id)?.as_dict()?.clone();
            page_dict.set("Resources", Object::Dictionary(resources));
            self.inner.objects.insert(page_id, page_dict.into());
        }

        Ok(())
    }

    /// Write the page tree root with the current Kids list
    fn write_page_tree(&mut self) {
        let kids: Vec<Object> = self
            .page_ids
            .iter()
            .map(|&id| Object::Reference(id))
            .collect();

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(kids));
        pages.set("Count", Object::Integer(self.page_ids.len() as i64));

        self.inner
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));
    }
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}
