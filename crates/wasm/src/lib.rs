//! WASM bindings for the enrollment document generator.
//!
//! The JavaScript side loads the scanned template images and font files
//! once, then calls `generate` with the registration form for each
//! download request. All assets stay in memory for the lifetime of the
//! `EnrollmentPdf` instance.

use chrono::NaiveDate;
use wasm_bindgen::prelude::*;

use enrollment::assets::{Face, MemoryAssets};
use enrollment::form::{Kinship, RegistrationForm};
use enrollment::layout::Variant;
use enrollment::Generator;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn parse_variant(variant: &str) -> Result<Variant, JsValue> {
    match variant {
        "adult" => Ok(Variant::Adult),
        "minor" => Ok(Variant::Minor),
        other => Err(JsValue::from_str(&format!("unknown variant: {other}"))),
    }
}

fn parse_face(face: &str) -> Result<Face, JsValue> {
    match face {
        "regular" => Ok(Face::Regular),
        "bold" => Ok(Face::Bold),
        "symbol" => Ok(Face::Symbol),
        other => Err(JsValue::from_str(&format!("unknown font face: {other}"))),
    }
}

fn parse_kinship(kinship: Option<String>) -> Result<Option<Kinship>, JsValue> {
    match kinship.as_deref() {
        None | Some("") | Some("none") => Ok(None),
        Some("father") => Ok(Some(Kinship::Father)),
        Some("mother") => Ok(Some(Kinship::Mother)),
        Some("brother") => Ok(Some(Kinship::Brother)),
        Some("other") => Ok(Some(Kinship::Other)),
        Some(other) => Err(JsValue::from_str(&format!("unknown kinship: {other}"))),
    }
}

/// Today's date as seen by the browser. The generator takes the date as
/// a parameter so the age cutoff follows the client clock.
fn browser_today() -> Result<NaiveDate, JsValue> {
    let now = js_sys::Date::new_0();
    let year = now.get_full_year() as i32;
    let month = now.get_month() + 1;
    let day = now.get_date();
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| JsValue::from_str("invalid browser date"))
}

#[wasm_bindgen]
pub struct EnrollmentPdf {
    assets: MemoryAssets,
    generator: Generator,
}

#[wasm_bindgen]
impl EnrollmentPdf {
    #[wasm_bindgen(constructor)]
    pub fn new() -> EnrollmentPdf {
        EnrollmentPdf {
            assets: MemoryAssets::default(),
            generator: Generator::new(),
        }
    }

    /// Load a scanned template page.
    ///
    /// @param {string} variant - "adult" or "minor"
    /// @param {number} page - 1-based page number
    /// @param {Uint8Array} data - JPEG or PNG bytes
    #[wasm_bindgen(js_name = loadTemplate)]
    pub fn load_template(
        &mut self,
        variant: &str,
        page: usize,
        data: &[u8],
    ) -> Result<(), JsValue> {
        let variant = parse_variant(variant)?;
        self.assets.insert_template(variant, page, data.to_vec());
        Ok(())
    }

    /// Load a TTF font.
    ///
    /// @param {string} face - "regular", "bold" or "symbol"
    /// @param {Uint8Array} data - TTF bytes
    #[wasm_bindgen(js_name = loadFont)]
    pub fn load_font(&mut self, face: &str, data: &[u8]) -> Result<(), JsValue> {
        let face = parse_face(face)?;
        self.assets.insert_font(face, data.to_vec());
        Ok(())
    }

    /// Generate the registration document.
    ///
    /// @param {Object} form - registration form, camelCase keys
    /// @param {string | undefined} kinship - "father", "mother", "brother" or "other"
    /// @param {string | undefined} otherKinship - free text when kinship is "other"
    /// @returns {Uint8Array} the PDF bytes
    pub fn generate(
        &self,
        form: JsValue,
        kinship: Option<String>,
        other_kinship: Option<String>,
    ) -> Result<Vec<u8>, JsValue> {
        let form: RegistrationForm = serde_wasm_bindgen::from_value(form)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let kinship = parse_kinship(kinship)?;
        let today = browser_today()?;
        let generated = self
            .generator
            .generate_at(
                &form,
                kinship,
                other_kinship.as_deref().unwrap_or(""),
                &self.assets,
                today,
            )
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(generated.bytes)
    }

    /// Generate the supplementary document.
    ///
    /// @returns {Uint8Array} the PDF bytes
    #[wasm_bindgen(js_name = generateAdditional)]
    pub fn generate_additional(&self) -> Result<Vec<u8>, JsValue> {
        self.generator
            .generate_additional(&self.assets)
            .map(|generated| generated.bytes)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl Default for EnrollmentPdf {
    fn default() -> Self {
        Self::new()
    }
}
