//! End-to-end generation tests over in-memory assets

use chrono::NaiveDate;
use enrollment::{
    Face, Field, GenerateError, Generator, Kinship, MemoryAssets, RegistrationForm, Variant,
};
use lopdf::{Document, Object};
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::{Arc, Mutex};

/// TrueType file with just the head, hhea and maxp tables: enough for
/// parsing and metrics defaults, with no cmap every glyph is id 0.
fn minimal_ttf() -> Vec<u8> {
    let mut head = Vec::new();
    head.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // version
    head.extend_from_slice(&0u32.to_be_bytes()); // fontRevision
    head.extend_from_slice(&0u32.to_be_bytes()); // checkSumAdjustment
    head.extend_from_slice(&0x5F0F_3CF5u32.to_be_bytes()); // magicNumber
    head.extend_from_slice(&0u16.to_be_bytes()); // flags
    head.extend_from_slice(&1000u16.to_be_bytes()); // unitsPerEm
    head.extend_from_slice(&[0u8; 16]); // created + modified
    head.extend_from_slice(&0i16.to_be_bytes()); // xMin
    head.extend_from_slice(&0i16.to_be_bytes()); // yMin
    head.extend_from_slice(&1000i16.to_be_bytes()); // xMax
    head.extend_from_slice(&1000i16.to_be_bytes()); // yMax
    head.extend_from_slice(&0u16.to_be_bytes()); // macStyle
    head.extend_from_slice(&8u16.to_be_bytes()); // lowestRecPPEM
    head.extend_from_slice(&0i16.to_be_bytes()); // fontDirectionHint
    head.extend_from_slice(&0i16.to_be_bytes()); // indexToLocFormat
    head.extend_from_slice(&0i16.to_be_bytes()); // glyphDataFormat

    let mut hhea = Vec::new();
    hhea.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // version
    hhea.extend_from_slice(&800i16.to_be_bytes()); // ascender
    hhea.extend_from_slice(&(-200i16).to_be_bytes()); // descender
    hhea.extend_from_slice(&0i16.to_be_bytes()); // lineGap
    hhea.extend_from_slice(&1000u16.to_be_bytes()); // advanceWidthMax
    hhea.extend_from_slice(&[0u8; 20]); // bearings, caret, reserved
    hhea.extend_from_slice(&0i16.to_be_bytes()); // metricDataFormat
    hhea.extend_from_slice(&1u16.to_be_bytes()); // numberOfHMetrics

    let mut maxp = Vec::new();
    maxp.extend_from_slice(&0x0000_5000u32.to_be_bytes()); // version 0.5
    maxp.extend_from_slice(&1u16.to_be_bytes()); // numGlyphs

    let tables: [(&[u8; 4], &Vec<u8>); 3] = [(b"head", &head), (b"hhea", &hhea), (b"maxp", &maxp)];

    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // sfnt version
    out.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&[0u8; 6]); // searchRange, entrySelector, rangeShift

    let mut offset = 12 + tables.len() * 16;
    for (tag, data) in &tables {
        out.extend_from_slice(*tag);
        out.extend_from_slice(&0u32.to_be_bytes()); // checksum
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += data.len();
    }
    for (_, data) in &tables {
        out.extend_from_slice(data);
    }

    out
}

/// JPEG with only the header fields the embedder reads
fn fake_jpeg(width: u16, height: u16) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x11, 0x08];
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&width.to_be_bytes());
    data.push(3);
    data.extend_from_slice(&[0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01]);
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

fn assets_for(variant: Variant) -> MemoryAssets {
    let mut assets = MemoryAssets::new();
    assets.insert_template(variant, 1, fake_jpeg(1240, 1754));
    assets.insert_template(variant, 2, fake_jpeg(1240, 1753));
    assets.insert_font(Face::Regular, minimal_ttf());
    assets.insert_font(Face::Bold, minimal_ttf());
    assets.insert_font(Face::Symbol, minimal_ttf());
    assets
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn adult_form() -> RegistrationForm {
    RegistrationForm {
        first_name: "Adam".to_string(),
        last_name: "Alami".to_string(),
        first_name_ar: "آدم".to_string(),
        last_name_ar: "العلمي".to_string(),
        date_of_birth: "1990-01-15".to_string(),
        city_ar: "فاس".to_string(),
        national_id: "cd45678".to_string(),
        email: "adam@example.com".to_string(),
        ..Default::default()
    }
}

fn minor_form() -> RegistrationForm {
    RegistrationForm {
        date_of_birth: "2012-03-04".to_string(),
        guardian_first_name: "Karim".to_string(),
        guardian_last_name: "Alami".to_string(),
        guardian_first_name_ar: "كريم".to_string(),
        guardian_last_name_ar: "العلمي".to_string(),
        guardian_date_of_birth: "1980-07-01".to_string(),
        guardian_age: "43".to_string(),
        guardian_city_ar: "فاس".to_string(),
        guardian_national_id: "ab1234".to_string(),
        guardian_phone: "0600000000".to_string(),
        minor_first_name: "Yassine".to_string(),
        minor_last_name: "Alami".to_string(),
        minor_first_name_ar: "ياسين".to_string(),
        minor_last_name_ar: "العلمي".to_string(),
        minor_date_of_birth: "2012-03-04".to_string(),
        minor_city_ar: "مكناس".to_string(),
        birth_certificate_number: "556/2012".to_string(),
        ..Default::default()
    }
}

fn count_type0_fonts(bytes: &[u8]) -> usize {
    let parsed = Document::load_mem(bytes).expect("parse output");
    parsed
        .objects
        .values()
        .filter(|obj| match obj {
            Object::Dictionary(dict) => {
                matches!(dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Type0")
            }
            _ => false,
        })
        .count()
}

#[test]
fn adult_on_eighteenth_birthday_uses_adult_templates() {
    // Only adult templates are loaded: picking the minor variant
    // would fail on asset lookup.
    let assets = assets_for(Variant::Adult);
    let generator = Generator::new();

    let form = RegistrationForm {
        date_of_birth: "2006-06-01".to_string(),
        ..adult_form()
    };

    let doc = generator
        .generate_at(&form, None, "", &assets, today())
        .expect("adult generation");

    assert!(doc.bytes.starts_with(b"%PDF"));
    assert!(doc.warnings.is_empty());
}

#[test]
fn day_before_eighteenth_birthday_uses_minor_templates() {
    let assets = assets_for(Variant::Minor);
    let generator = Generator::new();

    let form = RegistrationForm {
        date_of_birth: "2006-06-02".to_string(),
        ..minor_form()
    };

    generator
        .generate_at(&form, Some(Kinship::Father), "", &assets, today())
        .expect("minor generation");
}

#[test]
fn unparseable_date_of_birth_falls_back_to_minor() {
    let assets = assets_for(Variant::Minor);
    let generator = Generator::new();

    let form = RegistrationForm {
        date_of_birth: "not a date".to_string(),
        ..minor_form()
    };

    generator
        .generate_at(&form, None, "", &assets, today())
        .expect("minor generation");
}

#[test]
fn output_has_two_pages_with_background_scans() {
    let assets = assets_for(Variant::Adult);
    let generator = Generator::new();

    let doc = generator
        .generate_at(&adult_form(), None, "", &assets, today())
        .expect("generation");

    let parsed = Document::load_mem(&doc.bytes).expect("parse output");
    assert_eq!(parsed.get_pages().len(), 2);

    // The page 1 scan is embedded untouched
    let scans: Vec<&[u8]> = parsed
        .objects
        .values()
        .filter_map(|obj| match obj {
            Object::Stream(stream)
                if matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Image") =>
            {
                Some(stream.content.as_slice())
            }
            _ => None,
        })
        .collect();
    assert!(scans.contains(&fake_jpeg(1240, 1754).as_slice()));
}

#[test]
fn guardian_age_without_layout_entry_is_a_warning_not_an_error() {
    let assets = assets_for(Variant::Minor);
    let generator = Generator::new();

    let doc = generator
        .generate_at(&minor_form(), None, "", &assets, today())
        .expect("generation succeeds despite the gap");

    assert!(doc
        .warnings
        .iter()
        .any(|w| w.field == Field::GuardianAge));
}

fn page1_content(bytes: &[u8]) -> Vec<u8> {
    let parsed = Document::load_mem(bytes).expect("parse output");
    let page_id = parsed.get_pages()[&1];
    parsed.get_page_content(page_id).expect("page content")
}

#[test]
fn minor_latin_names_do_not_appear_on_the_document() {
    let assets = assets_for(Variant::Minor);
    let generator = Generator::new();

    // Only the Arabic minor name slots are drawn, so renaming the
    // minor in Latin script leaves the pages untouched.
    let renamed = RegistrationForm {
        minor_first_name: "Abderrahmane".to_string(),
        minor_last_name: "El Yassine Alami".to_string(),
        ..minor_form()
    };

    let base = generator
        .generate_at(&minor_form(), None, "", &assets, today())
        .expect("generation");
    let other = generator
        .generate_at(&renamed, None, "", &assets, today())
        .expect("generation");

    assert_eq!(page1_content(&base.bytes), page1_content(&other.bytes));
}

#[test]
fn ticked_kinship_uses_the_symbol_face() {
    let assets = assets_for(Variant::Minor);
    let generator = Generator::new();

    let without = generator
        .generate_at(&minor_form(), None, "", &assets, today())
        .expect("generation");
    let with_father = generator
        .generate_at(&minor_form(), Some(Kinship::Father), "", &assets, today())
        .expect("generation");
    let with_father_and_text = generator
        .generate_at(&minor_form(), Some(Kinship::Father), "عم", &assets, today())
        .expect("generation");

    // The tick is the only use of the symbol face, so selecting a
    // kinship embeds exactly one more font.
    assert_eq!(
        count_type0_fonts(&with_father.bytes),
        count_type0_fonts(&without.bytes) + 1
    );

    // A selected checkbox ignores the free-text field entirely
    assert_eq!(
        page1_content(&with_father.bytes),
        page1_content(&with_father_and_text.bytes)
    );
}

#[test]
fn other_kinship_writes_text_instead_of_a_tick() {
    let assets = assets_for(Variant::Minor);
    let generator = Generator::new();

    let none = generator
        .generate_at(&minor_form(), None, "", &assets, today())
        .expect("generation");
    let other = generator
        .generate_at(&minor_form(), Some(Kinship::Other), "عم", &assets, today())
        .expect("generation");

    // Free text goes through the main faces: the symbol face stays
    // unused and no extra font is embedded.
    assert_eq!(count_type0_fonts(&other.bytes), count_type0_fonts(&none.bytes));
    assert_ne!(page1_content(&other.bytes), page1_content(&none.bytes));
}

#[test]
fn missing_font_asset_fails_cleanly() {
    let mut assets = MemoryAssets::new();
    assets.insert_template(Variant::Adult, 1, fake_jpeg(10, 10));
    assets.insert_template(Variant::Adult, 2, fake_jpeg(10, 10));
    let generator = Generator::new();

    let result = generator.generate_at(&adult_form(), None, "", &assets, today());
    assert!(matches!(result, Err(GenerateError::Asset(_))));
}

#[test]
fn generator_recovers_after_a_failed_generation() {
    let generator = Generator::new();

    let empty = MemoryAssets::new();
    assert!(generator
        .generate_at(&adult_form(), None, "", &empty, today())
        .is_err());

    // The in-flight flag was released on the error path
    let assets = assets_for(Variant::Adult);
    generator
        .generate_at(&adult_form(), None, "", &assets, today())
        .expect("second generation");
}

#[test]
fn additional_document_is_a_single_page() {
    let assets = assets_for(Variant::Adult);
    let generator = Generator::new();

    let doc = generator
        .generate_additional(&assets)
        .expect("additional document");

    let parsed = Document::load_mem(&doc.bytes).expect("parse output");
    assert_eq!(parsed.get_pages().len(), 1);
}

/// Asset source that parks the calling thread inside the first font
/// lookup until the test releases it.
struct BlockingAssets {
    inner: MemoryAssets,
    entered: SyncSender<()>,
    release: Mutex<Receiver<()>>,
}

impl enrollment::AssetSource for BlockingAssets {
    fn template(&self, variant: Variant, page: usize) -> Result<Vec<u8>, enrollment::AssetError> {
        self.inner.template(variant, page)
    }

    fn font(&self, face: Face) -> Result<Vec<u8>, enrollment::AssetError> {
        let _ = self.entered.send(());
        let _ = self.release.lock().unwrap().recv();
        self.inner.font(face)
    }
}

#[test]
fn concurrent_generation_is_rejected_as_busy() {
    let (entered_tx, entered_rx) = std::sync::mpsc::sync_channel(8);
    let (release_tx, release_rx) = std::sync::mpsc::channel();

    let generator = Arc::new(Generator::new());
    let blocking = BlockingAssets {
        inner: assets_for(Variant::Adult),
        entered: entered_tx,
        release: Mutex::new(release_rx),
    };

    let background = {
        let generator = Arc::clone(&generator);
        std::thread::spawn(move || {
            generator.generate_at(&adult_form(), None, "", &blocking, today())
        })
    };

    // Wait until the background generation is inside asset loading
    entered_rx.recv().expect("background generation started");

    let assets = assets_for(Variant::Adult);
    let result = generator.generate_at(&adult_form(), None, "", &assets, today());
    assert!(matches!(result, Err(GenerateError::Busy)));

    // Let the background generation finish; every font lookup blocks
    for _ in 0..3 {
        let _ = release_tx.send(());
    }
    background
        .join()
        .expect("join background thread")
        .expect("background generation succeeds");
}
