//! Registration form data, age classification and field mapping

use crate::layout::{Field, Variant};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Age at which a player registers with the adult document
pub const ADULT_AGE: u32 = 18;

/// Date format used by the form's date inputs
const DATE_FORMAT: &str = "%Y-%m-%d";

/// The registration form as submitted by the site
///
/// Every field is a string, matching the JSON payload of the form
/// inputs. Missing keys deserialize to empty strings and are simply
/// not drawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    // Player
    pub first_name: String,
    pub last_name: String,
    pub first_name_ar: String,
    pub last_name_ar: String,
    pub date_of_birth: String,
    pub city_ar: String,
    pub national_id: String,
    pub email: String,

    // Guardian (minor variant)
    pub guardian_first_name: String,
    pub guardian_last_name: String,
    pub guardian_first_name_ar: String,
    pub guardian_last_name_ar: String,
    pub guardian_date_of_birth: String,
    pub guardian_age: String,
    pub guardian_city_ar: String,
    pub guardian_national_id: String,
    pub guardian_phone: String,

    // Minor player (minor variant)
    pub minor_first_name: String,
    pub minor_last_name: String,
    pub minor_first_name_ar: String,
    pub minor_last_name_ar: String,
    pub minor_date_of_birth: String,
    pub minor_city_ar: String,
    pub birth_certificate_number: String,
}

impl RegistrationForm {
    /// The form value drawn for a field
    ///
    /// Returns `None` for fields whose value does not come from the
    /// form (hardcoded club data, checkboxes).
    pub fn value(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::FirstNameAr => &self.first_name_ar,
            Field::LastNameAr => &self.last_name_ar,
            Field::DateOfBirth => &self.date_of_birth,
            // Place of birth slots are filled from the city inputs
            Field::PlaceOfBirthAr => &self.city_ar,
            Field::NationalId => &self.national_id,
            Field::Email => &self.email,
            Field::GuardianFirstName => &self.guardian_first_name,
            Field::GuardianLastName => &self.guardian_last_name,
            Field::GuardianFirstNameAr => &self.guardian_first_name_ar,
            Field::GuardianLastNameAr => &self.guardian_last_name_ar,
            Field::GuardianDateOfBirth => &self.guardian_date_of_birth,
            Field::GuardianAge => &self.guardian_age,
            Field::GuardianPlaceOfBirthAr => &self.guardian_city_ar,
            Field::GuardianNationalId => &self.guardian_national_id,
            Field::GuardianPhone => &self.guardian_phone,
            Field::MinorFirstName => &self.minor_first_name,
            Field::MinorLastName => &self.minor_last_name,
            Field::MinorFirstNameAr => &self.minor_first_name_ar,
            Field::MinorLastNameAr => &self.minor_last_name_ar,
            Field::MinorDateOfBirth => &self.minor_date_of_birth,
            Field::MinorPlaceOfBirthAr => &self.minor_city_ar,
            Field::BirthCertificateNumber => &self.birth_certificate_number,
            _ => return None,
        };
        Some(value.as_str())
    }
}

/// Guardian kinship selection, mutually exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kinship {
    Father,
    Mother,
    Brother,
    Other,
}

/// Club and league identity printed on every document
#[derive(Debug, Clone, PartialEq)]
pub struct HardcodedValues {
    pub club: String,
    pub club_number: String,
    pub league: String,
    pub league_number: String,
}

impl Default for HardcodedValues {
    fn default() -> Self {
        Self {
            club: "AHFA".to_string(),
            club_number: "1020".to_string(),
            league: "LRDTF".to_string(),
            league_number: "02".to_string(),
        }
    }
}

impl HardcodedValues {
    /// The configured value for a hardcoded field
    pub fn value(&self, field: Field) -> Option<&str> {
        match field {
            Field::Club => Some(&self.club),
            Field::ClubNumber => Some(&self.club_number),
            Field::League => Some(&self.league),
            Field::LeagueNumber => Some(&self.league_number),
            _ => None,
        }
    }
}

/// Whole years between a date of birth and `today`
///
/// Unparseable input counts as age 0, which routes the registration
/// to the minor document rather than silently producing an adult one.
pub fn age_on(date_of_birth: &str, today: NaiveDate) -> u32 {
    let dob = match NaiveDate::parse_from_str(date_of_birth.trim(), DATE_FORMAT) {
        Ok(d) => d,
        Err(_) => return 0,
    };

    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }

    age.max(0) as u32
}

/// Age and document variant for a date of birth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub age: u32,
    pub variant: Variant,
}

/// Classify a date of birth against a fixed date
///
/// A player whose 18th birthday is `today` (or past) is an adult.
pub fn classify_at(date_of_birth: &str, today: NaiveDate) -> Classification {
    let age = age_on(date_of_birth, today);
    let variant = if age >= ADULT_AGE {
        Variant::Adult
    } else {
        Variant::Minor
    };
    Classification { age, variant }
}

/// Classify a date of birth against the local clock
pub fn classify(date_of_birth: &str) -> Classification {
    classify_at(date_of_birth, chrono::Local::now().date_naive())
}

/// Pick the document variant for a date of birth
pub fn variant_for(date_of_birth: &str, today: NaiveDate) -> Variant {
    classify_at(date_of_birth, today).variant
}

/// Apply a date-of-birth edit to the form
///
/// When the new date makes the player a minor, the player identity
/// fields are copied into the minor section so the minor document can
/// be generated without retyping them. When it makes the player an
/// adult, the copies are cleared so stale minor data never leaks into
/// a later minor registration.
pub fn apply_date_of_birth_change(
    mut form: RegistrationForm,
    new_date_of_birth: &str,
    today: NaiveDate,
) -> RegistrationForm {
    form.date_of_birth = new_date_of_birth.to_string();

    match variant_for(new_date_of_birth, today) {
        Variant::Minor => {
            form.minor_first_name = form.first_name.clone();
            form.minor_last_name = form.last_name.clone();
            form.minor_first_name_ar = form.first_name_ar.clone();
            form.minor_last_name_ar = form.last_name_ar.clone();
            form.minor_date_of_birth = new_date_of_birth.to_string();
            form.minor_city_ar = form.city_ar.clone();
        }
        Variant::Adult => {
            form.minor_first_name.clear();
            form.minor_last_name.clear();
            form.minor_first_name_ar.clear();
            form.minor_last_name_ar.clear();
            form.minor_date_of_birth.clear();
            form.minor_city_ar.clear();
        }
    }

    form
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_age_on_whole_years() {
        assert_eq!(age_on("2000-06-01", today()), 24);
        assert_eq!(age_on("2000-06-02", today()), 23); // birthday tomorrow
        assert_eq!(age_on("2000-05-31", today()), 24); // birthday yesterday
    }

    #[test]
    fn test_age_on_unparseable() {
        assert_eq!(age_on("", today()), 0);
        assert_eq!(age_on("01/06/2000", today()), 0);
        assert_eq!(age_on("not a date", today()), 0);
    }

    #[test]
    fn test_age_on_future_date() {
        assert_eq!(age_on("2030-01-01", today()), 0);
    }

    #[test]
    fn test_variant_threshold() {
        // 18th birthday today: adult
        assert_eq!(variant_for("2006-06-01", today()), Variant::Adult);
        // 18th birthday tomorrow: still a minor
        assert_eq!(variant_for("2006-06-02", today()), Variant::Minor);
    }

    #[test]
    fn test_variant_unparseable_is_minor() {
        assert_eq!(variant_for("garbage", today()), Variant::Minor);
    }

    #[test]
    fn test_classify_day_before_birthday() {
        let eve = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(
            classify_at("2010-06-15", eve),
            Classification {
                age: 13,
                variant: Variant::Minor
            }
        );
        assert_eq!(
            classify_at("2010-06-15", day),
            Classification {
                age: 14,
                variant: Variant::Minor
            }
        );
    }

    #[test]
    fn test_form_deserializes_camel_case() {
        let form: RegistrationForm = serde_json::from_str(
            r#"{"firstNameAr": "محمد", "guardianCityAr": "فاس", "nationalId": "ab12"}"#,
        )
        .unwrap();

        assert_eq!(form.first_name_ar, "محمد");
        assert_eq!(form.guardian_city_ar, "فاس");
        assert_eq!(form.national_id, "ab12");
        // Missing keys default to empty
        assert_eq!(form.email, "");
    }

    #[test]
    fn test_place_of_birth_reads_city() {
        let form = RegistrationForm {
            city_ar: "فاس".to_string(),
            minor_city_ar: "مكناس".to_string(),
            ..Default::default()
        };

        assert_eq!(form.value(Field::PlaceOfBirthAr), Some("فاس"));
        assert_eq!(form.value(Field::MinorPlaceOfBirthAr), Some("مكناس"));
    }

    #[test]
    fn test_value_none_for_hardcoded_and_checkboxes() {
        let form = RegistrationForm::default();

        assert_eq!(form.value(Field::Club), None);
        assert_eq!(form.value(Field::FatherCheckbox), None);
        assert_eq!(form.value(Field::SignatureCheckbox), None);
    }

    #[test]
    fn test_hardcoded_defaults() {
        let values = HardcodedValues::default();

        assert_eq!(values.value(Field::Club), Some("AHFA"));
        assert_eq!(values.value(Field::ClubNumber), Some("1020"));
        assert_eq!(values.value(Field::League), Some("LRDTF"));
        assert_eq!(values.value(Field::LeagueNumber), Some("02"));
        assert_eq!(values.value(Field::FirstName), None);
    }

    #[test]
    fn test_dob_change_to_minor_copies_identity() {
        let form = RegistrationForm {
            first_name: "Adam".to_string(),
            last_name: "Alami".to_string(),
            first_name_ar: "آدم".to_string(),
            last_name_ar: "العلمي".to_string(),
            city_ar: "فاس".to_string(),
            ..Default::default()
        };

        let updated = apply_date_of_birth_change(form, "2012-03-04", today());

        assert_eq!(updated.date_of_birth, "2012-03-04");
        assert_eq!(updated.minor_first_name, "Adam");
        assert_eq!(updated.minor_last_name, "Alami");
        assert_eq!(updated.minor_first_name_ar, "آدم");
        assert_eq!(updated.minor_date_of_birth, "2012-03-04");
        assert_eq!(updated.minor_city_ar, "فاس");
    }

    #[test]
    fn test_dob_change_to_adult_clears_minor_section() {
        let form = RegistrationForm {
            first_name: "Adam".to_string(),
            minor_first_name: "Adam".to_string(),
            minor_date_of_birth: "2012-03-04".to_string(),
            minor_city_ar: "فاس".to_string(),
            ..Default::default()
        };

        let updated = apply_date_of_birth_change(form, "1990-01-01", today());

        assert_eq!(updated.date_of_birth, "1990-01-01");
        assert_eq!(updated.minor_first_name, "");
        assert_eq!(updated.minor_date_of_birth, "");
        assert_eq!(updated.minor_city_ar, "");
        // Player identity is untouched
        assert_eq!(updated.first_name, "Adam");
    }

    #[test]
    fn test_kinship_serde() {
        let k: Kinship = serde_json::from_str("\"father\"").unwrap();
        assert_eq!(k, Kinship::Father);
        assert_eq!(serde_json::to_string(&Kinship::Other).unwrap(), "\"other\"");
    }
}
