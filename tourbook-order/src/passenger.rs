//! Passenger and lead-contact validation.
//!
//! Every rule is evaluated for every field of every record before returning, so
//! the caller can render all errors at once. Errors come out in record order,
//! then in field order (first name, last name, email, phone, country, passport,
//! age), which makes `first_invalid()` deterministic.

use std::sync::LazyLock;

use regex::Regex;
use tourbook_core::ValidationErrors;
use tourbook_shared::{ContactInfo, PassengerRecord, PassengerType};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\s'\-]+$").expect("name pattern"));

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_COUNTRY_CHARS: usize = 2;
pub const MIN_PHONE_DIGITS: usize = 10;
pub const MAX_CHILD_AGE: i64 = 17;

/// Blank records for every traveller except the lead booker.
///
/// Adults are numbered from 1 (the lead is adult 0), children from 0.
pub fn passenger_slots(adult_quantity: u32, child_quantity: u32) -> Vec<PassengerRecord> {
    (1..adult_quantity)
        .map(|i| PassengerRecord::blank(PassengerType::Adult, i))
        .chain((0..child_quantity).map(|i| PassengerRecord::blank(PassengerType::Child, i)))
        .collect()
}

pub struct PassengerValidator;

impl PassengerValidator {
    pub fn validate(records: &[PassengerRecord]) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for record in records {
            Self::check_record(record, &mut errors);
        }
        errors.into_result()
    }

    /// Lead booker, checked with the adult rules under unprefixed keys
    pub fn validate_contact(contact: &ContactInfo) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut check = |field: &str, result: Option<String>| {
            if let Some(message) = result {
                errors.push(field, message);
            }
        };
        check("first_name", check_name(&contact.first_name, "First name"));
        check("last_name", check_name(&contact.last_name, "Last name"));
        check("email", check_email(Some(contact.email.expose())));
        check("phone", check_phone(Some(contact.phone.expose())));
        check("country", check_country(&contact.country));
        check("passport_id", check_passport(contact.passport_id.expose()));
        errors.into_result()
    }

    fn check_record(record: &PassengerRecord, errors: &mut ValidationErrors) {
        let prefix = record.key_prefix();
        let mut check = |field: &str, result: Option<String>| {
            if let Some(message) = result {
                errors.push(format!("{}_{}", prefix, field), message);
            }
        };

        check("first_name", check_name(&record.first_name, "First name"));
        check("last_name", check_name(&record.last_name, "Last name"));
        if record.kind == PassengerType::Adult {
            check("email", check_email(record.email.as_ref().map(|e| e.expose())));
            check("phone", check_phone(record.phone.as_ref().map(|p| p.expose())));
        }
        check("country", check_country(&record.country));
        check("passport_id", check_passport(record.passport_id.expose()));
        if record.kind == PassengerType::Child {
            check("age", check_age(record.age.as_deref()));
        }
    }
}

fn check_name(value: &str, label: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        Some(format!("{} is required", label))
    } else if value.chars().count() < MIN_NAME_CHARS {
        Some(format!("{} must be at least {} characters", label, MIN_NAME_CHARS))
    } else if !NAME_PATTERN.is_match(value) {
        Some(format!(
            "{} may only contain letters, spaces, hyphens and apostrophes",
            label
        ))
    } else {
        None
    }
}

fn check_email(value: Option<&String>) -> Option<String> {
    match value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Some("Email is required".to_string()),
        Some(v) if !EMAIL_PATTERN.is_match(v) => Some("Enter a valid email address".to_string()),
        Some(_) => None,
    }
}

fn check_phone(value: Option<&String>) -> Option<String> {
    match value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Some("Phone number is required".to_string()),
        Some(v) if v.chars().filter(|c| c.is_ascii_digit()).count() < MIN_PHONE_DIGITS => Some(
            format!("Phone number must contain at least {} digits", MIN_PHONE_DIGITS),
        ),
        Some(_) => None,
    }
}

fn check_country(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        Some("Country is required".to_string())
    } else if value.chars().count() < MIN_COUNTRY_CHARS {
        Some(format!("Country must be at least {} characters", MIN_COUNTRY_CHARS))
    } else {
        None
    }
}

fn check_passport(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some("Passport number is required".to_string())
    } else {
        None
    }
}

fn check_age(value: Option<&str>) -> Option<String> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Some("Age is required".to_string());
    };
    match value.parse::<i64>() {
        Err(_) => Some("Age must be a whole number".to_string()),
        Ok(age) if !(0..=MAX_CHILD_AGE).contains(&age) => {
            Some(format!("Child age must be between 0 and {}", MAX_CHILD_AGE))
        }
        Ok(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourbook_shared::Masked;

    fn adult(index: u32) -> PassengerRecord {
        PassengerRecord {
            first_name: "Mary-Jane".to_string(),
            last_name: "O'Neil".to_string(),
            country: "Ireland".to_string(),
            passport_id: Masked::from("P1234567"),
            email: Some(Masked::from("mj@example.com")),
            phone: Some(Masked::from("+353 (1) 555-0100")),
            ..PassengerRecord::blank(PassengerType::Adult, index)
        }
    }

    fn child(index: u32) -> PassengerRecord {
        PassengerRecord {
            first_name: "Liam".to_string(),
            last_name: "O'Neil".to_string(),
            country: "Ireland".to_string(),
            passport_id: Masked::from("C7654321"),
            age: Some("8".to_string()),
            ..PassengerRecord::blank(PassengerType::Child, index)
        }
    }

    #[test]
    fn test_slots_skip_lead_adult() {
        let slots = passenger_slots(2, 1);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].kind, PassengerType::Adult);
        assert_eq!(slots[0].index, 1);
        assert_eq!(slots[1].kind, PassengerType::Child);
        assert_eq!(slots[1].index, 0);
        assert!(slots[1].email.is_none());

        assert!(passenger_slots(1, 0).is_empty());
        assert_eq!(passenger_slots(3, 2).len(), 4);
    }

    #[test]
    fn test_valid_records_pass() {
        assert!(PassengerValidator::validate(&[adult(1), child(0)]).is_ok());
    }

    #[test]
    fn test_child_errors_are_exhaustive() {
        let mut record = child(0);
        record.age = None;
        record.passport_id = Masked::from("   ");

        let errors = PassengerValidator::validate(&[record]).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first_invalid(), Some("child_0_passport_id"));
        assert_eq!(errors.get("child_0_age"), Some("Age is required"));
    }

    #[test]
    fn test_first_invalid_follows_record_then_field_order() {
        let mut first = adult(1);
        first.phone = Some(Masked::from("12345"));
        let mut second = child(0);
        second.first_name = "X".to_string();

        let errors = PassengerValidator::validate(&[first, second]).unwrap_err();
        let keys: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(keys, vec!["adult_1_phone", "child_0_first_name"]);
    }

    #[test]
    fn test_name_rules() {
        assert!(check_name("Jo", "First name").is_none());
        assert!(check_name("José Luís", "First name").is_none());
        assert!(check_name("J", "First name").is_some());
        assert!(check_name("R2-D2", "First name").is_some());
        assert!(check_name("  ", "First name").unwrap().contains("required"));
    }

    #[test]
    fn test_age_rules() {
        assert!(check_age(Some("0")).is_none());
        assert!(check_age(Some("17")).is_none());
        assert!(check_age(Some("18")).is_some());
        assert!(check_age(Some("-1")).is_some());
        assert!(check_age(Some("7.5")).unwrap().contains("whole number"));
    }

    #[test]
    fn test_adult_requires_contact_channels() {
        let mut record = adult(2);
        record.email = None;
        record.phone = Some(Masked::from(""));

        let errors = PassengerValidator::validate(&[record]).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.get("adult_2_email").is_some());
        assert!(errors.get("adult_2_phone").is_some());
    }

    #[test]
    fn test_contact_uses_unprefixed_keys() {
        let contact = ContactInfo {
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            email: Masked::from("not-an-email"),
            phone: Masked::from("0912345678"),
            country: "PT".to_string(),
            passport_id: Masked::from("X99"),
        };
        let errors = PassengerValidator::validate_contact(&contact).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first_invalid(), Some("email"));
    }
}
