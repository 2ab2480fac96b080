use std::collections::{BTreeMap, HashSet};

use tourbook_core::supplier::{ExtraInfoData, ExtraInfoEntry, ExtraInfoField};

/// Booking field every order carries, filled with the configured default when
/// the user gave none
pub const PICKUP_LOCATION_KEY: &str = "pickup_location";

/// Package field definitions in the order the supplier listed them
pub fn package_fields(data: &ExtraInfoData) -> Vec<ExtraInfoField> {
    data.items
        .iter()
        .flat_map(|item| item.booking_extra_info.iter().cloned())
        .collect()
}

/// Merge the user's answers with the package's field definitions.
///
/// Package fields come first in definition order, then any user field the
/// package does not define. Required fields the user skipped are sent empty so
/// the supplier reports them (code 1401) instead of silently dropping them.
pub fn format_extra_info(
    user_fields: &BTreeMap<String, String>,
    package_fields: &[ExtraInfoField],
    default_pickup: &str,
) -> Vec<ExtraInfoEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for field in package_fields {
        if !seen.insert(field.key.as_str()) {
            continue;
        }
        let answer = user_fields
            .get(&field.key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty());
        let content = match answer {
            Some(value) => value.to_string(),
            None if field.key == PICKUP_LOCATION_KEY => default_pickup.to_string(),
            None if field.required => String::new(),
            None => continue,
        };
        entries.push(ExtraInfoEntry {
            key: field.key.clone(),
            content,
        });
    }

    for (key, value) in user_fields {
        if seen.contains(key.as_str()) {
            continue;
        }
        let value = value.trim();
        if value.is_empty() && key != PICKUP_LOCATION_KEY {
            continue;
        }
        entries.push(ExtraInfoEntry {
            key: key.clone(),
            content: value.to_string(),
        });
    }

    match entries.iter_mut().find(|e| e.key == PICKUP_LOCATION_KEY) {
        Some(entry) if entry.content.is_empty() => entry.content = default_pickup.to_string(),
        Some(_) => {}
        None => entries.push(ExtraInfoEntry {
            key: PICKUP_LOCATION_KEY.to_string(),
            content: default_pickup.to_string(),
        }),
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourbook_core::supplier::ExtraInfoItem;

    fn field(key: &str, required: bool) -> ExtraInfoField {
        ExtraInfoField {
            key: key.to_string(),
            name: key.to_string(),
            input_type: "text".to_string(),
            options: None,
            required,
        }
    }

    fn user(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_pickup_default_when_nothing_given() {
        let entries = format_extra_info(&BTreeMap::new(), &[], "MEETING_POINT");
        assert_eq!(
            entries,
            vec![ExtraInfoEntry {
                key: PICKUP_LOCATION_KEY.to_string(),
                content: "MEETING_POINT".to_string(),
            }]
        );
    }

    #[test]
    fn test_user_pickup_wins() {
        let fields = [field("hotel_name", true), field(PICKUP_LOCATION_KEY, true)];
        let entries = format_extra_info(
            &user(&[("hotel_name", " Grand "), (PICKUP_LOCATION_KEY, "HOTEL_LOBBY")]),
            &fields,
            "MEETING_POINT",
        );
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["hotel_name", PICKUP_LOCATION_KEY]);
        assert_eq!(entries[0].content, "Grand");
        assert_eq!(entries[1].content, "HOTEL_LOBBY");
    }

    #[test]
    fn test_missing_required_sent_empty_optional_skipped() {
        let fields = [field("flight_no", true), field("diet", false)];
        let entries = format_extra_info(&BTreeMap::new(), &fields, "MEETING_POINT");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "flight_no");
        assert!(entries[0].content.is_empty());
        assert_eq!(entries[1].key, PICKUP_LOCATION_KEY);
    }

    #[test]
    fn test_undefined_user_fields_are_appended_once() {
        let fields = [field("hotel_name", false), field("hotel_name", true)];
        let entries = format_extra_info(
            &user(&[("hotel_name", "Inn"), ("note", "vegan")]),
            &fields,
            "MEETING_POINT",
        );
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["hotel_name", "note", PICKUP_LOCATION_KEY]);
    }

    #[test]
    fn test_package_fields_flatten_items() {
        let data = ExtraInfoData {
            items: vec![
                ExtraInfoItem {
                    booking_extra_info: vec![field("a", true)],
                },
                ExtraInfoItem {
                    booking_extra_info: vec![field("b", false)],
                },
            ],
        };
        let keys: Vec<_> = package_fields(&data).into_iter().map(|f| f.key).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
