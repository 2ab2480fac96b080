use serde::{Deserialize, Serialize};

use crate::pii::Masked;

/// Lead booker (`bookerInfo`). Also the first adult passenger.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContactInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
    pub country: String,
    pub passport_id: Masked<String>,
}

impl ContactInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PassengerType {
    Adult,
    Child,
}

impl PassengerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassengerType::Adult => "adult",
            PassengerType::Child => "child",
        }
    }
}

/// An additional traveller beyond the lead booker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassengerRecord {
    #[serde(rename = "type")]
    pub kind: PassengerType,
    pub index: u32,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub passport_id: Masked<String>,
    /// Adults only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Masked<String>>,
    /// Adults only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Masked<String>>,
    /// Children only, as entered in the form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
}

impl PassengerRecord {
    /// Empty record for a passenger slot
    pub fn blank(kind: PassengerType, index: u32) -> Self {
        let adult = kind == PassengerType::Adult;
        Self {
            kind,
            index,
            first_name: String::new(),
            last_name: String::new(),
            country: String::new(),
            passport_id: Masked::default(),
            email: adult.then(Masked::default),
            phone: adult.then(Masked::default),
            age: None,
        }
    }

    /// Prefix used for this record's field keys, e.g. `child_0`
    pub fn key_prefix(&self) -> String {
        format!("{}_{}", self.kind.as_str(), self.index)
    }
}
