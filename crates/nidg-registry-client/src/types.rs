//! Request and result types for demographic verification.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use nidg_core::{EnglishName, NidNumber};

/// A demographic verification request.
///
/// Immutable once constructed; field formats are validated upstream (the
/// newtypes cannot hold invalid values). The ID number's digit count
/// selects the identification channel on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRequest {
    /// National ID number (10 or 17 digits).
    pub nid: NidNumber,
    /// Subject date of birth.
    pub date_of_birth: NaiveDate,
    /// Subject name in Latin script.
    pub name_en: EnglishName,
}

/// Per-field comparison flags reported by the registry.
///
/// When the registry omits its field verification data, both flags
/// default to `false`; a report always carries them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMatch {
    /// Whether the supplied English name matched the registry record.
    #[serde(rename = "nameEn")]
    pub name_en: bool,
    /// Whether the supplied date of birth matched the registry record.
    #[serde(rename = "dateOfBirth")]
    pub date_of_birth: bool,
}

/// Normalized outcome of one verification call.
///
/// Produced exactly once per request. A conditional mismatch (record
/// found, fields differ) is represented here as `verified == false` with
/// an advisory message, not as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Whether the registry confirmed the supplied fields match its
    /// record.
    pub verified: bool,
    /// Per-field match flags.
    pub field_match: FieldMatch,
    /// Person details as returned by the registry. Contains an inlined
    /// `photo` data URI when the registry supplied a photo reference
    /// that could be fetched; otherwise the original reference survives
    /// untouched.
    pub person_details: serde_json::Map<String, serde_json::Value>,
    /// Present when the record was found but the supplied fields did not
    /// match it.
    pub advisory_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use nidg_core::IdChannel;

    fn request(nid: &str) -> VerificationRequest {
        VerificationRequest {
            nid: NidNumber::new(nid).expect("valid nid"),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).expect("valid date"),
            name_en: EnglishName::new("Jane Doe").expect("valid name"),
        }
    }

    #[test]
    fn request_carries_channel() {
        assert_eq!(request("0123456789").nid.channel(), IdChannel::Nid10);
        assert_eq!(
            request("12345678901234567").nid.channel(),
            IdChannel::Nid17
        );
    }

    #[test]
    fn field_match_defaults_to_false() {
        let flags = FieldMatch::default();
        assert!(!flags.name_en);
        assert!(!flags.date_of_birth);
    }

    #[test]
    fn field_match_uses_wire_field_names() {
        let flags = FieldMatch {
            name_en: true,
            date_of_birth: false,
        };
        let json = serde_json::to_value(flags).expect("serialize");
        assert_eq!(json["nameEn"], true);
        assert_eq!(json["dateOfBirth"], false);
    }

    #[test]
    fn report_serde_round_trip() {
        let mut details = serde_json::Map::new();
        details.insert("name".into(), serde_json::json!("Jane Doe"));

        let report = VerificationReport {
            verified: false,
            field_match: FieldMatch {
                name_en: false,
                date_of_birth: true,
            },
            person_details: details,
            advisory_message: Some("record found, fields differ".into()),
        };
        let json = serde_json::to_string(&report).expect("serialize");
        let back: VerificationReport = serde_json::from_str(&json).expect("deserialize");
        assert!(!back.verified);
        assert!(back.field_match.date_of_birth);
        assert_eq!(back.person_details["name"], "Jane Doe");
        assert!(back.advisory_message.is_some());
    }
}
