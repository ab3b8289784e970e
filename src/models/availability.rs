use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single availability entry for an artist, as listed by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: i64,
    pub artist_id: i64,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl AvailabilitySlot {
    pub fn display_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Payload for submitting a new availability entry.
#[derive(Debug, Clone, Serialize)]
pub struct NewAvailability {
    pub artist_id: i64,
    pub date: NaiveDate,
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_availability_listing() {
        let json = r#"[
            {"id": 1, "artist_id": 7, "date": "2026-09-14", "note": "evening only"},
            {"id": 2, "artist_id": 7, "date": "2026-09-15", "note": null}
        ]"#;
        let slots: Vec<AvailabilitySlot> =
            serde_json::from_str(json).expect("Failed to parse availability list");
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].display_date(), "2026-09-14");
        assert!(slots[1].note.is_none());
    }

    #[test]
    fn test_serialize_submission() {
        let payload = NewAvailability {
            artist_id: 7,
            date: NaiveDate::from_ymd_opt(2026, 10, 2).unwrap(),
            note: Some("matinee".to_string()),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["artist_id"], 7);
        assert_eq!(json["date"], "2026-10-02");
    }
}
