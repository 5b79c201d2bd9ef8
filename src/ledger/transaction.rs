use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Format used for persisted transaction timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A dated movement posted against a virtual category.
///
/// Positive amounts are deposits, negative amounts are withdrawals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
}

impl Transaction {
    pub fn new(amount: f64, description: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            amount,
            description: description.into(),
            timestamp,
        }
    }

    /// Timestamp rendered the way it is persisted.
    pub fn timestamp_label(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Sorts transactions newest first. Equal timestamps keep storage order.
pub fn newest_first<'a, I>(transactions: I) -> Vec<&'a Transaction>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut sorted: Vec<&Transaction> = transactions.into_iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted
}

mod timestamp {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    /// Accepted on load; `%.f` also matches an absent fraction.
    const READ_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    const DATE_FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(raw.trim())
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp `{}`", raw)))
    }

    /// Parses a stored timestamp. A bare date means midnight.
    pub(super) fn parse(raw: &str) -> Option<NaiveDateTime> {
        READ_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn timestamp_persists_in_space_separated_form() {
        let txn = Transaction::new(12.5, "coffee", at(9, 30));
        let json = serde_json::to_value(&txn).unwrap();
        assert_eq!(json["timestamp"], "2024-03-01 09:30:00");
        assert_eq!(txn.timestamp_label(), "2024-03-01 09:30:00");
    }

    #[test]
    fn iso_timestamps_are_accepted_on_load() {
        let raw = r#"{"id":"a","amount":1.0,"description":"","timestamp":"2024-03-01T09:30:00"}"#;
        let txn: Transaction = serde_json::from_str(raw).unwrap();
        assert_eq!(txn.timestamp, at(9, 30));
    }

    #[test]
    fn hand_edited_timestamps_still_load() {
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(timestamp::parse("2024-03-01"), Some(midnight));
        assert_eq!(
            timestamp::parse("2024-03-01 09:30:00.5"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_milli_opt(9, 30, 0, 500)
        );
        assert_eq!(timestamp::parse("2024-03-01T09:30:00"), Some(at(9, 30)));
        assert_eq!(timestamp::parse("yesterday"), None);

        let raw = r#"{"id":"a","amount":1.0,"timestamp":"2024-03-01 09:30:00.250"}"#;
        let txn: Transaction = serde_json::from_str(raw).unwrap();
        assert_eq!(txn.timestamp_label(), "2024-03-01 09:30:00");
    }

    #[test]
    fn missing_description_defaults_to_empty() {
        let raw = r#"{"id":"a","amount":-3.0,"timestamp":"2024-03-01 09:30:00"}"#;
        let txn: Transaction = serde_json::from_str(raw).unwrap();
        assert!(txn.description.is_empty());
    }

    #[test]
    fn newest_first_keeps_storage_order_for_ties() {
        let first = Transaction::new(1.0, "first", at(8, 0));
        let second = Transaction::new(2.0, "second", at(8, 0));
        let later = Transaction::new(3.0, "later", at(10, 0));
        let all = vec![first, second, later];

        let sorted = newest_first(&all);
        let labels: Vec<&str> = sorted.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(labels, vec!["later", "first", "second"]);
    }
}
