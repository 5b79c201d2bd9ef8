use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};

/// Bill face values, highest first.
pub const BILL_LABELS: [&str; 7] = ["500", "200", "100", "50", "20", "10", "5"];
/// Coin face values, highest first.
pub const COIN_LABELS: [&str; 5] = ["2", "1", "0.5", "0.2", "0.1"];

/// Physical cash counts keyed by denomination label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Denominations {
    #[serde(default)]
    pub bills: BTreeMap<String, u64>,
    #[serde(default)]
    pub coins: BTreeMap<String, u64>,
}

impl Default for Denominations {
    fn default() -> Self {
        Self {
            bills: zeroed(&BILL_LABELS),
            coins: zeroed(&COIN_LABELS),
        }
    }
}

/// Which side of the cash drawer a label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenominationGroup {
    Bill,
    Coin,
}

/// One line of a cash count: label, count and the value it contributes.
#[derive(Debug, Clone, PartialEq)]
pub struct DenominationLine {
    pub group: DenominationGroup,
    pub label: String,
    pub count: u64,
    pub subtotal: f64,
}

impl Denominations {
    /// Builds a complete count from caller-supplied values.
    ///
    /// Every fixed label must be present and non-negative; unknown labels are rejected.
    pub fn from_counts(
        bills: &BTreeMap<String, i64>,
        coins: &BTreeMap<String, i64>,
    ) -> Result<Self> {
        Ok(Self {
            bills: checked(bills, &BILL_LABELS, "bill")?,
            coins: checked(coins, &COIN_LABELS, "coin")?,
        })
    }

    /// Total value held: `Σ label × count` over bills and coins.
    pub fn total(&self) -> f64 {
        let bills: f64 = self
            .bills
            .iter()
            .map(|(label, count)| face_value(label) * *count as f64)
            .sum();
        let coins: f64 = self
            .coins
            .iter()
            .map(|(label, count)| face_value(label) * *count as f64)
            .sum();
        bills + coins
    }

    /// Lines for display, bills then coins, each by descending face value.
    pub fn lines(&self) -> Vec<DenominationLine> {
        let mut bills = group_lines(&self.bills, DenominationGroup::Bill);
        bills.extend(group_lines(&self.coins, DenominationGroup::Coin));
        bills
    }

    pub fn count(&self, label: &str) -> Option<u64> {
        self.bills
            .get(label)
            .or_else(|| self.coins.get(label))
            .copied()
    }

    /// Current counts as signed values, ready to be edited and passed back to
    /// [`Denominations::from_counts`].
    pub fn editable_counts(&self) -> (BTreeMap<String, i64>, BTreeMap<String, i64>) {
        let widen = |map: &BTreeMap<String, u64>| {
            map.iter()
                .map(|(label, count)| (label.clone(), i64::try_from(*count).unwrap_or(i64::MAX)))
                .collect()
        };
        (widen(&self.bills), widen(&self.coins))
    }
}

/// Parses a user-entered count. Only plain digit strings are accepted.
pub fn parse_count(label: &str, raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(LedgerError::InvalidCount {
            label: label.to_string(),
            reason: format!("`{}` is not a non-negative integer", raw),
        });
    }
    trimmed.parse::<i64>().map_err(|err| LedgerError::InvalidCount {
        label: label.to_string(),
        reason: err.to_string(),
    })
}

/// Face value of a denomination label. Labels that do not parse count as zero.
pub fn face_value(label: &str) -> f64 {
    match label.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            tracing::warn!(label, "ignoring unparsable denomination label");
            0.0
        }
    }
}

pub fn is_bill_label(label: &str) -> bool {
    BILL_LABELS.contains(&label)
}

pub fn is_coin_label(label: &str) -> bool {
    COIN_LABELS.contains(&label)
}

fn zeroed(labels: &[&str]) -> BTreeMap<String, u64> {
    labels.iter().map(|label| (label.to_string(), 0)).collect()
}

fn checked(
    supplied: &BTreeMap<String, i64>,
    labels: &[&str],
    noun: &str,
) -> Result<BTreeMap<String, u64>> {
    if let Some(unknown) = supplied.keys().find(|key| !labels.contains(&key.as_str())) {
        return Err(LedgerError::InvalidCount {
            label: format!("{} {}", unknown, noun),
            reason: "unknown denomination".into(),
        });
    }
    let mut counts = BTreeMap::new();
    for label in labels {
        let value = supplied
            .get(*label)
            .copied()
            .ok_or_else(|| LedgerError::InvalidCount {
                label: format!("{} {}", label, noun),
                reason: "count is missing".into(),
            })?;
        let count = u64::try_from(value).map_err(|_| LedgerError::InvalidCount {
            label: format!("{} {}", label, noun),
            reason: format!("{} is negative", value),
        })?;
        counts.insert(label.to_string(), count);
    }
    Ok(counts)
}

fn group_lines(map: &BTreeMap<String, u64>, group: DenominationGroup) -> Vec<DenominationLine> {
    let mut lines: Vec<DenominationLine> = map
        .iter()
        .map(|(label, count)| DenominationLine {
            group,
            label: label.clone(),
            count: *count,
            subtotal: face_value(label) * *count as f64,
        })
        .collect();
    lines.sort_by(|a, b| face_value(&b.label).total_cmp(&face_value(&a.label)));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(bills: &[(&str, i64)], coins: &[(&str, i64)]) -> (BTreeMap<String, i64>, BTreeMap<String, i64>) {
        let mut b: BTreeMap<String, i64> = BILL_LABELS.iter().map(|l| (l.to_string(), 0)).collect();
        let mut c: BTreeMap<String, i64> = COIN_LABELS.iter().map(|l| (l.to_string(), 0)).collect();
        for (label, count) in bills {
            b.insert(label.to_string(), *count);
        }
        for (label, count) in coins {
            c.insert(label.to_string(), *count);
        }
        (b, c)
    }

    #[test]
    fn default_counts_are_zero_for_every_label() {
        let denoms = Denominations::default();
        assert_eq!(denoms.bills.len(), BILL_LABELS.len());
        assert_eq!(denoms.coins.len(), COIN_LABELS.len());
        assert_eq!(denoms.total(), 0.0);
    }

    #[test]
    fn total_mixes_bills_and_coins() {
        let (bills, coins) = full(&[("50", 2), ("5", 1)], &[("2", 3), ("0.5", 1)]);
        let denoms = Denominations::from_counts(&bills, &coins).unwrap();
        assert!((denoms.total() - 111.5).abs() < 1e-9);
    }

    #[test]
    fn missing_label_is_rejected() {
        let (mut bills, coins) = full(&[], &[]);
        bills.remove("200");
        let err = Denominations::from_counts(&bills, &coins).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidCount { ref label, .. } if label == "200 bill"));
    }

    #[test]
    fn negative_and_unknown_labels_are_rejected() {
        let (bills, coins) = full(&[("20", -1)], &[]);
        assert!(Denominations::from_counts(&bills, &coins).is_err());

        let (bills, mut coins) = full(&[], &[]);
        coins.insert("0.05".into(), 1);
        assert!(Denominations::from_counts(&bills, &coins).is_err());
    }

    #[test]
    fn lines_are_ordered_by_face_value() {
        let labels: Vec<String> = Denominations::default()
            .lines()
            .into_iter()
            .map(|line| line.label)
            .collect();
        let expected: Vec<String> = BILL_LABELS
            .iter()
            .chain(COIN_LABELS.iter())
            .map(|l| l.to_string())
            .collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn parse_count_accepts_digits_only() {
        assert_eq!(parse_count("10", " 7 ").unwrap(), 7);
        assert!(parse_count("10", "-1").is_err());
        assert!(parse_count("10", "1.5").is_err());
        assert!(parse_count("10", "").is_err());
    }
}
