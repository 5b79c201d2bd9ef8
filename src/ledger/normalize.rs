//! Load-time repair of raw ledger documents.
//!
//! Runs on the untyped JSON before it is deserialized into [`Category`](super::Category),
//! so that documents written by older versions (missing keys, untyped nodes)
//! still load.

use serde_json::{Map, Value};

use super::{
    category::CategoryKind,
    denominations::{BILL_LABELS, COIN_LABELS},
};

/// Fills in missing keys on `node` and every descendant.
///
/// Returns the number of repairs made; a second pass over the same document
/// always returns zero. Non-object values are left alone and rejected later by
/// deserialization.
pub fn normalize(node: &mut Value) -> usize {
    let Some(object) = node.as_object_mut() else {
        return 0;
    };
    let mut repairs = 0;

    if !object.contains_key("balance") {
        object.insert("balance".into(), Value::from(0.0));
        repairs += 1;
    }
    repairs += normalize_type(object);
    if !object.contains_key("transactions") {
        object.insert("transactions".into(), Value::Array(Vec::new()));
        repairs += 1;
    }
    if !object.get("children").map_or(false, Value::is_object) {
        object.insert("children".into(), Value::Object(Map::new()));
        repairs += 1;
    }
    if object.get("type").and_then(Value::as_str) == Some(CategoryKind::Cash.as_str()) {
        repairs += seed_denominations(object);
    }

    if let Some(Value::Object(children)) = object.get_mut("children") {
        for child in children.values_mut() {
            repairs += normalize(child);
        }
    }
    repairs
}

fn normalize_type(object: &mut Map<String, Value>) -> usize {
    let known = match object.get("type") {
        None => false,
        Some(Value::String(raw)) => CategoryKind::ALL.iter().any(|kind| kind.as_str() == raw),
        Some(other) => {
            tracing::warn!(value = %other, "category type is not a string, treating as Virtual");
            false
        }
    };
    if known {
        return 0;
    }
    if let Some(Value::String(raw)) = object.get("type") {
        tracing::warn!(kind = %raw, "unknown category type, treating as Virtual");
    }
    object.insert(
        "type".into(),
        Value::String(CategoryKind::Virtual.as_str().into()),
    );
    1
}

fn seed_denominations(object: &mut Map<String, Value>) -> usize {
    let mut repairs = 0;
    let denominations = object.entry("denominations").or_insert_with(|| {
        repairs += 1;
        Value::Object(Map::new())
    });
    let Some(denominations) = denominations.as_object_mut() else {
        return repairs;
    };
    for (group, labels) in [("bills", &BILL_LABELS[..]), ("coins", &COIN_LABELS[..])] {
        let counts = denominations.entry(group).or_insert_with(|| {
            repairs += 1;
            Value::Object(Map::new())
        });
        let Some(counts) = counts.as_object_mut() else {
            continue;
        };
        for label in labels {
            if !counts.contains_key(*label) {
                counts.insert(label.to_string(), Value::from(0));
                repairs += 1;
            }
        }
    }
    repairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_object_becomes_empty_virtual_node() {
        let mut doc = json!({});
        assert!(normalize(&mut doc) > 0);
        assert_eq!(
            doc,
            json!({ "balance": 0.0, "type": "Virtual", "transactions": [], "children": {} })
        );
    }

    #[test]
    fn cash_nodes_get_every_label() {
        let mut doc = json!({
            "children": {
                "Wallet": { "type": "Cash", "denominations": { "bills": { "50": 2 } } }
            }
        });
        normalize(&mut doc);
        let wallet = &doc["children"]["Wallet"];
        assert_eq!(wallet["denominations"]["bills"]["50"], 2);
        assert_eq!(wallet["denominations"]["bills"]["500"], 0);
        assert_eq!(wallet["denominations"]["coins"]["0.1"], 0);
    }

    #[test]
    fn recurses_past_invalid_children() {
        let mut doc = json!({
            "type": "Summary",
            "children": {
                "Broken": { "children": [] },
                "Deep": { "children": { "Leaf": {} } }
            }
        });
        normalize(&mut doc);
        assert_eq!(doc["children"]["Broken"]["children"], json!({}));
        assert_eq!(doc["children"]["Deep"]["children"]["Leaf"]["type"], "Virtual");
    }

    #[test]
    fn unknown_type_falls_back_to_virtual() {
        let mut doc = json!({ "type": "Savings" });
        normalize(&mut doc);
        assert_eq!(doc["type"], "Virtual");
    }

    #[test]
    fn second_pass_changes_nothing() {
        let mut doc = json!({
            "children": {
                "A": { "type": "Cash" },
                "B": { "type": "Summary", "children": { "C": { "balance": 3.0 } } }
            }
        });
        normalize(&mut doc);
        let once = doc.clone();
        assert_eq!(normalize(&mut doc), 0);
        assert_eq!(doc, once);
    }
}
