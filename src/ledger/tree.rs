use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{LedgerError, Result};

use super::{
    category::{Category, CategoryKind, Holding},
    denominations::{DenominationLine, Denominations},
    normalize::normalize,
    transaction::{newest_first, Transaction},
};

/// Separator between category names in a path.
pub const PATH_DELIMITER: char = '.';

/// Deepest level a category may sit at below the root.
///
/// A node at depth `d` is written `2d + 3` JSON containers deep (node, children
/// map, then transactions or denomination maps), which must stay under the
/// 128-level nesting limit `serde_json` applies when reading the file back.
pub const MAX_DEPTH: usize = 60;

/// The category tree. Owns the unnamed root; every node is addressed by the
/// dot-joined names leading to it, `""` being the root itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct LedgerTree {
    root: Category,
}

/// One row of the depth-first tree listing.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineRow {
    pub path: String,
    pub name: String,
    pub depth: usize,
    pub kind: CategoryKind,
    pub balance: f64,
}

/// A direct child of a node together with its computed balance.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildBalance {
    pub name: String,
    pub kind: CategoryKind,
    pub balance: f64,
}

impl LedgerTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_root(root: Category) -> Self {
        Self { root }
    }

    /// Normalizes a raw document and converts it into a tree.
    ///
    /// Fails with `CorruptDocument` when the root is not an object or when the
    /// repaired document still does not have the ledger shape.
    pub fn from_document(mut document: Value) -> Result<Self> {
        if !document.is_object() {
            return Err(LedgerError::CorruptDocument(
                "JSON root must be an object".into(),
            ));
        }
        let repairs = normalize(&mut document);
        if repairs > 0 {
            tracing::info!(repairs, "normalized ledger document");
        }
        let root: Category = serde_json::from_value(document)
            .map_err(|err| LedgerError::CorruptDocument(err.to_string()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Category {
        &self.root
    }

    pub fn into_root(self) -> Category {
        self.root
    }

    pub fn to_document(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.root)?)
    }

    /// Looks up the node at `path`.
    pub fn resolve(&self, path: &str) -> Result<&Category> {
        let mut current = &self.root;
        for segment in segments(path) {
            current = current
                .children
                .get(segment)
                .ok_or_else(|| LedgerError::not_found(segment, path))?;
        }
        Ok(current)
    }

    pub fn resolve_mut(&mut self, path: &str) -> Result<&mut Category> {
        let mut current = &mut self.root;
        for segment in segments(path) {
            current = current
                .children
                .get_mut(segment)
                .ok_or_else(|| LedgerError::not_found(segment, path))?;
        }
        Ok(current)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.resolve(path).is_ok()
    }

    /// Balance of the node at `path`, recomputed from leaf data.
    ///
    /// Cash nodes in the subtree get their stored balance overwritten with the
    /// denomination total. Use [`LedgerTree::balance`] for a read that leaves
    /// the tree untouched.
    pub fn compute_balance(&mut self, path: &str) -> Result<f64> {
        let balance = self.resolve_mut(path)?.refresh_balance();
        tracing::debug!(path, balance, "computed balance");
        Ok(balance)
    }

    /// Balance of the node at `path` without writing anything back.
    pub fn balance(&self, path: &str) -> Result<f64> {
        Ok(self.resolve(path)?.balance())
    }

    pub fn total_balance(&self) -> f64 {
        self.root.balance()
    }

    /// Creates an empty category named `name` under `parent_path`.
    pub fn add_category(
        &mut self,
        parent_path: &str,
        name: &str,
        kind: CategoryKind,
    ) -> Result<&Category> {
        let name = validate_name(name)?;
        let depth = segments(parent_path).count() + 1;
        let parent = self.resolve_mut(parent_path)?;
        if depth > MAX_DEPTH {
            return Err(LedgerError::TooDeep {
                name: name.to_string(),
                parent: display_path(parent_path),
                max: MAX_DEPTH,
            });
        }
        if parent.children.contains_key(name) {
            return Err(LedgerError::DuplicateName {
                name: name.to_string(),
                parent: display_path(parent_path),
            });
        }
        tracing::info!(parent = parent_path, name, %kind, "adding category");
        Ok(parent
            .children
            .entry(name.to_string())
            .or_insert_with(|| Category::new(kind)))
    }

    /// Moves the node at `path` to `new_name` under the same parent.
    ///
    /// Returns the node's new path.
    pub fn rename_category(&mut self, path: &str, new_name: &str) -> Result<String> {
        let new_name = validate_name(new_name)?;
        let (parent_path, old_name) = split_parent(path)?;
        let parent = self.resolve_mut(parent_path)?;
        if !parent.children.contains_key(old_name) {
            return Err(LedgerError::not_found(old_name, path));
        }
        let renamed = join_path(parent_path, new_name);
        if old_name == new_name {
            return Ok(renamed);
        }
        if parent.children.contains_key(new_name) {
            return Err(LedgerError::DuplicateName {
                name: new_name.to_string(),
                parent: display_path(parent_path),
            });
        }
        if let Some(node) = parent.children.remove(old_name) {
            parent.children.insert(new_name.to_string(), node);
        }
        tracing::info!(from = path, to = %renamed, "renamed category");
        Ok(renamed)
    }

    /// Removes the node at `path` together with its whole subtree.
    pub fn delete_category(&mut self, path: &str) -> Result<Category> {
        let (parent_path, name) = split_parent(path)?;
        let parent = self.resolve_mut(parent_path)?;
        let removed = parent
            .children
            .remove(name)
            .ok_or_else(|| LedgerError::not_found(name, path))?;
        tracing::info!(path, nodes = removed.subtree_len(), "deleted category");
        Ok(removed)
    }

    /// Appends a transaction to the virtual category at `path` and applies the
    /// amount to its running balance.
    pub fn post_transaction(
        &mut self,
        path: &str,
        amount: f64,
        description: &str,
        now: NaiveDateTime,
    ) -> Result<Transaction> {
        let node = self.resolve_mut(path)?;
        let kind = node.kind();
        let Holding::Virtual {
            balance,
            transactions,
        } = &mut node.holding
        else {
            return Err(wrong_kind(path, CategoryKind::Virtual, kind));
        };
        if !amount.is_finite() {
            return Err(LedgerError::InvalidAmount(format!(
                "{} is not a finite number",
                amount
            )));
        }
        let transaction = Transaction::new(amount, description.trim(), now);
        transactions.push(transaction.clone());
        *balance += amount;
        tracing::info!(path, amount, id = %transaction.id, "posted transaction");
        Ok(transaction)
    }

    /// Replaces every denomination count of the cash category at `path`.
    pub fn set_denominations(
        &mut self,
        path: &str,
        bills: &BTreeMap<String, i64>,
        coins: &BTreeMap<String, i64>,
    ) -> Result<()> {
        let node = self.resolve_mut(path)?;
        let kind = node.kind();
        let Holding::Cash {
            balance,
            denominations,
            ..
        } = &mut node.holding
        else {
            return Err(wrong_kind(path, CategoryKind::Cash, kind));
        };
        let counts = Denominations::from_counts(bills, coins)?;
        *balance = counts.total();
        *denominations = counts;
        tracing::info!(path, balance = *balance, "updated denominations");
        Ok(())
    }

    /// Every node below the root, depth first, siblings in name order.
    pub fn outline(&self) -> Vec<OutlineRow> {
        let mut rows = Vec::new();
        collect_outline(&self.root, "", 0, &mut rows);
        rows
    }

    /// Direct children of the node at `path` with their balances.
    pub fn summary_breakdown(&self, path: &str) -> Result<Vec<ChildBalance>> {
        let node = self.resolve(path)?;
        Ok(node
            .children
            .iter()
            .map(|(name, child)| ChildBalance {
                name: name.clone(),
                kind: child.kind(),
                balance: child.balance(),
            })
            .collect())
    }

    /// Transactions of the node at `path`, newest first.
    pub fn history(&self, path: &str) -> Result<Vec<&Transaction>> {
        let node = self.resolve(path)?;
        if node.kind() == CategoryKind::Summary {
            return Err(wrong_kind(path, CategoryKind::Virtual, CategoryKind::Summary));
        }
        Ok(newest_first(node.transactions()))
    }

    /// Whether the node at `path` is a virtual category with recorded transactions.
    pub fn has_history(&self, path: &str) -> bool {
        self.resolve(path)
            .map(|node| node.kind() == CategoryKind::Virtual && !node.transactions().is_empty())
            .unwrap_or(false)
    }

    /// Denomination lines of the cash category at `path`.
    pub fn cash_breakdown(&self, path: &str) -> Result<Vec<DenominationLine>> {
        let node = self.resolve(path)?;
        node.denominations()
            .map(Denominations::lines)
            .ok_or_else(|| wrong_kind(path, CategoryKind::Cash, node.kind()))
    }
}

/// Path segments; the empty path has none.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(PATH_DELIMITER).filter(move |_| !path.is_empty())
}

pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", parent, PATH_DELIMITER, name)
    }
}

fn split_parent(path: &str) -> Result<(&str, &str)> {
    if path.is_empty() {
        return Err(LedgerError::RootImmutable);
    }
    Ok(match path.rsplit_once(PATH_DELIMITER) {
        Some((parent, name)) => (parent, name),
        None => ("", path),
    })
}

fn validate_name(raw: &str) -> Result<&str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(LedgerError::EmptyName);
    }
    if name.contains(PATH_DELIMITER) {
        return Err(LedgerError::InvalidName(name.to_string()));
    }
    Ok(name)
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".into()
    } else {
        path.to_string()
    }
}

fn wrong_kind(path: &str, expected: CategoryKind, actual: CategoryKind) -> LedgerError {
    LedgerError::WrongKind {
        path: display_path(path),
        expected,
        actual,
    }
}

fn collect_outline(node: &Category, path: &str, depth: usize, rows: &mut Vec<OutlineRow>) {
    for (name, child) in &node.children {
        let child_path = join_path(path, name);
        rows.push(OutlineRow {
            path: child_path.clone(),
            name: name.clone(),
            depth,
            kind: child.kind(),
            balance: child.balance(),
        });
        collect_outline(child, &child_path, depth + 1, rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn sample_tree() -> LedgerTree {
        let mut tree = LedgerTree::new();
        tree.add_category("", "Assets", CategoryKind::Summary).unwrap();
        tree.add_category("Assets", "Bank", CategoryKind::Virtual).unwrap();
        tree.add_category("Assets", "Wallet", CategoryKind::Cash).unwrap();
        tree.add_category("Assets.Bank", "Savings", CategoryKind::Virtual)
            .unwrap();
        tree
    }

    #[test]
    fn segments_of_root_path_are_empty() {
        assert_eq!(segments("").count(), 0);
        assert_eq!(segments("A.B").collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn resolve_reports_first_missing_segment() {
        let tree = sample_tree();
        let err = tree.resolve("Assets.Missing.Deeper").unwrap_err();
        match err {
            LedgerError::NotFound { segment, path } => {
                assert_eq!(segment, "Missing");
                assert_eq!(path, "Assets.Missing.Deeper");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn names_are_trimmed_and_validated() {
        let mut tree = LedgerTree::new();
        tree.add_category("", "  Food  ", CategoryKind::Virtual).unwrap();
        assert!(tree.contains("Food"));
        assert!(matches!(
            tree.add_category("", "   ", CategoryKind::Virtual),
            Err(LedgerError::EmptyName)
        ));
        assert!(matches!(
            tree.add_category("", "a.b", CategoryKind::Virtual),
            Err(LedgerError::InvalidName(_))
        ));
    }

    #[test]
    fn nesting_stops_at_max_depth() {
        let mut tree = LedgerTree::new();
        let mut path = String::new();
        for level in 0..MAX_DEPTH {
            let name = format!("L{level}");
            tree.add_category(&path, &name, CategoryKind::Summary).unwrap();
            path = join_path(&path, &name);
        }
        let before = tree.clone();
        match tree.add_category(&path, "Extra", CategoryKind::Virtual) {
            Err(LedgerError::TooDeep { name, max, .. }) => {
                assert_eq!(name, "Extra");
                assert_eq!(max, MAX_DEPTH);
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(tree, before);
    }

    #[test]
    fn add_under_missing_parent_fails() {
        let mut tree = LedgerTree::new();
        assert!(matches!(
            tree.add_category("Nope", "Child", CategoryKind::Virtual),
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[test]
    fn rename_to_same_name_is_a_no_op() {
        let mut tree = sample_tree();
        let before = tree.clone();
        assert_eq!(tree.rename_category("Assets.Bank", "Bank").unwrap(), "Assets.Bank");
        assert_eq!(tree, before);
    }

    #[test]
    fn rename_onto_sibling_fails() {
        let mut tree = sample_tree();
        assert!(matches!(
            tree.rename_category("Assets.Bank", "Wallet"),
            Err(LedgerError::DuplicateName { .. })
        ));
        assert!(tree.contains("Assets.Bank.Savings"));
    }

    #[test]
    fn root_cannot_be_renamed_or_deleted() {
        let mut tree = sample_tree();
        assert!(matches!(
            tree.rename_category("", "Top"),
            Err(LedgerError::RootImmutable)
        ));
        assert!(matches!(tree.delete_category(""), Err(LedgerError::RootImmutable)));
    }

    #[test]
    fn posting_rejects_non_finite_amounts() {
        let mut tree = sample_tree();
        for amount in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                tree.post_transaction("Assets.Bank", amount, "bad", now()),
                Err(LedgerError::InvalidAmount(_))
            ));
        }
        assert!(tree.resolve("Assets.Bank").unwrap().transactions().is_empty());
    }

    #[test]
    fn posting_to_cash_is_wrong_kind() {
        let mut tree = sample_tree();
        let err = tree
            .post_transaction("Assets.Wallet", 5.0, "", now())
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::WrongKind {
                expected: CategoryKind::Virtual,
                actual: CategoryKind::Cash,
                ..
            }
        ));
    }

    #[test]
    fn denominations_on_virtual_is_wrong_kind() {
        let mut tree = sample_tree();
        let (bills, coins) = Denominations::default().editable_counts();
        assert!(matches!(
            tree.set_denominations("Assets.Bank", &bills, &coins),
            Err(LedgerError::WrongKind { .. })
        ));
    }

    #[test]
    fn outline_walks_depth_first_in_name_order() {
        let tree = sample_tree();
        let rows: Vec<(String, usize)> = tree
            .outline()
            .into_iter()
            .map(|row| (row.path, row.depth))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Assets".to_string(), 0),
                ("Assets.Bank".to_string(), 1),
                ("Assets.Bank.Savings".to_string(), 2),
                ("Assets.Wallet".to_string(), 1),
            ]
        );
    }

    #[test]
    fn history_availability_tracks_virtual_transactions() {
        let mut tree = sample_tree();
        assert!(!tree.has_history("Assets.Bank"));
        tree.post_transaction("Assets.Bank", 1.0, "", now()).unwrap();
        assert!(tree.has_history("Assets.Bank"));
        assert!(!tree.has_history("Assets"));
        assert!(!tree.has_history("Missing"));
        assert!(tree.history("Assets").is_err());
    }

    #[test]
    fn non_object_document_is_corrupt() {
        let err = LedgerTree::from_document(serde_json::json!([1, 2])).unwrap_err();
        assert!(matches!(err, LedgerError::CorruptDocument(_)));
    }
}
