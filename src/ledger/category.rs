use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{denominations::Denominations, transaction::Transaction};

/// Supported category types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    Virtual,
    Cash,
    Summary,
}

impl CategoryKind {
    pub const ALL: [CategoryKind; 3] = [
        CategoryKind::Virtual,
        CategoryKind::Cash,
        CategoryKind::Summary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryKind::Virtual => "Virtual",
            CategoryKind::Cash => "Cash",
            CategoryKind::Summary => "Summary",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CategoryKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown category type `{}`", value))
    }
}

/// Kind-specific payload of a category, persisted under the `type` tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Holding {
    /// Running total updated by posted transactions.
    Virtual {
        #[serde(default)]
        balance: f64,
        #[serde(default)]
        transactions: Vec<Transaction>,
    },
    /// Physical cash; `balance` caches the denomination total.
    Cash {
        #[serde(default)]
        balance: f64,
        #[serde(default)]
        transactions: Vec<Transaction>,
        #[serde(default)]
        denominations: Denominations,
    },
    /// Pure rollup of its children.
    Summary {},
}

/// A node of the ledger tree. Its name is the key under which its parent stores it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    #[serde(flatten)]
    pub holding: Holding,
    #[serde(default)]
    pub children: BTreeMap<String, Category>,
}

impl Default for Category {
    fn default() -> Self {
        Self::new(CategoryKind::Virtual)
    }
}

impl Category {
    /// Creates an empty node; cash nodes start with every denomination at zero.
    pub fn new(kind: CategoryKind) -> Self {
        let holding = match kind {
            CategoryKind::Virtual => Holding::Virtual {
                balance: 0.0,
                transactions: Vec::new(),
            },
            CategoryKind::Cash => Holding::Cash {
                balance: 0.0,
                transactions: Vec::new(),
                denominations: Denominations::default(),
            },
            CategoryKind::Summary => Holding::Summary {},
        };
        Self {
            holding,
            children: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> CategoryKind {
        match self.holding {
            Holding::Virtual { .. } => CategoryKind::Virtual,
            Holding::Cash { .. } => CategoryKind::Cash,
            Holding::Summary {} => CategoryKind::Summary,
        }
    }

    /// Balance as stored on the node itself, ignoring children.
    pub fn stored_balance(&self) -> Option<f64> {
        match &self.holding {
            Holding::Virtual { balance, .. } | Holding::Cash { balance, .. } => Some(*balance),
            Holding::Summary {} => None,
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        match &self.holding {
            Holding::Virtual { transactions, .. } | Holding::Cash { transactions, .. } => {
                transactions
            }
            Holding::Summary {} => &[],
        }
    }

    pub fn denominations(&self) -> Option<&Denominations> {
        match &self.holding {
            Holding::Cash { denominations, .. } => Some(denominations),
            _ => None,
        }
    }

    /// Computed balance without touching stored state.
    ///
    /// Summary: sum of children. Cash: denomination total plus children.
    /// Virtual: stored balance plus children.
    pub fn balance(&self) -> f64 {
        let own = match &self.holding {
            Holding::Summary {} => 0.0,
            Holding::Cash { denominations, .. } => denominations.total(),
            Holding::Virtual { balance, .. } => *balance,
        };
        own + self.children.values().map(Category::balance).sum::<f64>()
    }

    /// Computes the balance like [`Category::balance`], writing each cash
    /// node's denomination total back into its stored balance on the way.
    ///
    /// This keeps persisted snapshots consistent with the counts; callers that
    /// must not mutate state should use [`Category::balance`] instead.
    pub fn refresh_balance(&mut self) -> f64 {
        let own = match &mut self.holding {
            Holding::Summary {} => 0.0,
            Holding::Cash {
                balance,
                denominations,
                ..
            } => {
                *balance = denominations.total();
                *balance
            }
            Holding::Virtual { balance, .. } => *balance,
        };
        own + self
            .children
            .values_mut()
            .map(Category::refresh_balance)
            .sum::<f64>()
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.values().map(Category::subtree_len).sum::<usize>()
    }
}
