use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use ledger_tree::{
    ledger::{BILL_LABELS, COIN_LABELS},
    storage::{load_tree_from_path, save_tree_to_path},
    CategoryKind, LedgerTree,
};
use tempfile::tempdir;

/// A three-level tree: summaries holding virtual accounts and cash drawers,
/// each virtual account carrying `txn_per_account` postings.
fn build_sample_tree(groups: usize, txn_per_account: usize) -> LedgerTree {
    let mut tree = LedgerTree::new();
    let start = NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let zeros = |labels: &[&str]| -> BTreeMap<String, i64> {
        labels.iter().map(|label| (label.to_string(), 0)).collect()
    };

    for group in 0..groups {
        let group_name = format!("Group{group}");
        tree.add_category("", &group_name, CategoryKind::Summary)
            .expect("add group");
        for account in 0..10 {
            let name = format!("Account{account}");
            tree.add_category(&group_name, &name, CategoryKind::Virtual)
                .expect("add account");
            let path = format!("{group_name}.{name}");
            for idx in 0..txn_per_account {
                let when = start + Duration::minutes(idx as i64);
                tree.post_transaction(&path, 10.0 + (idx % 50) as f64, "bench", when)
                    .expect("post");
            }
        }
        let drawer = format!("{group_name}.Drawer");
        tree.add_category(&group_name, "Drawer", CategoryKind::Cash)
            .expect("add drawer");
        let mut bills = zeros(&BILL_LABELS[..]);
        bills.insert("20".into(), group as i64 + 1);
        tree.set_denominations(&drawer, &bills, &zeros(&COIN_LABELS[..]))
            .expect("denominations");
    }
    tree
}

fn bench_balances(c: &mut Criterion) {
    let tree = build_sample_tree(black_box(100), 10);

    c.bench_function("balance_root_1k_nodes", |b| {
        b.iter(|| black_box(tree.balance("").expect("balance")))
    });

    c.bench_function("compute_balance_root_1k_nodes", |b| {
        b.iter_batched(
            || tree.clone(),
            |mut tree| black_box(tree.compute_balance("").expect("balance")),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("outline_1k_nodes", |b| {
        b.iter(|| black_box(tree.outline()))
    });
}

fn bench_tree_io(c: &mut Criterion) {
    let tree = build_sample_tree(black_box(100), 10);
    let dir = tempdir().expect("tempdir");
    let file_path = dir.path().join("finance_data.json");

    c.bench_function("tree_save_10k_txns", |b| {
        b.iter(|| save_tree_to_path(&tree, &file_path).expect("save tree"))
    });

    save_tree_to_path(&tree, &file_path).expect("seed");

    c.bench_function("tree_load_10k_txns", |b| {
        b.iter(|| black_box(load_tree_from_path(&file_path).expect("load tree")))
    });
}

criterion_group!(benches, bench_balances, bench_tree_io);
criterion_main!(benches);
