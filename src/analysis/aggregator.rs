//! Deal aggregation and statistics.
//!
//! This module turns the raw deal table into the summary tables that feed
//! the dashboard: per-owner and per-ad summaries and the product pivot.
//!
//! Counting rules, applied identically to owners and ads:
//! - `payment_done` counts deals whose stage is "Payment Done", whatever the amount.
//! - `deal_amount_sum` adds every positive amount, whatever the stage.
//!
//! Groups are emitted in ascending key order and sums are taken over sorted
//! values, so the output does not depend on input row order.

use crate::models::{
    AdSummary, DashboardData, Deal, DealTable, GroupSummary, Matrix, OwnerSummary,
    ProductBreakdown, UNKNOWN_PRODUCT,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Summarize deals per owner.
pub fn summarize_by_owner(deals: &DealTable) -> Vec<OwnerSummary> {
    summarize_by(deals, |d| d.owner.as_str())
}

/// Summarize deals per ad source.
pub fn summarize_by_ad(deals: &DealTable) -> Vec<AdSummary> {
    summarize_by(deals, |d| d.ad.as_str())
}

/// Group deals by `key` and compute totals for each group.
fn summarize_by<F>(deals: &DealTable, key: F) -> Vec<GroupSummary>
where
    F: Fn(&Deal) -> &str,
{
    #[derive(Default)]
    struct Group {
        total: u64,
        payment_done: u64,
        amounts: Vec<f64>,
    }

    let mut groups: BTreeMap<&str, Group> = BTreeMap::new();

    for deal in deals.rows() {
        let group = groups.entry(key(deal)).or_default();
        group.total += 1;
        if deal.stage.is_payment_done() {
            group.payment_done += 1;
        }
        if let Some(amount) = deal.positive_amount() {
            group.amounts.push(amount);
        }
    }

    groups
        .into_iter()
        .map(|(key, group)| GroupSummary {
            key: key.to_string(),
            total: group.total,
            payment_done: group.payment_done,
            deal_amount_sum: ordered_sum(group.amounts),
            conversion_rate: conversion_rate(group.payment_done, group.total),
        })
        .collect()
}

/// Percentage of paid deals, rounded half-to-even to two decimals.
pub fn conversion_rate(payment_done: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(payment_done as f64 / total as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Sum values in ascending order so the result is independent of input order.
fn ordered_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    values.into_iter().sum()
}

/// Sort summaries by conversion rate, highest first.
///
/// The sort is stable: groups with equal rates keep their key order.
pub fn sort_by_conversion(summaries: &mut [GroupSummary]) {
    summaries.sort_by(|a, b| b.conversion_rate.total_cmp(&a.conversion_rate));
}

/// Pivot paid deals by product (rows) and education type (columns).
///
/// Only deals with stage "Payment Done" and a positive amount take part.
/// Deals with the `NoData` product are dropped before pivoting.
pub fn breakdown_by_product(deals: &DealTable) -> ProductBreakdown {
    let mut products: BTreeSet<&str> = BTreeSet::new();
    let mut education_types: BTreeSet<&str> = BTreeSet::new();
    let mut cells: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();

    let paid = deals
        .rows()
        .iter()
        .filter(|d| d.is_paid_with_amount() && d.product != UNKNOWN_PRODUCT);

    for deal in paid {
        let Some(amount) = deal.positive_amount() else {
            continue;
        };
        let (product, education) = (deal.product.as_str(), deal.education_type.as_str());
        products.insert(product);
        education_types.insert(education);
        cells
            .entry((product, education))
            .or_default()
            .push(amount);
    }

    ProductBreakdown {
        sum: pivot(&products, &education_types, &cells, |amounts| {
            ordered_sum(amounts.to_vec())
        }),
        count: pivot(&products, &education_types, &cells, |amounts| {
            amounts.len() as u64
        }),
    }
}

/// Build a matrix over the full row/column universe, filling each cell from its amounts.
fn pivot<'a, T>(
    products: &BTreeSet<&'a str>,
    education_types: &BTreeSet<&'a str>,
    cells: &BTreeMap<(&'a str, &'a str), Vec<f64>>,
    cell: impl Fn(&[f64]) -> T,
) -> Matrix<T> {
    Matrix {
        rows: products.iter().map(|p| p.to_string()).collect(),
        columns: education_types.iter().map(|e| e.to_string()).collect(),
        cells: products
            .iter()
            .map(|product| {
                education_types
                    .iter()
                    .map(|education| cells.get(&(*product, *education)).map(|v| cell(v)))
                    .collect()
            })
            .collect(),
    }
}

/// Run the whole aggregation pipeline over the deal table.
pub fn prepare_data(deals: &DealTable) -> DashboardData {
    let owners = summarize_by_owner(deals);
    let ads = summarize_by_ad(deals);
    let products = breakdown_by_product(deals);

    debug!(
        "Aggregated {} deals into {} owners, {} ad sources, {}x{} product matrix",
        deals.len(),
        owners.len(),
        ads.len(),
        products.sum.rows.len(),
        products.sum.columns.len()
    );

    DashboardData {
        owners,
        ads,
        products,
    }
}
