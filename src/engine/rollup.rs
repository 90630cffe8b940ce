//! Child-to-parent summation.
//!
//! Every rollup in the engine (product to brand trailing metrics, forecasts and
//! overstock; brand to category summaries) is a group-by-key sum. Keys are kept
//! in a `BTreeMap` so output order depends only on the keys, and repeated runs
//! over the same children produce identical rows.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::AddAssign;

/// Sum of `V` per key.
#[derive(Debug, Clone, PartialEq)]
pub struct Rollup<K: Ord, V = f64> {
    totals: BTreeMap<K, V>,
}

impl<K: Ord, V> Default for Rollup<K, V> {
    fn default() -> Self {
        Self {
            totals: BTreeMap::new(),
        }
    }
}

impl<K, V> Rollup<K, V>
where
    K: Ord,
    V: Default + AddAssign + Copy,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: K, value: V) {
        *self.totals.entry(key).or_default() += value;
    }

    /// Sum child rows onto their parent key. Rows without a parent are dropped.
    pub fn from_children<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Option<K>, V)>,
    {
        let mut rollup = Self::new();
        for (key, value) in rows {
            if let Some(key) = key {
                rollup.add(key, value);
            }
        }
        rollup
    }

    /// Total for `key`, or the zero value when no child contributed.
    pub fn get(&self, key: &K) -> V {
        self.totals.get(key).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.totals.iter()
    }

    pub fn into_rows(self) -> impl Iterator<Item = (K, V)> {
        self.totals.into_iter()
    }
}

/// Sum per key plus the number of distinct children that contributed.
#[derive(Debug, Clone, PartialEq)]
pub struct CountingRollup<K: Ord, C: Ord> {
    totals: BTreeMap<K, (f64, BTreeSet<C>)>,
}

impl<K: Ord, C: Ord> Default for CountingRollup<K, C> {
    fn default() -> Self {
        Self {
            totals: BTreeMap::new(),
        }
    }
}

impl<K: Ord, C: Ord> CountingRollup<K, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: K, child: C, value: f64) {
        let entry = self.totals.entry(key).or_default();
        entry.0 += value;
        entry.1.insert(child);
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// `(key, total, distinct children)` in key order.
    pub fn into_rows(self) -> impl Iterator<Item = (K, f64, usize)> {
        self.totals
            .into_iter()
            .map(|(key, (total, children))| (key, total, children.len()))
    }
}
