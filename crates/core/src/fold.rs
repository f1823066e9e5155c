use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::compare::Accessors;
use crate::config::UnitPricePolicy;

/// How rows sharing a key inside one collection are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldPolicy {
    /// Later rows replace earlier ones (catalog tables).
    LastWins,
    /// Quantities and totals are summed; unit price follows the policy
    /// (measurement periods).
    Sum(UnitPricePolicy),
}

/// All rows of one collection that share a key, merged.
#[derive(Debug)]
pub struct FoldedEntry<'a, T> {
    pub key: String,
    /// Row whose labels (description, unit, code) represent the key.
    pub entry: &'a T,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub total: Option<f64>,
    pub row_count: usize,
    weighted_price: f64,
}

/// Key → merged entry, remembering the order keys were first seen.
#[derive(Debug)]
pub struct Folded<'a, T> {
    order: Vec<String>,
    entries: HashMap<String, FoldedEntry<'a, T>>,
}

impl<'a, T> Folded<'a, T> {
    pub fn get(&self, key: &str) -> Option<&FoldedEntry<'a, T>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn add(acc: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (acc, value) {
        (Some(a), Some(v)) => Some(a + v),
        (None, v) => v,
        (a, None) => a,
    }
}

/// Group entries by key and merge each group per the accessors' fold policy.
pub fn fold_entries<'a, T>(entries: &'a [T], acc: &Accessors<T>) -> Folded<'a, T> {
    let mut order: Vec<String> = Vec::new();
    let mut map: HashMap<String, FoldedEntry<'a, T>> = HashMap::new();

    for entry in entries {
        let key = (acc.key)(entry);
        let price = (acc.price)(entry);
        let quantity = (acc.quantity)(entry);
        let total = (acc.total)(entry);

        let folded = match map.entry(key) {
            Entry::Vacant(slot) => {
                let key = slot.key().clone();
                order.push(key.clone());
                slot.insert(FoldedEntry {
                    key,
                    entry,
                    price,
                    quantity,
                    total,
                    row_count: 1,
                    weighted_price: price.unwrap_or(0.0) * quantity.unwrap_or(0.0),
                });
                continue;
            }
            Entry::Occupied(slot) => slot.into_mut(),
        };

        folded.row_count += 1;
        match acc.fold {
            FoldPolicy::LastWins => {
                folded.entry = entry;
                folded.price = price;
                folded.quantity = quantity;
                folded.total = total;
            }
            FoldPolicy::Sum(policy) => {
                folded.quantity = add(folded.quantity, quantity);
                folded.total = add(folded.total, total);
                folded.weighted_price += price.unwrap_or(0.0) * quantity.unwrap_or(0.0);
                match policy {
                    UnitPricePolicy::FirstWins => {}
                    UnitPricePolicy::LastWins => folded.price = price.or(folded.price),
                    UnitPricePolicy::WeightedAverage => {
                        let q = folded.quantity.unwrap_or(0.0);
                        if q != 0.0 {
                            folded.price = Some(folded.weighted_price / q);
                        }
                    }
                }
            }
        }
    }

    let merged = map.values().filter(|f| f.row_count > 1).count();
    if merged > 0 {
        log::debug!("folded {} rows into {} keys ({merged} merged)", entries.len(), order.len());
    }

    Folded { order, entries: map }
}
