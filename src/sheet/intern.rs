//! Append-only value tables with stable indices.
//!
//! Shared strings, fonts, fills, borders, number formats and cell formats
//! are all stored this way: a value is added once, and every later
//! occurrence of an equal value resolves to the same index.

use crate::common::error::{Error, Result};
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct InternTable<T> {
    values: Vec<T>,
    lookup: HashMap<T, u32>,
}

impl<T: Eq + Hash + Clone> InternTable<T> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Build a table that keeps `values` at their existing positions.
    ///
    /// Duplicates are kept in place (files written by other tools often
    /// contain them); lookups resolve to the first occurrence.
    pub fn from_entries(values: Vec<T>) -> Self {
        let mut lookup = HashMap::with_capacity(values.len());
        for (idx, value) in values.iter().enumerate() {
            lookup.entry(value.clone()).or_insert(idx as u32);
        }
        Self { values, lookup }
    }

    /// Index of `value`, appending it if it is not present yet.
    pub fn intern(&mut self, value: T) -> u32 {
        if let Some(&idx) = self.lookup.get(&value) {
            return idx;
        }
        let idx = self.values.len() as u32;
        self.lookup.insert(value.clone(), idx);
        self.values.push(value);
        idx
    }

    /// Index of `value` without inserting.
    pub fn find(&self, value: &T) -> Option<u32> {
        self.lookup.get(value).copied()
    }

    pub fn get(&self, index: u32) -> Result<&T> {
        self.values.get(index as usize).ok_or(Error::IndexOutOfRange {
            index: index as usize,
            len: self.values.len(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }
}

impl<T: Eq + Hash + Clone> Default for InternTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Eq + Hash + Clone> IntoIterator for &'a InternTable<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
