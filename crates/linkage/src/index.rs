use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use crate::error::LinkError;
use crate::model::{IndexExclusions, Payroll};

/// Payroll candidates of one fiscal year, bucketed by normalized last name.
///
/// Buckets keep insertion order. A payroll lives in exactly one bucket and
/// leaves it for good when it is matched.
#[derive(Debug, Default)]
pub struct CandidateIndex {
    buckets: BTreeMap<String, Vec<Payroll>>,
    len: usize,
}

impl CandidateIndex {
    /// Build the index, dropping civilian titles and rows with neither a
    /// first nor a last name.
    pub fn build(
        payrolls: impl IntoIterator<Item = Payroll>,
        civilian_titles: &BTreeSet<String>,
    ) -> (Self, IndexExclusions) {
        let mut index = Self::default();
        let mut excluded = IndexExclusions::default();

        for payroll in payrolls {
            if civilian_titles.contains(&payroll.title.trim().to_uppercase()) {
                excluded.civilian_title += 1;
                continue;
            }
            if payroll.first_name.is_empty() && payroll.last_name.is_empty() {
                excluded.nameless += 1;
                continue;
            }
            index.insert(payroll);
        }

        (index, excluded)
    }

    fn insert(&mut self, payroll: Payroll) {
        self.buckets
            .entry(payroll.last_name.clone())
            .or_default()
            .push(payroll);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Candidates sharing exactly this last name, in insertion order.
    pub fn exact(&self, last_name: &str) -> Vec<&Payroll> {
        if last_name.is_empty() {
            return Vec::new();
        }
        self.buckets
            .get(last_name)
            .map(|bucket| bucket.iter().collect())
            .unwrap_or_default()
    }

    /// Candidates from every bucket whose key is a prefix of `last_name` or
    /// has `last_name` as a prefix. Buckets are visited in key order, each in
    /// insertion order. Empty names match nothing.
    pub fn prefixed(&self, last_name: &str) -> Vec<&Payroll> {
        if last_name.is_empty() {
            return Vec::new();
        }

        let mut keys: BTreeSet<&str> = BTreeSet::new();

        // Keys that are prefixes of the name.
        for (end, _) in last_name.char_indices().skip(1) {
            if let Some((key, _)) = self.buckets.get_key_value(&last_name[..end]) {
                keys.insert(key.as_str());
            }
        }

        // Keys that extend the name (the name itself included).
        for key in self
            .buckets
            .range::<str, _>((Bound::Included(last_name), Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(last_name))
        {
            keys.insert(key.as_str());
        }

        keys.into_iter()
            .filter_map(|key| self.buckets.get(key))
            .flat_map(|bucket| bucket.iter())
            .collect()
    }

    /// Take a matched payroll out of its bucket.
    ///
    /// Fails when the payroll is not there: it was already consumed or was
    /// never indexed under that name. Callers treat this as fatal.
    pub fn remove(&mut self, last_name: &str, row: usize) -> Result<Payroll, LinkError> {
        let not_indexed = || LinkError::PayrollNotIndexed {
            last_name: last_name.to_string(),
            row,
        };

        let bucket = self.buckets.get_mut(last_name).ok_or_else(not_indexed)?;
        let pos = bucket
            .iter()
            .position(|p| p.row == row)
            .ok_or_else(not_indexed)?;
        let payroll = bucket.remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(last_name);
        }
        self.len -= 1;
        Ok(payroll)
    }

    /// Consume the index, returning what was never matched in row order.
    pub fn into_remaining(self) -> Vec<Payroll> {
        let mut remaining: Vec<Payroll> = self.buckets.into_values().flatten().collect();
        remaining.sort_by_key(|p| p.row);
        remaining
    }
}
