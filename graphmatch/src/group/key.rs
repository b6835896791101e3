// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lock-free local group dictionary
//!
//! Owned by exactly one worker. Groups are numbered in insertion order and
//! their aggregates live in list storage under the same ordinal.

use hashbrown::HashTable;

use super::{GroupEntry, RowRef};
use crate::aggregate::{AggregateInput, AggregateKind, ListStorage};
use crate::compare::KeyProbe;
use crate::graph::Value;

#[derive(Debug, Clone)]
pub struct LocalGroup {
    pub hash: u64,
    pub keys: Box<[Option<Value>]>,
    pub representative: Option<RowRef>,
}

#[derive(Debug, Clone)]
pub struct LocalGroups {
    index: HashTable<usize>,
    groups: Vec<LocalGroup>,
    storage: ListStorage,
}

impl LocalGroups {
    pub fn new(kinds: &[AggregateKind]) -> Self {
        Self {
            index: HashTable::new(),
            groups: Vec::new(),
            storage: ListStorage::new(kinds),
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[LocalGroup] {
        &self.groups
    }

    pub fn storage(&self) -> &ListStorage {
        &self.storage
    }

    pub fn find(&self, probe: &KeyProbe) -> Option<usize> {
        self.index
            .find(probe.hash, |&group| {
                let candidate = &self.groups[group];
                probe.matches(candidate.hash, &candidate.keys)
            })
            .copied()
    }

    /// Add a new group; the caller has checked it is absent
    pub fn insert(&mut self, probe: KeyProbe, representative: Option<RowRef>) -> usize {
        let group = self.storage.add_group();
        self.groups.push(LocalGroup {
            hash: probe.hash,
            keys: probe.values,
            representative,
        });
        let groups = &self.groups;
        self.index
            .insert_unique(groups[group].hash, group, |&g| groups[g].hash);
        group
    }

    /// Group of `probe`, created with the representative from `representative` when new
    pub fn find_or_insert(
        &mut self,
        probe: KeyProbe,
        representative: impl FnOnce() -> Option<RowRef>,
    ) -> usize {
        match self.find(&probe) {
            Some(group) => group,
            None => self.insert(probe, representative()),
        }
    }

    pub fn apply(&mut self, group: usize, inputs: &[AggregateInput]) {
        self.storage.apply(group, inputs);
    }

    /// Fold every group of `other` into this dictionary
    pub fn merge_from(&mut self, other: LocalGroups) {
        for (theirs, group) in other.groups.into_iter().enumerate() {
            let probe = KeyProbe {
                values: group.keys,
                hash: group.hash,
            };
            let ours = match self.find(&probe) {
                Some(ours) => ours,
                None => self.insert(probe, group.representative),
            };
            self.storage.merge_group(ours, &other.storage, theirs);
        }
    }

    /// Split into group descriptions and their aggregate storage
    pub fn into_parts(self) -> (Vec<LocalGroup>, ListStorage) {
        (self.groups, self.storage)
    }

    pub fn into_entries(self) -> Vec<GroupEntry> {
        let storage = self.storage;
        self.groups
            .into_iter()
            .enumerate()
            .map(|(ordinal, group)| GroupEntry {
                representative: group.representative,
                keys: group.keys.into_vec(),
                aggregates: storage.values(ordinal),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::OutputValue;
    use crate::compare::GroupKeyExprs;

    fn probe(key: i64) -> KeyProbe {
        let values: Box<[Option<Value>]> = Box::new([Some(Value::Int(key))]);
        let hash = GroupKeyExprs::hash_values(&values);
        KeyProbe { values, hash }
    }

    #[test]
    fn test_find_or_insert_keeps_first_representative() {
        let mut groups = LocalGroups::new(&[AggregateKind::CountAll]);
        let first = groups.find_or_insert(probe(1), || Some(RowRef { table: 0, row: 0 }));
        let again = groups.find_or_insert(probe(1), || Some(RowRef { table: 0, row: 9 }));
        let other = groups.find_or_insert(probe(2), || None);
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(groups.groups()[first].representative, Some(RowRef { table: 0, row: 0 }));
    }

    #[test]
    fn test_merge_from() {
        let kinds = [AggregateKind::CountAll, AggregateKind::SumInt];
        let fill = |rows: &[(i64, i64)]| {
            let mut groups = LocalGroups::new(&kinds);
            for (key, value) in rows {
                let group = groups.find_or_insert(probe(*key), || None);
                groups.apply(group, &[AggregateInput::Count, AggregateInput::Int(*value)]);
            }
            groups
        };
        let mut left = fill(&[(1, 10), (2, 5)]);
        let right = fill(&[(1, 7), (3, 1)]);

        left.merge_from(right);
        let mut entries = left.into_entries();
        entries.sort_by_key(|e| e.keys[0].as_ref().and_then(Value::as_int));
        let summary: Vec<_> = entries.iter().map(|e| e.aggregates.clone()).collect();
        assert_eq!(
            summary,
            vec![
                vec![OutputValue::Int(2), OutputValue::Int(17)],
                vec![OutputValue::Int(1), OutputValue::Int(5)],
                vec![OutputValue::Int(1), OutputValue::Int(1)],
            ]
        );
    }
}
