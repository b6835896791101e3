// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Concurrent group dictionary shared by every worker
//!
//! Map guards are only held to look up or create a group. Aggregates are
//! updated after the guard is released, through the thread-safe cell paths.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{GroupEntry, RowRef};
use crate::aggregate::{bucket_values, new_bucket, AggregateInput, AggregateKind, ArrayStorage, Bucket, ListStorage};
use crate::compare::{GroupKey, KeyProbe};
use crate::config::AggregateStorageKind;

#[derive(Debug)]
pub struct SharedGroup<S> {
    aggregates: S,
    representative: Option<RowRef>,
}

#[derive(Debug)]
pub enum SharedGroups {
    /// One bucket of atomic cells per group
    Bucket {
        kinds: Vec<AggregateKind>,
        map: DashMap<GroupKey, SharedGroup<Bucket>>,
    },
    /// Groups address positions of one array storage
    Array {
        map: DashMap<GroupKey, SharedGroup<usize>>,
        next: AtomicUsize,
        storage: ArrayStorage,
    },
}

impl SharedGroups {
    /// Shared dictionary over bucket or array storage
    pub fn new(storage: AggregateStorageKind, kinds: &[AggregateKind], array_capacity: usize) -> Self {
        match storage {
            AggregateStorageKind::Array => SharedGroups::Array {
                map: DashMap::new(),
                next: AtomicUsize::new(0),
                storage: ArrayStorage::new(kinds, array_capacity),
            },
            _ => SharedGroups::Bucket {
                kinds: kinds.to_vec(),
                map: DashMap::new(),
            },
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SharedGroups::Bucket { map, .. } => map.len(),
            SharedGroups::Array { map, .. } => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply one row to its group, creating the group on first sight
    pub fn apply(
        &self,
        probe: KeyProbe,
        inputs: &[AggregateInput],
        representative: impl FnOnce() -> Option<RowRef>,
    ) {
        match self {
            SharedGroups::Bucket { kinds, map } => {
                let bucket = map
                    .entry(probe.into_key())
                    .or_insert_with(|| SharedGroup {
                        aggregates: new_bucket(kinds),
                        representative: representative(),
                    })
                    .aggregates
                    .clone();
                for ((cell, kind), input) in bucket.iter().zip(kinds).zip(inputs) {
                    cell.apply_thread_safe(*kind, input);
                }
            }
            SharedGroups::Array { map, next, storage } => {
                let position = map
                    .entry(probe.into_key())
                    .or_insert_with(|| SharedGroup {
                        aggregates: next.fetch_add(1, Ordering::Relaxed),
                        representative: representative(),
                    })
                    .aggregates;
                storage.apply(position, inputs);
            }
        }
    }

    /// Merge `group` of a worker's local storage into the shared group with the same key
    ///
    /// A key seen first here adopts the local aggregates as they are.
    pub fn merge_list(
        &self,
        key: GroupKey,
        local: &ListStorage,
        group: usize,
        representative: Option<RowRef>,
    ) {
        match self {
            SharedGroups::Bucket { map, .. } => {
                let existing = match map.entry(key) {
                    Entry::Occupied(entry) => Some(entry.get().aggregates.clone()),
                    Entry::Vacant(entry) => {
                        entry.insert(SharedGroup {
                            aggregates: local.to_bucket(group),
                            representative,
                        });
                        None
                    }
                };
                if let Some(bucket) = existing {
                    local.merge_into_cells(group, &bucket, true);
                }
            }
            SharedGroups::Array { map, next, storage } => {
                let position = map
                    .entry(key)
                    .or_insert_with(|| SharedGroup {
                        aggregates: next.fetch_add(1, Ordering::Relaxed),
                        representative,
                    })
                    .aggregates;
                storage.merge_list(position, local, group);
            }
        }
    }

    pub fn into_entries(self) -> Vec<GroupEntry> {
        match self {
            SharedGroups::Bucket { map, .. } => map
                .into_iter()
                .map(|(key, group)| GroupEntry {
                    representative: group.representative,
                    keys: key.values.into_vec(),
                    aggregates: bucket_values(&group.aggregates),
                })
                .collect(),
            SharedGroups::Array { map, storage, .. } => map
                .into_iter()
                .map(|(key, group)| GroupEntry {
                    representative: group.representative,
                    keys: key.values.into_vec(),
                    aggregates: storage.values(group.aggregates),
                })
                .collect(),
        }
    }
}
