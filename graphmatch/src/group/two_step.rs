// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Two-step group-by: local dictionaries, then one shared merge

use log::debug;

use super::key::LocalGroups;
use super::shared::SharedGroups;
use super::{row_ranges, GroupContext, GroupEntry, Grouper, RowRef};
use crate::aggregate::{evaluate_inputs, kinds, AggregateKind};
use crate::compare::KeyProbe;
use crate::config::AggregateStorageKind;
use crate::table::TableResults;

#[derive(Debug, Clone, Copy)]
pub struct TwoStepGroupBy {
    storage: AggregateStorageKind,
}

impl TwoStepGroupBy {
    pub fn new(storage: AggregateStorageKind) -> Self {
        Self { storage }
    }
}

/// Group `range` of `table` into a fresh local dictionary
pub(crate) fn group_locally(
    ctx: &GroupContext<'_>,
    kinds: &[AggregateKind],
    table: &TableResults,
    range: std::ops::Range<usize>,
) -> LocalGroups {
    let mut local = LocalGroups::new(kinds);
    for index in range {
        let row = table.raw_row(index);
        let probe = ctx.keys.probe(&row, ctx.graph);
        let group = local.find_or_insert(probe, || Some(RowRef { table: 0, row: index }));
        local.apply(group, &evaluate_inputs(ctx.aggregates, &row, ctx.graph));
    }
    local
}

/// Move every local group into the shared dictionary
pub(crate) fn publish(local: LocalGroups, shared: &SharedGroups) {
    let (groups, storage) = local.into_parts();
    for (ordinal, group) in groups.into_iter().enumerate() {
        let key = KeyProbe {
            values: group.keys,
            hash: group.hash,
        }
        .into_key();
        shared.merge_list(key, &storage, ordinal, group.representative);
    }
}

impl Grouper for TwoStepGroupBy {
    fn name(&self) -> &'static str {
        "two_step"
    }

    fn group(&self, ctx: &GroupContext<'_>, table: &TableResults) -> Vec<GroupEntry> {
        let kinds = kinds(ctx.aggregates);
        let shared = SharedGroups::new(self.storage, &kinds, ctx.array_capacity);
        let ranges = row_ranges(table.row_count(), ctx.thread_count);

        let work = |range: std::ops::Range<usize>| {
            let local = group_locally(ctx, &kinds, table, range);
            publish(local, &shared);
        };
        if ranges.len() == 1 {
            ranges.into_iter().for_each(work);
        } else {
            ctx.pool.scope(|s| {
                for range in ranges {
                    let work = &work;
                    s.spawn(move |_| work(range));
                }
            });
        }

        debug!("Two-step group-by ({}) produced {} groups", self.storage, shared.len());
        shared.into_entries()
    }
}
