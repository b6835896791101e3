// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Group-by with pairwise merging of local dictionaries
//!
//! The worker ranges are halved recursively with `rayon::join`. Up to three
//! ranges are grouped in parallel and merged one after another; larger sets
//! merge their two halves, so the merge depth is logarithmic in the number
//! of workers.

use log::debug;
use rayon::prelude::*;
use std::ops::Range;

use super::key::LocalGroups;
use super::two_step::group_locally;
use super::{row_ranges, GroupContext, GroupEntry, Grouper};
use crate::aggregate::{kinds, AggregateKind};
use crate::table::TableResults;

/// Ranges at or below this count are merged linearly
const LINEAR_MERGE_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTwoWayMergeGroupBy;

/// Merge a list of dictionaries in a join tree
pub(crate) fn merge_tree(mut parts: Vec<LocalGroups>, kinds: &[AggregateKind]) -> LocalGroups {
    if parts.len() <= LINEAR_MERGE_LIMIT {
        let mut parts = parts.into_iter();
        let mut merged = parts.next().unwrap_or_else(|| LocalGroups::new(kinds));
        for part in parts {
            merged.merge_from(part);
        }
        return merged;
    }
    let right = parts.split_off(parts.len() / 2);
    let (mut left, right) = rayon::join(|| merge_tree(parts, kinds), || merge_tree(right, kinds));
    left.merge_from(right);
    left
}

fn group_ranges(
    ctx: &GroupContext<'_>,
    kinds: &[AggregateKind],
    table: &TableResults,
    ranges: &[Range<usize>],
) -> LocalGroups {
    if ranges.len() <= LINEAR_MERGE_LIMIT {
        let parts: Vec<LocalGroups> = ranges
            .par_iter()
            .map(|range| group_locally(ctx, kinds, table, range.clone()))
            .collect();
        return merge_tree(parts, kinds);
    }
    let (left, right) = ranges.split_at(ranges.len() / 2);
    let (mut left, right) = rayon::join(
        || group_ranges(ctx, kinds, table, left),
        || group_ranges(ctx, kinds, table, right),
    );
    left.merge_from(right);
    left
}

impl Grouper for LocalTwoWayMergeGroupBy {
    fn name(&self) -> &'static str {
        "local_two_way_merge"
    }

    fn group(&self, ctx: &GroupContext<'_>, table: &TableResults) -> Vec<GroupEntry> {
        let kinds = kinds(ctx.aggregates);
        let ranges = row_ranges(table.row_count(), ctx.thread_count);
        let merged = if ranges.len() == 1 {
            group_locally(ctx, &kinds, table, ranges[0].clone())
        } else {
            ctx.pool.install(|| group_ranges(ctx, &kinds, table, &ranges))
        };
        debug!("Local two-way merge group-by produced {} groups", merged.len());
        merged.into_entries()
    }
}
