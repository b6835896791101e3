// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Aggregation without grouping keys

use rayon::prelude::*;

use super::{row_ranges, GroupContext, GroupEntry, Grouper};
use crate::aggregate::{evaluate_inputs, kinds, ListStorage};
use crate::table::TableResults;

/// Exactly one group, also over zero rows
///
/// When every aggregate is `count(*)` no expression is evaluated: each
/// worker's row count is added instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleGroupGroupBy;

impl Grouper for SingleGroupGroupBy {
    fn name(&self) -> &'static str {
        "single_group"
    }

    fn group(&self, ctx: &GroupContext<'_>, table: &TableResults) -> Vec<GroupEntry> {
        let kinds = kinds(ctx.aggregates);
        let mut total = ListStorage::new(&kinds);
        let group = total.add_group();

        if kinds.iter().all(|k| k.is_count_all()) {
            total.add_count_all(group, table.row_count() as u64);
        } else {
            let ranges = row_ranges(table.row_count(), ctx.thread_count);
            let partials: Vec<ListStorage> = ctx.pool.install(|| {
                ranges
                    .into_par_iter()
                    .map(|range| {
                        let mut partial = ListStorage::new(&kinds);
                        let group = partial.add_group();
                        for index in range {
                            let row = table.raw_row(index);
                            partial.apply(group, &evaluate_inputs(ctx.aggregates, &row, ctx.graph));
                        }
                        partial
                    })
                    .collect()
            });
            for partial in &partials {
                total.merge_group(group, partial, 0);
            }
        }

        vec![GroupEntry {
            representative: None,
            keys: Vec::new(),
            aggregates: total.values(group),
        }]
    }
}
