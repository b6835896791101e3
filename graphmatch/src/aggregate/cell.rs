// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Atomic aggregate cells
//!
//! A cell can be updated through two paths. The plain path (`apply`,
//! `merge`) uses load/store and is only correct while one thread owns the
//! cell; the thread-safe path (`apply_thread_safe`, `merge_thread_safe`)
//! uses read-modify-write operations and may race with other writers.

use parking_lot::Mutex;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

use super::{AggregateInput, AggregateKind, OutputValue};

/// Partial aggregate state exchanged between storages
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Partial<'a> {
    Count(u64),
    Sum(i64),
    Avg { sum: i64, count: u64 },
    Int(i64),
    Str(&'a str),
}

impl<'a> Partial<'a> {
    /// Contribution of one row to an aggregate of `kind`
    pub fn from_input(kind: AggregateKind, input: &'a AggregateInput) -> Option<Self> {
        match (kind, input) {
            (_, AggregateInput::Skip) => None,
            (AggregateKind::CountAll | AggregateKind::Count, _) => Some(Partial::Count(1)),
            (AggregateKind::SumInt, AggregateInput::Int(v)) => Some(Partial::Sum(*v)),
            (AggregateKind::AvgInt, AggregateInput::Int(v)) => Some(Partial::Avg { sum: *v, count: 1 }),
            (AggregateKind::MinInt | AggregateKind::MaxInt, AggregateInput::Int(v)) => {
                Some(Partial::Int(*v))
            }
            (AggregateKind::MinStr | AggregateKind::MaxStr, AggregateInput::Str(s)) => {
                Some(Partial::Str(s))
            }
            _ => None,
        }
    }
}

/// Running integer extremum with an explicit "seen a value" flag
#[derive(Debug)]
pub struct IntExtremum {
    value: AtomicI64,
    set: AtomicBool,
}

impl IntExtremum {
    fn new(initial: i64) -> Self {
        Self {
            value: AtomicI64::new(initial),
            set: AtomicBool::new(false),
        }
    }

    fn get(&self) -> Option<i64> {
        self.set
            .load(Ordering::Acquire)
            .then(|| self.value.load(Ordering::Acquire))
    }
}

#[derive(Debug)]
pub enum AggregateCell {
    Count(AtomicU64),
    Sum(AtomicI64),
    Avg { sum: AtomicI64, count: AtomicU64 },
    MinInt(IntExtremum),
    MaxInt(IntExtremum),
    MinStr(Mutex<Option<String>>),
    MaxStr(Mutex<Option<String>>),
}

impl AggregateCell {
    pub fn new(kind: AggregateKind) -> Self {
        match kind {
            AggregateKind::CountAll | AggregateKind::Count => AggregateCell::Count(AtomicU64::new(0)),
            AggregateKind::SumInt => AggregateCell::Sum(AtomicI64::new(0)),
            AggregateKind::AvgInt => AggregateCell::Avg {
                sum: AtomicI64::new(0),
                count: AtomicU64::new(0),
            },
            AggregateKind::MinInt => AggregateCell::MinInt(IntExtremum::new(i64::MAX)),
            AggregateKind::MaxInt => AggregateCell::MaxInt(IntExtremum::new(i64::MIN)),
            AggregateKind::MinStr => AggregateCell::MinStr(Mutex::new(None)),
            AggregateKind::MaxStr => AggregateCell::MaxStr(Mutex::new(None)),
        }
    }

    /// Single-owner update
    pub fn apply(&self, kind: AggregateKind, input: &AggregateInput) {
        if let Some(partial) = Partial::from_input(kind, input) {
            self.absorb(partial, false);
        }
    }

    /// Concurrent update
    pub fn apply_thread_safe(&self, kind: AggregateKind, input: &AggregateInput) {
        if let Some(partial) = Partial::from_input(kind, input) {
            self.absorb(partial, true);
        }
    }

    /// Single-owner merge of another cell of the same kind
    pub fn merge(&self, other: &AggregateCell) {
        other.with_partial(|p| self.absorb(p, false));
    }

    /// Concurrent merge of another cell of the same kind
    pub fn merge_thread_safe(&self, other: &AggregateCell) {
        other.with_partial(|p| self.absorb(p, true));
    }

    /// Call `f` with this cell's state unless it holds nothing yet
    pub fn with_partial(&self, f: impl FnOnce(Partial<'_>)) {
        match self {
            AggregateCell::Count(c) => f(Partial::Count(c.load(Ordering::Acquire))),
            AggregateCell::Sum(s) => f(Partial::Sum(s.load(Ordering::Acquire))),
            AggregateCell::Avg { sum, count } => f(Partial::Avg {
                sum: sum.load(Ordering::Acquire),
                count: count.load(Ordering::Acquire),
            }),
            AggregateCell::MinInt(e) | AggregateCell::MaxInt(e) => {
                if let Some(v) = e.get() {
                    f(Partial::Int(v));
                }
            }
            AggregateCell::MinStr(slot) | AggregateCell::MaxStr(slot) => {
                let value = slot.lock().clone();
                if let Some(s) = value {
                    f(Partial::Str(&s));
                }
            }
        }
    }

    /// Fold a partial state into this cell
    pub fn absorb(&self, partial: Partial<'_>, thread_safe: bool) {
        match (self, partial) {
            (AggregateCell::Count(c), Partial::Count(n)) => {
                if thread_safe {
                    c.fetch_add(n, Ordering::AcqRel);
                } else {
                    c.store(c.load(Ordering::Relaxed) + n, Ordering::Release);
                }
            }
            (AggregateCell::Sum(s), Partial::Sum(v)) => {
                if thread_safe {
                    s.fetch_add(v, Ordering::AcqRel);
                } else {
                    s.store(s.load(Ordering::Relaxed).wrapping_add(v), Ordering::Release);
                }
            }
            (AggregateCell::Avg { sum, count }, Partial::Avg { sum: s, count: n }) => {
                if thread_safe {
                    sum.fetch_add(s, Ordering::AcqRel);
                    count.fetch_add(n, Ordering::AcqRel);
                } else {
                    sum.store(sum.load(Ordering::Relaxed).wrapping_add(s), Ordering::Release);
                    count.store(count.load(Ordering::Relaxed) + n, Ordering::Release);
                }
            }
            (AggregateCell::MinInt(e), Partial::Int(v)) => {
                if thread_safe {
                    e.value.fetch_min(v, Ordering::AcqRel);
                } else if v < e.value.load(Ordering::Relaxed) {
                    e.value.store(v, Ordering::Release);
                }
                e.set.store(true, Ordering::Release);
            }
            (AggregateCell::MaxInt(e), Partial::Int(v)) => {
                if thread_safe {
                    e.value.fetch_max(v, Ordering::AcqRel);
                } else if v > e.value.load(Ordering::Relaxed) {
                    e.value.store(v, Ordering::Release);
                }
                e.set.store(true, Ordering::Release);
            }
            (AggregateCell::MinStr(slot), Partial::Str(v)) => {
                replace_if(&mut slot.lock(), v, CmpOrdering::Less);
            }
            (AggregateCell::MaxStr(slot), Partial::Str(v)) => {
                replace_if(&mut slot.lock(), v, CmpOrdering::Greater);
            }
            _ => {}
        }
    }

    pub fn value(&self) -> OutputValue {
        match self {
            AggregateCell::Count(c) => OutputValue::Int(c.load(Ordering::Acquire) as i64),
            AggregateCell::Sum(s) => OutputValue::Int(s.load(Ordering::Acquire)),
            AggregateCell::Avg { sum, count } => {
                let count = count.load(Ordering::Acquire);
                if count == 0 {
                    OutputValue::Null
                } else {
                    OutputValue::Float(sum.load(Ordering::Acquire) as f64 / count as f64)
                }
            }
            AggregateCell::MinInt(e) | AggregateCell::MaxInt(e) => {
                e.get().map(OutputValue::Int).unwrap_or(OutputValue::Null)
            }
            AggregateCell::MinStr(slot) | AggregateCell::MaxStr(slot) => slot
                .lock()
                .clone()
                .map(OutputValue::Str)
                .unwrap_or(OutputValue::Null),
        }
    }
}

/// Replace `slot` with `candidate` when empty or when `candidate` compares as `wanted`
pub(crate) fn replace_if(slot: &mut Option<String>, candidate: &str, wanted: CmpOrdering) {
    let replace = match slot.as_deref() {
        None => true,
        Some(current) => candidate.cmp(current) == wanted,
    };
    if replace {
        *slot = Some(candidate.to_string());
    }
}
