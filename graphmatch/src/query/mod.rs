// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query planning and execution

pub mod engine;
pub mod plan;
pub mod result;

pub use engine::QueryEngine;
pub use plan::{OutputColumn, OutputExpr, PlanShape, QueryPlan};
pub use result::QueryResult;
