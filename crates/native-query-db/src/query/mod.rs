//! Query building and clause assembly.
//!
//! This module contains the complete assembly pipeline:
//!
//! - [`field`] - Field specifications and table qualification
//! - [`condition`] - Condition specifications and key normalization
//! - [`join`] - Join declarations, join-clause compilation, and tree flattening
//! - [`clause`] - Assembled clauses and their replay onto a sink
//! - [`builder`] - The root [`Query`] builder

pub mod builder;
pub mod clause;
pub mod condition;
pub mod field;
pub mod join;

pub use builder::{GroupSpec, OrderSpec, Query};
pub use clause::{Clause, ClauseSet};
pub use condition::{normalize, Argument, Condition, ConditionMap, Key};
pub use field::{qualify, qualify_name, AliasMap, FieldSpec, Qualified};
pub use join::{flatten, DirectOverride, IndirectOverride, Join, JoinClause, JoinContribution, JoinKind};
