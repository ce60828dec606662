//! Relationship diff engine.
//!
//! Compares a previous relationship list with an updated one and classifies
//! each relationship as added, removed or modified, with change flags for
//! the modified ones.
//!
//! ## Entry point
//!
//! ```
//! use typegraph_core::diff::{diff, ChangeFlag};
//! use typegraph_core::model::{Cardinality, RelationshipDefinition};
//!
//! let before = RelationshipDefinition::origin("r1", "Manager", "Employee", Cardinality::OneToMany, ["Department"]);
//! let mut after = before.clone();
//! after.cardinality = Cardinality::ManyToMany;
//!
//! let d = diff(&[before], &[after]);
//! assert!(d.modified[0].has(ChangeFlag::CardinalityChanged));
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: output order follows input order; flags are a sorted set.
//! - **Round trip**: `diff(a, a)` is empty for any list `a`.
//! - **Independent target flags**: keys gained and keys lost are reported separately.

pub mod engine;
pub mod human_summary;
pub mod model;

pub use engine::{change_flags, diff};
pub use human_summary::render_human_summary;
pub use model::{ChangeFlag, RelationshipDiff, RelationshipModification};
