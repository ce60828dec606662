pub mod entity_type;
pub mod relationship;

pub use entity_type::{ColumnEntry, ColumnKind, EntityType};
pub use relationship::{Cardinality, RelationshipDefinition, RelationshipKind};
