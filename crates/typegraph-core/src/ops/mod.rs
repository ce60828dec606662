pub mod mutator;
pub mod store;
pub mod synthesizer;
pub mod working_set;

pub use mutator::{DeleteAction, DeleteRequest, RelationshipMutator};
pub use store::{EntityTypeStore, InMemoryEntityTypeStore};
pub use synthesizer::RelationshipSynthesizer;
pub use working_set::{JournalChange, JournalEntry, WorkingSet};
