//! Canonical schema constants for structured logging
//!
//! Every event emitted by the mutator uses these keys so log pipelines can
//! index on stable names.

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Tenant and schema identifiers
pub const FIELD_WORKSPACE_ID: &str = "workspace_id";
pub const FIELD_ENTITY_TYPE_KEY: &str = "entity_type_key";
pub const FIELD_RELATIONSHIP_ID: &str = "relationship_id";

// Batch sizes
pub const FIELD_WORKING_SET_LEN: &str = "working_set_len";
pub const FIELD_DEFINITION_COUNT: &str = "definition_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
