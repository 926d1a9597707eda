//! Canonical schema constants for structured logging and events
//!
//! Every log line emitted by the import pipeline uses these keys so that
//! downstream log processing can join on them.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_RUN_ID: &str = "run_id";

// Import identifiers
pub const FIELD_INVENTORY_URL: &str = "inventory_url";
pub const FIELD_BRANCH: &str = "branch";

// Counters
pub const FIELD_ADDED_OR_CHANGED: &str = "added_or_changed";
pub const FIELD_DELETED: &str = "deleted";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
