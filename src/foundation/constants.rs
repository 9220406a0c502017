//! Engine-wide constants.

/// Hard ceiling on the number of distinct resources one call may touch.
///
/// The remote protocol rejects envelopes above this; the engine validates
/// merged working sets against it before submission instead.
pub const RESOURCE_CEILING: usize = 32;

/// Resources reserved by a table-extend call itself (fee payer, table
/// program, table, self-invocation authority, system resource).
pub const TABLE_EXTEND_OVERHEAD: usize = 5;

/// Candidate addresses appended per table-extend call.
pub const TABLE_EXTEND_CHUNK: usize = RESOURCE_CEILING - TABLE_EXTEND_OVERHEAD;

/// Length of the leading operation tag on instruction payloads.
pub const OP_TAG_LEN: usize = 8;

/// Length of the leading discriminant on re-encoded event payloads carried
/// inside self-invocation records.
pub const EVENT_REENCODE_TAG_LEN: usize = 8;

/// Text tag marking an event frame embedded in a broadcast log line.
pub const EVENT_LOG_TAG: &str = "event:";

/// Default bound on orchestrated calls per command run.
pub const DEFAULT_ITERATION_CAP: u32 = 24;
