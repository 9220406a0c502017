//! Execution receipts and the known remote failure-code table.

use crate::foundation::{Address, EngineError};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ExecutionStatus {
    Success,
    Failed { code: u32 },
}

/// One nested invocation observed while the call executed. Records addressed
/// to the program's self-invocation authority carry re-encoded event frames.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct InvocationRecord {
    pub program: Address,
    pub data: Vec<u8>,
}

/// Full execution result of one confirmed call. Opaque beyond what the
/// event decoder extracts.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct ExecutionReceipt {
    pub log_lines: Vec<String>,
    pub invocations: Vec<InvocationRecord>,
    pub status: ExecutionStatus,
}

impl ExecutionReceipt {
    pub fn success(log_lines: Vec<String>, invocations: Vec<InvocationRecord>) -> Self {
        Self { log_lines, invocations, status: ExecutionStatus::Success }
    }

    pub fn failed(code: u32) -> Self {
        Self { log_lines: Vec::new(), invocations: Vec::new(), status: ExecutionStatus::Failed { code } }
    }

    pub fn failure_code(&self) -> Option<u32> {
        match self.status {
            ExecutionStatus::Success => None,
            ExecutionStatus::Failed { code } => Some(code),
        }
    }
}

/// One entry of the known remote failure-code table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FailureInfo {
    pub code: u32,
    pub label: &'static str,
    pub message: &'static str,
}

/// Failure codes the remote program is known to report. Codes outside this
/// table still surface, carrying their numeric value and no label.
pub const FAILURE_TABLE: &[FailureInfo] = &[
    FailureInfo { code: 6000, label: "sequence_mismatch", message: "step applied against a stale sequence index" },
    FailureInfo { code: 6001, label: "command_unavailable", message: "no queued command to advance" },
    FailureInfo { code: 6002, label: "working_set_mismatch", message: "call resources do not cover the declared step set" },
    FailureInfo { code: 6003, label: "pricing_stale", message: "pricing sources older than the freshness bound" },
    FailureInfo { code: 6004, label: "table_capacity_exceeded", message: "compaction table cannot hold the appended addresses" },
    FailureInfo { code: 6005, label: "unauthorized_authority", message: "signer is not the expected authority" },
];

pub fn lookup_failure(code: u32) -> Option<&'static FailureInfo> {
    FAILURE_TABLE.iter().find(|info| info.code == code)
}

/// Translate a remote-reported failure code into a typed error, carrying
/// the code unchanged and a label when the table knows it.
pub fn execution_error(code: u32) -> EngineError {
    EngineError::Execution { code, label: lookup_failure(code).map(|info| info.label) }
}
