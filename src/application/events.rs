//! Merges the two event encodings of one execution receipt.

use crate::domain::event::EventFrame;
use crate::domain::receipt::ExecutionReceipt;
use crate::foundation::Address;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

/// Result of decoding one receipt against a requested name set. Missing and
/// extra names are diagnostics; decoding itself cannot fail.
#[derive(Clone, Debug, Default)]
pub struct DecodedEvents {
    pub found: BTreeMap<String, EventFrame>,
    pub missing: BTreeSet<String>,
    pub extra: BTreeSet<String>,
}

impl DecodedEvents {
    pub fn get(&self, name: &str) -> Option<&EventFrame> {
        self.found.get(name)
    }
}

/// Decodes events from a receipt's two encodings.
///
/// Path A scans broadcast log lines for tagged frames and stops at the first
/// non-matching entry, so frames behind ordinary log output are invisible to
/// it. Path B scans nested invocation records addressed to the program's
/// self-invocation authority. A name found via either path counts as found;
/// when both carry it, the invocation path wins. The paths are not
/// cross-checked.
#[derive(Clone, Debug)]
pub struct EventDecoder {
    authority: Address,
}

impl EventDecoder {
    pub fn new(authority: Address) -> Self {
        Self { authority }
    }

    pub fn decode(&self, receipt: &ExecutionReceipt, requested: &[String]) -> DecodedEvents {
        let mut decoded: BTreeMap<String, EventFrame> = BTreeMap::new();

        for line in &receipt.log_lines {
            match EventFrame::from_log_line(line) {
                Some(frame) => {
                    decoded.insert(frame.name.clone(), frame);
                }
                None => break,
            }
        }

        for record in &receipt.invocations {
            if record.program != self.authority {
                continue;
            }
            if let Some(frame) = EventFrame::from_invocation_data(&record.data) {
                decoded.insert(frame.name.clone(), frame);
            }
        }

        let requested: BTreeSet<&str> = requested.iter().map(String::as_str).collect();
        let mut result = DecodedEvents::default();
        for (name, frame) in decoded {
            if requested.contains(name.as_str()) {
                result.found.insert(name, frame);
            } else {
                result.extra.insert(name);
            }
        }
        for name in requested {
            if !result.found.contains_key(name) {
                result.missing.insert(name.to_string());
            }
        }

        if !result.missing.is_empty() {
            // Some events are conditionally emitted; absence is not an error.
            warn!(
                "partial event decode missing={:?} found={} extra={}",
                result.missing,
                result.found.len(),
                result.extra.len()
            );
        }
        if !result.extra.is_empty() {
            debug!("unrequested events decoded extra={:?}", result.extra);
        }
        result
    }
}
