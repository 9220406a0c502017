use crate::foundation::{EngineError, Hash32};

/// Parse a 64-char hex string (optionally `0x`-prefixed) into 32 bytes.
pub fn parse_hex_32bytes(input: &str) -> Result<Hash32, EngineError> {
    let trimmed = input.strip_prefix("0x").unwrap_or(input);
    let decoded = hex::decode(trimmed)?;
    let bytes: Hash32 = decoded
        .try_into()
        .map_err(|_| EngineError::Serialization { format: "hex".to_string(), details: format!("expected 32 bytes, got input of length {}", trimmed.len()) })?;
    Ok(bytes)
}
