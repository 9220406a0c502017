pub mod constants;
pub mod error;
pub mod types;
pub mod util;

pub use error::{EngineError, ErrorCode, Result};
pub use types::{Address, Blockhash, BlockhashRef, Hash32, Signature, TransactionId};
