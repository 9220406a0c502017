pub mod driver;
pub mod events;
pub mod orchestrator;
pub mod tables;

pub use driver::{CommandLoopDriver, CommandStep, RunOutcome, RunSpec};
pub use events::{DecodedEvents, EventDecoder};
pub use orchestrator::{CallOutcome, CallRequest, TransactionOrchestrator};
pub use tables::TableSession;
