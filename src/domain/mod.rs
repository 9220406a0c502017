pub mod command;
pub mod controller;
pub mod envelope;
pub mod event;
pub mod instruction;
pub mod receipt;
pub mod resource;
pub mod tables;

pub use command::{AdvanceArgs, CommandDescriptor, CommandOutcome, StepReport, ADVANCE_OP, STEP_EVENT};
pub use controller::ControllerProfile;
pub use envelope::{EnvelopeBuilder, TransactionEnvelope};
pub use event::EventFrame;
pub use instruction::{Instruction, ResourceBudget};
pub use receipt::{ExecutionReceipt, ExecutionStatus, InvocationRecord};
pub use resource::{Access, ResourceClaim, WorkingSet};
pub use tables::{CompactionTable, TableSet, TableSlot};
