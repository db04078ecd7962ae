//! Decision relay for the workflow service.
//!
//! - Processor: validation and the token-then-decision exchange
//! - Phases: typed state passed between the two outbound calls
//! - Classify: status and transport failure tables

mod classify;
mod phases;
mod processor;

pub use classify::*;
pub use phases::*;
pub use processor::*;
