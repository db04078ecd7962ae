//! Domain types for the workflow relay.
//!
//! Requests, decision codes and the uniform result envelope returned to callers.

mod decision;
mod result;

pub use decision::*;
pub use result::*;
