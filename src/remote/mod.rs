//! Remote system access.
//!
//! - Destinations: named connection profiles (base URL + credentials)
//! - Transport: the HTTP seam every outbound call goes through

mod destination;
mod transport;

#[cfg(test)]
pub mod fake;

pub use destination::*;
pub use transport::*;
