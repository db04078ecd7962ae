//! HTTP surface of the workflow relay.
//!
//! Hosts the decision action, static assets and the shell middleware
//! (CORS, request logging, panic handling).

pub mod handlers;
mod middleware;
mod routes;
mod types;

pub use routes::build_router;
