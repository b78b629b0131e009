//! Server module for building the order HTTP server
//!
//! `ServerBuilder` wires an `OrderStore` into the service, registers the
//! health and order routes and adds the request-id and tracing layers.

pub mod builder;
pub mod exposure;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use handlers::{DataResponse, OrderAppState};
