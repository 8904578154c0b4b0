// src/connection/mod.rs

//! Manages the lifecycle of a single client TCP connection: framed reads,
//! dispatch, the serialized outbound path, and teardown.

// Declare the private sub-modules of the `connection` module.
mod guard;
mod handler;
mod writer;

// Publicly re-export the primary types from the sub-modules.
pub use guard::ConnectionGuard;
pub use handler::ConnectionHandler;
pub use writer::WriterTask;
