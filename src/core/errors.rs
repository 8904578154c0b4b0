// src/core/errors.rs

//! Defines the primary error type for the entire application.

use crate::core::world::WorldError;
use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug)]
pub enum MudstoneError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    /// The byte stream violated the framing contract (e.g., a header length
    /// below the 4-byte minimum). Fatal to the offending connection only.
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// A message body could not be decoded as the JSON record its header
    /// kind promised. Treated the same as a framing violation.
    #[error("Malformed payload: {0}")]
    BadPayload(String),

    /// A message would not fit the 16-bit total-length field.
    #[error("Message of {0} bytes exceeds the 65535-byte wire limit")]
    MessageTooLarge(usize),

    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// The connection's writer task is gone; nothing further can be sent.
    #[error("Outbound queue closed")]
    QueueClosed,

    #[error("You are not logged in.")]
    NotLoggedIn,

    #[error("{0}")]
    BadArguments(String),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl MudstoneError {
    /// True when the error must tear the connection down; false when it is an
    /// application-level failure that is answered with a `ServerMessage`
    /// reply while the connection stays open.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            MudstoneError::Io(_)
                | MudstoneError::Protocol(_)
                | MudstoneError::BadPayload(_)
                | MudstoneError::QueueClosed
        )
    }
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
// We wrap it in an Arc to allow for cheap, shared cloning.
impl Clone for MudstoneError {
    fn clone(&self) -> Self {
        match self {
            MudstoneError::Io(e) => MudstoneError::Io(Arc::clone(e)),
            MudstoneError::Protocol(s) => MudstoneError::Protocol(s.clone()),
            MudstoneError::BadPayload(s) => MudstoneError::BadPayload(s.clone()),
            MudstoneError::MessageTooLarge(n) => MudstoneError::MessageTooLarge(*n),
            MudstoneError::Encoding(s) => MudstoneError::Encoding(s.clone()),
            MudstoneError::QueueClosed => MudstoneError::QueueClosed,
            MudstoneError::NotLoggedIn => MudstoneError::NotLoggedIn,
            MudstoneError::BadArguments(s) => MudstoneError::BadArguments(s.clone()),
            MudstoneError::World(e) => MudstoneError::World(e.clone()),
            MudstoneError::Internal(s) => MudstoneError::Internal(s.clone()),
        }
    }
}

impl From<std::io::Error> for MudstoneError {
    fn from(e: std::io::Error) -> Self {
        MudstoneError::Io(Arc::new(e))
    }
}
