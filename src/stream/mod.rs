//! Resumable schema-driven streaming codec engine.
//!
//! The encoder and decoder walk a schema tree in pre-order, moving
//! primitive leaf values between a lazily-consumed source and a bounded
//! byte buffer. Both are state machines that suspend at exact leaf
//! granularity: a suspended walk records how many leaves of the in-flight
//! record are already committed (the skip counter) and replays past them
//! on the next attempt, so every leaf is transferred exactly once and no
//! leaf encoding is ever split across a block boundary.

pub mod decoder;
pub mod encoder;

pub use decoder::{DecodeOutcome, StreamingDecoder};
pub use encoder::{EncodeOutcome, LeafSource, StreamingEncoder};
