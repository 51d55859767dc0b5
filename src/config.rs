//! Compile-time sizing of the endpoint's bounded buffers.
//!
//! Formatting into these buffers never overflows; a chunk that does not fit
//! is dropped whole, so oversized output truncates at a chunk boundary.

/// Longest request URI the client records for blockwise continuation, in
/// bytes. A URI longer than this is rejected up front rather than stored
/// truncated.
pub const URI_MAX: usize = 128;

/// Capacity of formatted response payloads, in bytes.
pub const PAYLOAD_MAX: usize = 512;
