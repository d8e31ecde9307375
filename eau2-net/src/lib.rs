//! Blocking, length-prefixed TCP transport (§4.1, §5).
//!
//! The cluster's concurrency model is OS threads and blocking I/O, not an async runtime: every
//! node thread blocks on `accept`/`read` and the coordinator is reachable the same way. Framing is
//! a fixed `u64` native-endian length prefix followed by that many payload bytes.

mod listener;
mod stream;

pub use listener::Listener;
pub use stream::{connect, recv_framed, request, send_framed};

/// Frames larger than this are rejected outright; a well-formed control message or a single
/// chunk-sized payload never comes close.
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;
