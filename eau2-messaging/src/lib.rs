//! Typed control messages (§4.2) layered on the length-prefixed transport in `eau2-net`.

mod directory;
mod message;
mod tag;

pub use directory::{decode_directory, encode_directory, NodeAddr};
pub use message::{recv_message, send_message, Message};
pub use tag::Tag;
