use std::net::TcpStream;

use eau2_codec::{decode_message, encode_message, RawMessage};
use eau2_errors::NetError;
use eau2_net::{recv_framed, send_framed};

use crate::tag::Tag;

/// A typed control message: the sender's address, a `Tag`, and a tag-specific payload string
/// (§4.2). `payload` is left as raw text; each protocol layer (directory, PUT/GET) knows how to
/// parse its own tag's payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub sender_ip: String,
    pub sender_port: u16,
    pub tag: Tag,
    pub payload: String,
}

impl Message {
    pub fn new(sender_ip: impl Into<String>, sender_port: u16, tag: Tag, payload: impl Into<String>) -> Self {
        Self {
            sender_ip: sender_ip.into(),
            sender_port,
            tag,
            payload: payload.into(),
        }
    }

    pub fn to_raw(&self) -> RawMessage {
        RawMessage {
            sender_ip: self.sender_ip.clone(),
            sender_port: self.sender_port,
            tag: self.tag.as_u8(),
            payload: self.payload.clone(),
        }
    }

    pub fn from_raw(raw: RawMessage) -> Result<Self, NetError> {
        Ok(Self {
            sender_ip: raw.sender_ip,
            sender_port: raw.sender_port,
            tag: Tag::from_u8(raw.tag)?,
            payload: raw.payload,
        })
    }

    pub fn encode(&self) -> String {
        encode_message(&self.to_raw())
    }

    pub fn decode(text: &str) -> Result<Self, NetError> {
        Message::from_raw(decode_message(text)?)
    }
}

/// Sends `msg` as one length-prefixed frame.
pub fn send_message(stream: &mut TcpStream, msg: &Message) -> Result<(), NetError> {
    send_framed(stream, msg.encode().as_bytes())
}

/// Reads one length-prefixed frame and decodes it as a `Message`.
pub fn recv_message(stream: &mut TcpStream) -> Result<Message, NetError> {
    let bytes = recv_framed(stream)?;
    let text = String::from_utf8_lossy(&bytes);
    Message::decode(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_round_trips_through_text() {
        let msg = Message::new("127.0.0.1", 9000, Tag::Put, "mykey~42");
        let text = msg.encode();
        assert_eq!(Message::decode(&text).unwrap(), msg);
    }
}
