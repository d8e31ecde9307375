use eau2_errors::CodecError;

/// The raw, untyped fields of a control message header (§4.2, §6):
/// `<sender_ip>:<sender_port>;<tag>;<payload>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawMessage {
    pub sender_ip: String,
    pub sender_port: u16,
    pub tag: u8,
    pub payload: String,
}

/// Encodes the header. `payload` may be empty; the trailing separator is retained regardless.
pub fn encode_message(msg: &RawMessage) -> String {
    format!(
        "{}:{};{};{}",
        msg.sender_ip, msg.sender_port, msg.tag, msg.payload
    )
}

/// Decodes the header. The payload is everything after the second `;`, so it may itself contain
/// `;` or `~` — only the sender address and tag fields are tokenized.
pub fn decode_message(text: &str) -> Result<RawMessage, CodecError> {
    let (host_port, rest) = text
        .split_once(':')
        .ok_or_else(|| CodecError::MalformedMessage(text.to_string()))?;
    let (port_str, rest) = rest
        .split_once(';')
        .ok_or_else(|| CodecError::MalformedMessage(text.to_string()))?;
    let (tag_str, payload) = rest
        .split_once(';')
        .ok_or_else(|| CodecError::MalformedMessage(text.to_string()))?;

    let sender_port: u16 = port_str
        .parse()
        .map_err(|_| CodecError::MalformedMessage(text.to_string()))?;
    let tag: u8 = tag_str
        .parse()
        .map_err(|_| CodecError::MalformedMessage(text.to_string()))?;

    Ok(RawMessage {
        sender_ip: host_port.to_string(),
        sender_port,
        tag,
        payload: payload.to_string(),
    })
}

/// Encodes a PUT payload: `<key_name>~<value_bytes>` (§6).
pub fn encode_put_payload(key_name: &str, value_bytes: &str) -> String {
    format!("{key_name}~{value_bytes}")
}

/// Decodes a PUT payload. Only the first `~` is a delimiter; `value_bytes` may itself contain
/// `~` (e.g. a nested data-frame encoding).
pub fn decode_put_payload(payload: &str) -> Result<(String, String), CodecError> {
    payload
        .split_once('~')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| CodecError::MalformedMessage(payload.to_string()))
}
