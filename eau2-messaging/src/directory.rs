use eau2_errors::CodecError;

/// An advertised `host:port` address (§6: REGISTER/DIRECTORY payloads).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeAddr {
    pub host: String,
    pub port: u16,
}

impl NodeAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    pub fn encode(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn decode(text: &str) -> Result<Self, CodecError> {
        let (host, port) = text
            .rsplit_once(':')
            .ok_or_else(|| CodecError::MalformedMessage(text.to_string()))?;
        let port: u16 = port
            .parse()
            .map_err(|_| CodecError::MalformedMessage(text.to_string()))?;
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

/// Encodes the full roster as the DIRECTORY payload: a comma-separated list of `host:port`
/// entries, in registration order.
pub fn encode_directory(roster: &[NodeAddr]) -> String {
    roster.iter().map(NodeAddr::encode).collect::<Vec<_>>().join(",")
}

pub fn decode_directory(text: &str) -> Result<Vec<NodeAddr>, CodecError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(',').map(NodeAddr::decode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_round_trips() {
        let roster = vec![
            NodeAddr::new("127.0.0.1", 9001),
            NodeAddr::new("127.0.0.1", 9002),
        ];
        let text = encode_directory(&roster);
        assert_eq!(text, "127.0.0.1:9001,127.0.0.1:9002");
        assert_eq!(decode_directory(&text).unwrap(), roster);
    }

    #[test]
    fn empty_directory_round_trips() {
        assert_eq!(encode_directory(&[]), "");
        assert_eq!(decode_directory("").unwrap(), vec![]);
    }
}
