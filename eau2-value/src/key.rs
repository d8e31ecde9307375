use std::fmt;

use eau2_errors::CodecError;

/// Characters forbidden in a key name because they re-tokenize the wire formats that use them
/// as delimiters (§3, §6).
const RESERVED: [char; 3] = [',', ';', '~'];
const RESERVED_HOST_DELIM: char = ':';

/// A pair of (name, home_node) with value semantics (§3: "Keys have value semantics; equality is
/// structural").
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key {
    name: String,
    home_node: usize,
}

impl Key {
    /// Builds a key, rejecting names that are empty or contain a reserved delimiter.
    pub fn new(name: impl Into<String>, home_node: usize) -> Result<Key, CodecError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CodecError::EmptyKeyName);
        }
        if name.contains(RESERVED_HOST_DELIM) || name.chars().any(|c| RESERVED.contains(&c)) {
            return Err(CodecError::ReservedDelimiterInKeyName(name));
        }
        Ok(Key { name, home_node })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn home_node(&self) -> usize {
        self.home_node
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.home_node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_reserved_delimiters() {
        assert!(Key::new("a,b", 0).is_err());
        assert!(Key::new("a;b", 0).is_err());
        assert!(Key::new("a~b", 0).is_err());
        assert!(Key::new("a:b", 0).is_err());
        assert!(Key::new("", 0).is_err());
    }

    #[test]
    fn accepts_plain_names() {
        let k = Key::new("triv", 0).unwrap();
        assert_eq!(k.name(), "triv");
        assert_eq!(k.home_node(), 0);
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(Key::new("x", 1).unwrap(), Key::new("x", 1).unwrap());
        assert_ne!(Key::new("x", 1).unwrap(), Key::new("x", 2).unwrap());
    }
}
