use eau2_errors::CodecError;

/// Control-message tags (§4.2, §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Ack = 0,
    Nack = 1,
    Register = 2,
    Directory = 3,
    Shutdown = 4,
    Put = 5,
    Get = 6,
}

impl Tag {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(raw: u8) -> Result<Self, CodecError> {
        match raw {
            0 => Ok(Tag::Ack),
            1 => Ok(Tag::Nack),
            2 => Ok(Tag::Register),
            3 => Ok(Tag::Directory),
            4 => Ok(Tag::Shutdown),
            5 => Ok(Tag::Put),
            6 => Ok(Tag::Get),
            other => Err(CodecError::UnknownTag(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_variant() {
        for tag in [
            Tag::Ack,
            Tag::Nack,
            Tag::Register,
            Tag::Directory,
            Tag::Shutdown,
            Tag::Put,
            Tag::Get,
        ] {
            assert_eq!(Tag::from_u8(tag.as_u8()).unwrap(), tag);
        }
    }

    #[test]
    fn rejects_unknown_tag() {
        assert!(Tag::from_u8(200).is_err());
    }
}
