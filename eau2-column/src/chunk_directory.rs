use eau2_codec::{decode_array, encode_array};
use eau2_errors::CodecError;
use eau2_value::CellValue;

/// A column's persisted identity: how many logical cells it holds, the identity used to derive
/// further chunk keys if the column grows after being read back, and which KV keys its value and
/// missing-bit chunks live under. This is what gets published as a distributed data frame's
/// per-column payload — the chunks themselves already live in the KV store under these keys, so
/// the directory is the only thing that needs to travel with the frame (§3, §6).
///
/// Encoded via the same array codec the wire format already defines for columns, typed as `Str`,
/// with tokens ordered `<column_id>, <length>, <chunk_key_0>, …, <chunk_key_{n-1}>,
/// <missing_key_0>, …, <missing_key_{n-1}>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkDirectory {
    pub column_id: String,
    pub length: usize,
    pub chunk_keys: Vec<String>,
    pub missing_keys: Vec<String>,
}

impl ChunkDirectory {
    pub fn encode(&self) -> String {
        let mut tokens = vec![
            CellValue::Str(self.column_id.clone()),
            CellValue::Str(self.length.to_string()),
        ];
        tokens.extend(self.chunk_keys.iter().cloned().map(CellValue::Str));
        tokens.extend(self.missing_keys.iter().cloned().map(CellValue::Str));
        // Column ids and chunk key names are pre-validated delimiter-free identifiers, so this
        // never fails.
        encode_array(&tokens).expect("chunk directory tokens are always delimiter-free")
    }

    pub fn decode(text: &str) -> Result<Self, CodecError> {
        let values = decode_array(eau2_value::CellType::Str, text)?;
        let mut tokens = values.into_iter().map(|v| match v {
            CellValue::Str(s) => s,
            _ => unreachable!("decode_array(Str, ..) only yields Str values"),
        });

        let column_id = tokens.next().ok_or(CodecError::MalformedSchema(0))?;

        let length: usize = tokens
            .next()
            .ok_or(CodecError::MalformedSchema(1))?
            .parse()
            .map_err(|_| CodecError::MalformedSchema(1))?;

        let rest: Vec<String> = tokens.collect();
        if rest.len() % 2 != 0 {
            return Err(CodecError::MalformedSchema(rest.len()));
        }
        let num_chunks = rest.len() / 2;
        let chunk_keys = rest[..num_chunks].to_vec();
        let missing_keys = rest[num_chunks..].to_vec();

        Ok(ChunkDirectory {
            column_id,
            length,
            chunk_keys,
            missing_keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_round_trips() {
        let dir = ChunkDirectory {
            column_id: "col-a".to_string(),
            length: 250,
            chunk_keys: vec!["col-a:0".to_string(), "col-a:1".to_string()],
            missing_keys: vec!["col-a:0:missing".to_string(), "col-a:1:missing".to_string()],
        };
        let text = dir.encode();
        assert_eq!(ChunkDirectory::decode(&text).unwrap(), dir);
    }

    #[test]
    fn empty_directory_round_trips() {
        let dir = ChunkDirectory {
            column_id: "col-b".to_string(),
            length: 0,
            chunk_keys: vec![],
            missing_keys: vec![],
        };
        let text = dir.encode();
        assert_eq!(text, "col-b,0");
        assert_eq!(ChunkDirectory::decode(&text).unwrap(), dir);
    }
}
