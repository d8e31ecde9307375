use eau2_errors::CodecError;
use eau2_value::{CellType, Schema};

/// Encodes a schema as `<types>;<col_names>;<row_names>` (§6). Column/row names are themselves
/// comma-separated string arrays; an absent name is encoded as an empty field.
pub fn encode_schema(schema: &Schema) -> String {
    let types: String = schema.types().iter().map(|t| t.tag()).collect::<String>();
    let types = types
        .chars()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let col_names = schema
        .col_names()
        .iter()
        .map(|n| n.clone().unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",");
    let row_names = schema
        .row_names()
        .iter()
        .map(|n| n.clone().unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",");
    format!("{types};{col_names};{row_names}")
}

/// Decodes a schema from its `<types>;<col_names>;<row_names>` encoding. Row names decode to an
/// empty set of rows (row count is tracked separately by row-append operations, not restored
/// here); callers that need populated rows append them after decoding.
pub fn decode_schema(text: &str) -> Result<Schema, CodecError> {
    let parts: Vec<&str> = text.splitn(3, ';').collect();
    if parts.len() != 3 {
        return Err(CodecError::MalformedSchema(parts.len()));
    }
    let types: Vec<CellType> = if parts[0].is_empty() {
        Vec::new()
    } else {
        parts[0]
            .split(',')
            .map(|tok| {
                let c = tok
                    .chars()
                    .next()
                    .ok_or_else(|| CodecError::InvalidTypeTag('\0'))?;
                CellType::from_tag(c).ok_or(CodecError::InvalidTypeTag(c))
            })
            .collect::<Result<_, _>>()?
    };

    let col_names: Vec<Option<String>> = if parts[1].is_empty() && types.is_empty() {
        Vec::new()
    } else if parts[1].is_empty() {
        vec![None; types.len()]
    } else {
        parts[1]
            .split(',')
            .map(|tok| if tok.is_empty() { None } else { Some(tok.to_string()) })
            .collect()
    };

    let mut schema = Schema::with_names(types, col_names);

    if !parts[2].is_empty() {
        for tok in parts[2].split(',') {
            schema.add_row(if tok.is_empty() { None } else { Some(tok.to_string()) });
        }
    }

    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_round_trips_without_names() {
        let schema = Schema::new(vec![CellType::I32, CellType::Str]);
        let text = encode_schema(&schema);
        assert_eq!(text, "I,S;,;");
        let decoded = decode_schema(&text).unwrap();
        assert_eq!(decoded.types(), schema.types());
        assert_eq!(decoded.width(), 2);
    }

    #[test]
    fn schema_round_trips_with_names_and_rows() {
        let mut schema = Schema::with_names(
            vec![CellType::F32, CellType::Bool],
            vec![Some("price".to_string()), None],
        );
        schema.add_row(Some("r0".to_string()));
        schema.add_row(None);
        let text = encode_schema(&schema);
        let decoded = decode_schema(&text).unwrap();
        assert_eq!(decoded.col_name(0), Some("price"));
        assert_eq!(decoded.col_name(1), None);
        assert_eq!(decoded.row_names()[0].as_deref(), Some("r0"));
        assert_eq!(decoded.n_rows(), 2);
    }

    #[test]
    fn empty_schema_round_trips() {
        let schema = Schema::new(vec![]);
        let text = encode_schema(&schema);
        let decoded = decode_schema(&text).unwrap();
        assert_eq!(decoded.width(), 0);
    }
}
