use eau2_errors::CodecError;
use eau2_value::{CellType, CellValue};

use crate::scalar::{decode_scalar, encode_scalar, validate_string_value};

/// Encodes a slice of scalars as a comma-separated list (§6: "Arrays — comma-separated scalar
/// encodings; empty array encodes as the empty string").
pub fn encode_array(values: &[CellValue]) -> Result<String, CodecError> {
    for v in values {
        if let CellValue::Str(s) = v {
            validate_string_value(s)?;
        }
    }
    Ok(values.iter().map(encode_scalar).collect::<Vec<_>>().join(","))
}

/// Decodes a comma-separated scalar array of the given type.
pub fn decode_array(ty: CellType, text: &str) -> Result<Vec<CellValue>, CodecError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(',').map(|tok| decode_scalar(ty, tok)).collect()
}

/// Encodes a bit sequence (used for missing-bit chunks, §3: "a parallel missing-bit sequence").
pub fn encode_bool_array(bits: &[bool]) -> String {
    bits.iter()
        .map(|b| if *b { "1" } else { "0" })
        .collect::<Vec<_>>()
        .join(",")
}

pub fn decode_bool_array(text: &str) -> Result<Vec<bool>, CodecError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|tok| match tok {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(CodecError::InvalidBoolean(other.to_string())),
        })
        .collect()
}

/// Encodes a list of plain (delimiter-free) strings, e.g. chunk key names.
pub fn encode_string_list(items: &[String]) -> Result<String, CodecError> {
    for item in items {
        validate_string_value(item)?;
    }
    Ok(items.join(","))
}

pub fn decode_string_list(text: &str) -> Vec<String> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split(',').map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_array_is_empty_string() {
        assert_eq!(encode_array(&[]).unwrap(), "");
        assert_eq!(decode_array(CellType::I32, "").unwrap(), vec![]);
    }

    #[test]
    fn int_array_round_trips() {
        let values: Vec<CellValue> = (0..5).map(CellValue::I32).collect();
        let text = encode_array(&values).unwrap();
        assert_eq!(text, "0,1,2,3,4");
        assert_eq!(decode_array(CellType::I32, &text).unwrap(), values);
    }

    #[test]
    fn bool_array_round_trips() {
        let bits = vec![true, false, true];
        let text = encode_bool_array(&bits);
        assert_eq!(decode_bool_array(&text).unwrap(), bits);
    }

    #[test]
    fn string_list_round_trips() {
        let items = vec!["k0".to_string(), "k1".to_string()];
        let text = encode_string_list(&items).unwrap();
        assert_eq!(decode_string_list(&text), items);
    }
}
