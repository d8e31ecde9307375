use eau2_errors::CodecError;
use eau2_value::{CellType, CellValue};

/// Encodes a single scalar as plain text (§6: "Scalars ... are plain text conversions of their
/// value").
pub fn encode_scalar(value: &CellValue) -> String {
    match value {
        CellValue::I32(v) => v.to_string(),
        CellValue::F32(v) => v.to_string(),
        CellValue::Bool(v) => if *v { "1" } else { "0" }.to_string(),
        CellValue::Str(v) => v.clone(),
    }
}

/// Decodes a single scalar of the given type from its plain-text encoding.
pub fn decode_scalar(ty: CellType, text: &str) -> Result<CellValue, CodecError> {
    match ty {
        CellType::I32 => Ok(CellValue::I32(text.parse()?)),
        CellType::F32 => Ok(CellValue::F32(text.parse()?)),
        CellType::Bool => match text {
            "0" => Ok(CellValue::Bool(false)),
            "1" => Ok(CellValue::Bool(true)),
            other => Err(CodecError::InvalidBoolean(other.to_string())),
        },
        CellType::Str => {
            if text.contains(',') {
                return Err(CodecError::ReservedDelimiterInValue(text.to_string()));
            }
            Ok(CellValue::Str(text.to_string()))
        }
    }
}

/// Validates that a string value may be safely embedded in the comma-separated wire format
/// (§6: "Strings in columns are forbidden from containing `,`").
pub fn validate_string_value(value: &str) -> Result<(), CodecError> {
    if value.contains(',') {
        return Err(CodecError::ReservedDelimiterInValue(value.to_string()));
    }
    Ok(())
}
