//! Text-framed encode/decode for scalars, arrays, columns, schemas, and control messages (§6).

mod array;
mod message_codec;
mod scalar;
mod schema_codec;

pub use array::{decode_array, decode_bool_array, decode_string_list, encode_array, encode_bool_array, encode_string_list};
pub use message_codec::{decode_message, decode_put_payload, encode_message, encode_put_payload, RawMessage};
pub use scalar::{decode_scalar, encode_scalar, validate_string_value};
pub use schema_codec::{decode_schema, encode_schema};
