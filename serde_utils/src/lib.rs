pub mod decimal_u256;
pub mod prefixed_hex_bytes;
pub mod prefixed_hex_quantity;
pub mod string_or_native;
pub mod string_or_native_sequence;

mod shared;
