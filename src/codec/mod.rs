//! JSON interchange codec
//!
//! A self-contained encoder/decoder for the JSON documents exchanged with the
//! completion provider. It depends only on `std`.
//!
//! # Components
//!
//! - **Value**: the immutable tree produced by the decoder
//! - **Node / Table**: a dynamic, shareable table graph accepted by the encoder
//! - **Decoder**: recursive-descent parser with exact line/column diagnostics
//! - **Encoder**: serializer with key-type, number and cycle checks
//!
//! # Examples
//!
//! ```
//! use compbridge::codec::{self, Value};
//!
//! let value = codec::decode(r#"{"values": [{"value": "--help"}]}"#).unwrap();
//! let values = value.get("values").and_then(Value::as_array).unwrap();
//! assert_eq!(values.len(), 1);
//!
//! let text = codec::encode(&value).unwrap();
//! assert_eq!(codec::decode(&text).unwrap(), value);
//! ```

mod decoder;
mod encoder;
mod error;
mod table;
mod value;

pub use decoder::{decode, decode_bytes};
pub use encoder::{Encode, Encoder, encode};
pub use error::{DecodeError, EncodeError};
pub use table::{Node, Table, TableRef};
pub use value::Value;
