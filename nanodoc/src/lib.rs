// SPDX-License-Identifier: Apache-2.0

//! A document-oriented JSON/MsgPack codec that runs inside a fixed,
//! caller-supplied memory budget.
//!
//! Every parsed value lives in an arena of fixed-size slots addressed by
//! integer indices; strings are deduplicated and reference-counted in a
//! pool that shares the same byte budget. There is no per-value heap
//! allocation, no recursion beyond a configurable nesting limit, and no
//! panic-based control flow: every fallible operation returns [`Error`].
//!
//! ```
//! use nanodoc::{Document, parse_json, to_json_vec};
//!
//! let mut doc = Document::new(1024);
//! parse_json(&mut doc, br#"{"a":[1,2,{"b":true}]}"#.as_slice()).unwrap();
//! assert_eq!(to_json_vec(&doc), br#"{"a":[1,2,{"b":true}]}"#);
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

// Compile-time configuration validation
mod config_check;

mod error;
pub use error::{Error, Result};

mod input;
pub use input::{Reader, SliceReader};

mod output;
pub use output::{CountingWriter, SliceWriter, Writer};

mod arena;
mod strings;

mod variant;
pub use variant::{FloatValue, IntValue, TypedValue, UintValue, ValueType};

mod resource;

mod document;
pub use document::{Document, ValueId};

mod convert;
pub use convert::{FromVariant, IntoVariant, LinkedStr, RawJson};

mod escape;

mod number_format;
mod number_parse;

mod json_parser;
pub use json_parser::{parse_json, parse_json_with, JsonParseOptions};

mod json_serializer;
pub use json_serializer::{
    measure_json, measure_json_pretty, serialize_json, serialize_json_pretty,
    serialize_json_with, to_json_vec, to_json_vec_pretty, JsonSerializeOptions,
};

mod msgpack_parser;
pub use msgpack_parser::{parse_msgpack, parse_msgpack_with, MsgPackParseOptions};

mod msgpack_serializer;
pub use msgpack_serializer::{measure_msgpack, serialize_msgpack, to_msgpack_vec};

/// Default maximum container depth a parser descends into before
/// failing with [`Error::TooDeep`].
pub const DEFAULT_NESTING_LIMIT: usize = 10;
