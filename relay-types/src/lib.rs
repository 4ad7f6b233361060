//! Atomic byte-array and identifier types shared across the relay crates.

#![deny(unsafe_code)]

mod array_types;
mod id;

pub use array_types::{ElemBytes, Hash, ParseBytesError};
pub use id::{Id, IdError};
