//! Element data types.

use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A primitive element data type.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Display, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DataType {
    /// `bool` Boolean.
    #[display("bool")]
    Bool,
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    #[display("int8")]
    Int8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    #[display("int16")]
    Int16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    #[display("int32")]
    Int32,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    #[display("int64")]
    Int64,
    /// `uint8` Integer in `[0, 2^8-1]`.
    #[display("uint8")]
    UInt8,
    /// `uint16` Integer in `[0, 2^16-1]`.
    #[display("uint16")]
    UInt16,
    /// `uint32` Integer in `[0, 2^32-1]`.
    #[display("uint32")]
    UInt32,
    /// `uint64` Integer in `[0, 2^64-1]`.
    #[display("uint64")]
    UInt64,
    /// `float16` IEEE 754 half-precision floating point.
    #[display("float16")]
    Float16,
    /// `float32` IEEE 754 single-precision floating point.
    #[display("float32")]
    Float32,
    /// `float64` IEEE 754 double-precision floating point.
    #[display("float64")]
    Float64,
    /// `fixed_bytes(N)` A fixed-size byte string of `N` bytes.
    #[display("fixed_bytes({_0})")]
    FixedBytes(usize),
}

/// An unsupported data type error.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DataTypeError {
    /// A non-primitive data type.
    #[error("unsupported non-primitive data type {0}")]
    NonPrimitive(String),
    /// An unknown data type name.
    #[error("unknown data type {0}")]
    Unknown(String),
}

impl DataType {
    /// Returns the size in bytes of one element.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 | Self::Float16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
            Self::FixedBytes(size) => *size,
        }
    }
}

impl FromStr for DataType {
    type Err = DataTypeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim();
        let data_type = match name {
            "bool" => Self::Bool,
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint8" => Self::UInt8,
            "uint16" => Self::UInt16,
            "uint32" => Self::UInt32,
            "uint64" => Self::UInt64,
            "float16" | "halffloat" => Self::Float16,
            "float32" | "float" => Self::Float32,
            "float64" | "double" => Self::Float64,
            "string" | "large_string" | "utf8" | "large_utf8" | "binary" | "large_binary" => {
                return Err(DataTypeError::NonPrimitive(name.to_string()));
            }
            _ if ["list<", "large_list<", "struct<", "dictionary<", "map<"]
                .iter()
                .any(|prefix| name.starts_with(prefix))
                || name.starts_with("timestamp[") =>
            {
                return Err(DataTypeError::NonPrimitive(name.to_string()));
            }
            _ => {
                let size = name
                    .strip_prefix("fixed_bytes(")
                    .and_then(|name| name.strip_suffix(')'))
                    .or_else(|| {
                        name.strip_prefix("fixed_size_binary[")
                            .and_then(|name| name.strip_suffix(']'))
                    })
                    .and_then(|size| size.trim().parse::<usize>().ok())
                    .filter(|size| *size > 0)
                    .ok_or_else(|| DataTypeError::Unknown(name.to_string()))?;
                Self::FixedBytes(size)
            }
        };
        Ok(data_type)
    }
}

impl From<DataType> for String {
    fn from(data_type: DataType) -> Self {
        data_type.to_string()
    }
}

impl TryFrom<String> for DataType {
    type Error = DataTypeError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}
