use super::DataType;

/// An element error.
#[derive(Clone, Debug, thiserror::Error, Eq, PartialEq)]
pub enum ElementError {
    /// Incompatible element type for data type.
    #[error("incompatible element type {element} for data type {data_type}")]
    IncompatibleElementType {
        /// The Rust element type.
        element: &'static str,
        /// The data type.
        data_type: DataType,
    },
    /// Invalid element value.
    #[error("invalid element value")]
    InvalidElementValue,
}

/// A trait representing an array element type.
pub trait Element: Sized + Clone {
    /// The data type of this element.
    fn data_type() -> DataType;

    /// Validate the data type.
    ///
    /// # Errors
    /// Returns an [`ElementError`] if the data type is incompatible with [`Element`].
    fn validate_data_type(data_type: &DataType) -> Result<(), ElementError> {
        if *data_type == Self::data_type() {
            Ok(())
        } else {
            Err(ElementError::IncompatibleElementType {
                element: std::any::type_name::<Self>(),
                data_type: *data_type,
            })
        }
    }

    /// Convert a vector of elements into bytes.
    fn into_bytes_vec(elements: Vec<Self>) -> Vec<u8>;
}

/// A trait representing an owned array element type.
pub trait ElementOwned: Element {
    /// Convert bytes into a [`Vec<ElementOwned>`].
    ///
    /// # Errors
    /// Returns an [`ElementError`] if the data type is incompatible with [`Element`] or the bytes hold an invalid value.
    fn from_bytes(data_type: &DataType, bytes: &[u8]) -> Result<Vec<Self>, ElementError>;
}

/// Transmute from `Vec<T>` to `Vec<u8>`.
#[must_use]
pub fn transmute_to_bytes_vec<T: bytemuck::NoUninit>(from: Vec<T>) -> Vec<u8> {
    bytemuck::allocation::try_cast_vec(from)
        .unwrap_or_else(|(_err, from)| bytemuck::allocation::pod_collect_to_vec(&from))
}

/// Convert from `&[u8]` to `Vec<T>`.
#[must_use]
pub fn convert_from_bytes_slice<T: bytemuck::Pod>(from: &[u8]) -> Vec<T> {
    bytemuck::allocation::pod_collect_to_vec(from)
}

macro_rules! impl_element_pod {
    ($raw_type:ty, $data_type:expr) => {
        impl Element for $raw_type {
            fn data_type() -> DataType {
                $data_type
            }

            fn into_bytes_vec(elements: Vec<Self>) -> Vec<u8> {
                transmute_to_bytes_vec(elements)
            }
        }

        impl ElementOwned for $raw_type {
            fn from_bytes(data_type: &DataType, bytes: &[u8]) -> Result<Vec<Self>, ElementError> {
                Self::validate_data_type(data_type)?;
                Ok(convert_from_bytes_slice::<Self>(bytes))
            }
        }
    };
}

impl_element_pod!(i8, DataType::Int8);
impl_element_pod!(i16, DataType::Int16);
impl_element_pod!(i32, DataType::Int32);
impl_element_pod!(i64, DataType::Int64);
impl_element_pod!(u8, DataType::UInt8);
impl_element_pod!(u16, DataType::UInt16);
impl_element_pod!(u32, DataType::UInt32);
impl_element_pod!(u64, DataType::UInt64);
impl_element_pod!(half::f16, DataType::Float16);
impl_element_pod!(f32, DataType::Float32);
impl_element_pod!(f64, DataType::Float64);

impl Element for bool {
    fn data_type() -> DataType {
        DataType::Bool
    }

    fn into_bytes_vec(elements: Vec<Self>) -> Vec<u8> {
        elements.into_iter().map(u8::from).collect()
    }
}

impl ElementOwned for bool {
    fn from_bytes(data_type: &DataType, bytes: &[u8]) -> Result<Vec<Self>, ElementError> {
        Self::validate_data_type(data_type)?;
        bytes
            .iter()
            .map(|&byte| match byte {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(ElementError::InvalidElementValue),
            })
            .collect()
    }
}

impl<const N: usize> Element for [u8; N] {
    fn data_type() -> DataType {
        DataType::FixedBytes(N)
    }

    fn validate_data_type(data_type: &DataType) -> Result<(), ElementError> {
        if N > 0 && *data_type == Self::data_type() {
            Ok(())
        } else {
            Err(ElementError::IncompatibleElementType {
                element: std::any::type_name::<Self>(),
                data_type: *data_type,
            })
        }
    }

    fn into_bytes_vec(elements: Vec<Self>) -> Vec<u8> {
        elements.into_iter().flatten().collect()
    }
}

impl<const N: usize> ElementOwned for [u8; N] {
    fn from_bytes(data_type: &DataType, bytes: &[u8]) -> Result<Vec<Self>, ElementError> {
        Self::validate_data_type(data_type)?;
        Ok(bytes
            .chunks_exact(N)
            .map(|chunk| {
                let mut element = [0u8; N];
                element.copy_from_slice(chunk);
                element
            })
            .collect())
    }
}
