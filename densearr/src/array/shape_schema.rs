//! Schema derivation.

use serde::{Deserialize, Serialize};

use super::{ArrayError, DataType};

/// The name of the data field.
pub const DATA_FIELD_NAME: &str = "data";

/// Return the name of the coordinate field of dimension `index`.
#[must_use]
pub fn dimension_field_name(index: usize) -> String {
    format!("dim_{index}")
}

/// A requested array shape.
///
/// Entries may be unset only if the storage engine supports growable domains.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct ArrayShapeRequest(pub Vec<Option<u64>>);

impl From<Vec<u64>> for ArrayShapeRequest {
    fn from(shape: Vec<u64>) -> Self {
        Self(shape.into_iter().map(Some).collect())
    }
}

impl From<&[u64]> for ArrayShapeRequest {
    fn from(shape: &[u64]) -> Self {
        Self(shape.iter().copied().map(Some).collect())
    }
}

impl<const N: usize> From<[u64; N]> for ArrayShapeRequest {
    fn from(shape: [u64; N]) -> Self {
        Self(shape.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<u64>>> for ArrayShapeRequest {
    fn from(shape: Vec<Option<u64>>) -> Self {
        Self(shape)
    }
}

impl<const N: usize> From<[Option<u64>; N]> for ArrayShapeRequest {
    fn from(shape: [Option<u64>; N]) -> Self {
        Self(shape.to_vec())
    }
}

/// A schema field.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum SchemaField {
    /// A coordinate field. Coordinates are always `int64` with domain `0..=size-1`.
    Dimension {
        /// The field name.
        name: String,
        /// The domain size.
        size: u64,
    },
    /// The data field.
    Data {
        /// The field name.
        name: String,
        /// The element data type.
        data_type: DataType,
    },
}

impl SchemaField {
    /// Return the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Dimension { name, .. } | Self::Data { name, .. } => name,
        }
    }

    /// Return the domain size of a coordinate field, or [`None`] for the data field.
    #[must_use]
    pub const fn dimension_size(&self) -> Option<u64> {
        match self {
            Self::Dimension { size, .. } => Some(*size),
            Self::Data { .. } => None,
        }
    }

    /// Return the field data type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Dimension { .. } => DataType::Int64,
            Self::Data { data_type, .. } => *data_type,
        }
    }
}

/// The schema of a dense array.
///
/// One `int64` coordinate field per dimension followed by one data field.
/// The schema is derived once at creation and never changes.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ArraySchema {
    fields: Vec<SchemaField>,
}

impl ArraySchema {
    /// Derive a schema from a requested `shape` and `data_type`.
    ///
    /// An unset shape entry is allowed only if `growable_domains` is true, and is given the largest `int64` domain.
    ///
    /// # Errors
    /// Returns [`ArrayError::Type`] if `data_type` has a size of zero bytes.
    /// Returns [`ArrayError::Value`] if the shape has no dimensions, any size is zero or exceeds the `int64` domain,
    /// every entry is unset, or an entry is unset without `growable_domains`.
    pub fn derive(
        shape: &ArrayShapeRequest,
        data_type: DataType,
        growable_domains: bool,
    ) -> Result<Self, ArrayError> {
        if data_type.size() == 0 {
            return Err(ArrayError::Type(format!(
                "data type {data_type} has a size of zero bytes"
            )));
        }
        let shape = &shape.0;
        if shape.is_empty() {
            return Err(ArrayError::Value(
                "an array must have at least one dimension".to_string(),
            ));
        }
        if shape.iter().all(Option::is_none) {
            return Err(ArrayError::Value(format!(
                "the shape {shape:?} has no set dimension sizes"
            )));
        }
        let max_size = i64::MAX.unsigned_abs();
        let mut fields = shape
            .iter()
            .enumerate()
            .map(|(index, size)| {
                let size = match size {
                    Some(0) => {
                        return Err(ArrayError::Value(format!(
                            "dimension {index} of shape {shape:?} has size zero"
                        )));
                    }
                    Some(size) if *size > max_size => {
                        return Err(ArrayError::Value(format!(
                            "dimension {index} of shape {shape:?} exceeds the int64 domain"
                        )));
                    }
                    Some(size) => *size,
                    None if growable_domains => max_size,
                    None => {
                        return Err(ArrayError::Value(format!(
                            "dimension {index} of shape {shape:?} is unset and the storage engine does not support growable domains"
                        )));
                    }
                };
                Ok(SchemaField::Dimension {
                    name: dimension_field_name(index),
                    size,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        fields.push(SchemaField::Data {
            name: DATA_FIELD_NAME.to_string(),
            data_type,
        });
        Ok(Self { fields })
    }

    /// Return the fields: the coordinate fields then the data field.
    #[must_use]
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Return the dimensionality.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.fields.len().saturating_sub(1)
    }

    /// Return the shape.
    #[must_use]
    pub fn shape(&self) -> Vec<u64> {
        self.fields
            .iter()
            .filter_map(SchemaField::dimension_size)
            .collect()
    }

    /// Return the element data type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.fields
            .last()
            .map_or(DataType::Int64, SchemaField::data_type)
    }

    /// Return the coordinate fields.
    pub fn dimensions(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields
            .iter()
            .filter(|field| field.dimension_size().is_some())
    }

    /// Validate a schema read back from storage.
    pub(crate) fn validate(&self) -> Result<(), String> {
        let (data, dimensions) = self
            .fields
            .split_last()
            .ok_or_else(|| "schema has no fields".to_string())?;
        if dimensions.is_empty() {
            return Err("schema has no dimensions".to_string());
        }
        if !matches!(data, SchemaField::Data { .. })
            || dimensions
                .iter()
                .any(|field| !matches!(field, SchemaField::Dimension { .. }))
        {
            return Err("schema fields are out of order".to_string());
        }
        Ok(())
    }
}
