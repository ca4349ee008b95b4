//! Data Properties - scalar fields of a structural type

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MetadataError;

/// Declared value kind of a data property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DataType {
    String,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    Boolean,
    Byte,
    Binary,
    DateTime,
    DateTimeOffset,
    Time,
    Guid,
    #[default]
    Undefined,
}

impl DataType {
    const ALL: [DataType; 15] = [
        Self::String,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Single,
        Self::Double,
        Self::Decimal,
        Self::Boolean,
        Self::Byte,
        Self::Binary,
        Self::DateTime,
        Self::DateTimeOffset,
        Self::Time,
        Self::Guid,
        Self::Undefined,
    ];

    /// Symbolic name used in metadata documents
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Single => "Single",
            Self::Double => "Double",
            Self::Decimal => "Decimal",
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Binary => "Binary",
            Self::DateTime => "DateTime",
            Self::DateTimeOffset => "DateTimeOffset",
            Self::Time => "Time",
            Self::Guid => "Guid",
            Self::Undefined => "Undefined",
        }
    }

    /// Returns true for integral and floating point kinds
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Single
                | Self::Double
                | Self::Decimal
                | Self::Byte
        )
    }

    /// Returns true for the date and time kinds
    pub fn is_temporal(self) -> bool {
        matches!(self, Self::DateTime | Self::DateTimeOffset | Self::Time)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|data_type| data_type.as_str() == s)
            .ok_or_else(|| MetadataError::decode(format!("unknown dataType '{}'", s)))
    }
}

/// Optimistic concurrency participation of a data property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConcurrencyMode {
    /// The property takes no part in conflict detection
    #[default]
    None,
    /// The property value is compared on save to detect conflicts
    Fixed,
}

impl ConcurrencyMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Fixed => "Fixed",
        }
    }
}

impl fmt::Display for ConcurrencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConcurrencyMode {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(Self::None),
            "Fixed" => Ok(Self::Fixed),
            other => Err(MetadataError::decode(format!(
                "unknown concurrencyMode '{}'",
                other
            ))),
        }
    }
}

/// A named scalar slot on a structural type
#[derive(Debug, Clone, PartialEq)]
pub struct DataProperty {
    name: String,
    data_type: DataType,
    is_nullable: bool,
    is_part_of_key: bool,
    is_foreign_key: bool,
    concurrency_mode: ConcurrencyMode,
    max_length: Option<u32>,
    default_value: Option<serde_json::Value>,
    is_unmapped: bool,
}

impl DataProperty {
    /// Create a nullable, non-key data property
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            is_nullable: true,
            is_part_of_key: false,
            is_foreign_key: false,
            concurrency_mode: ConcurrencyMode::None,
            max_length: None,
            default_value: None,
            is_unmapped: false,
        }
    }

    /// Mark the property as part of the entity key
    ///
    /// Key properties are never nullable.
    pub fn with_part_of_key(mut self, is_part_of_key: bool) -> Self {
        self.is_part_of_key = is_part_of_key;
        if is_part_of_key {
            self.is_nullable = false;
        }
        self
    }

    pub fn with_foreign_key(mut self, is_foreign_key: bool) -> Self {
        self.is_foreign_key = is_foreign_key;
        self
    }

    pub fn with_concurrency_mode(mut self, concurrency_mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = concurrency_mode;
        self
    }

    pub fn with_nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_default_value(mut self, default_value: serde_json::Value) -> Self {
        self.default_value = Some(default_value);
        self
    }

    /// Mark the property as client-only (not persisted by the server)
    pub fn with_unmapped(mut self, is_unmapped: bool) -> Self {
        self.is_unmapped = is_unmapped;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.is_nullable
    }

    pub fn is_part_of_key(&self) -> bool {
        self.is_part_of_key
    }

    pub fn is_foreign_key(&self) -> bool {
        self.is_foreign_key
    }

    pub fn concurrency_mode(&self) -> ConcurrencyMode {
        self.concurrency_mode
    }

    /// Returns true if the property takes part in optimistic concurrency checks
    pub fn is_concurrency_property(&self) -> bool {
        self.concurrency_mode == ConcurrencyMode::Fixed
    }

    pub fn max_length(&self) -> Option<u32> {
        self.max_length
    }

    pub fn default_value(&self) -> Option<&serde_json::Value> {
        self.default_value.as_ref()
    }

    pub fn is_unmapped(&self) -> bool {
        self.is_unmapped
    }
}
