//! Result sink traits and record types
//!
//! This module defines the record written for every work item and the trait
//! interface result sinks implement.

use std::fmt;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write results to {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Column order of the results file
pub const COLUMNS: [&str; 8] = [
    "key",
    "name",
    "contact-email",
    "phone",
    "activity-code",
    "revenue",
    "employee-count",
    "locality",
];

/// One extracted field of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    ContactEmail,
    Phone,
    ActivityCode,
    Revenue,
    EmployeeCount,
    Locality,
}

impl Field {
    /// Every field, in column order
    pub const ALL: [Field; 7] = [
        Field::Name,
        Field::ContactEmail,
        Field::Phone,
        Field::ActivityCode,
        Field::Revenue,
        Field::EmployeeCount,
        Field::Locality,
    ];

    /// Column header for this field
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::ContactEmail => "contact-email",
            Self::Phone => "phone",
            Self::ActivityCode => "activity-code",
            Self::Revenue => "revenue",
            Self::EmployeeCount => "employee-count",
            Self::Locality => "locality",
        }
    }

    /// Whether the field holds free text (as opposed to a number or code)
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Name | Self::ContactEmail | Self::Locality)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// The fixed set of extracted fields; a missing value is an empty string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub name: String,
    pub contact_email: String,
    pub phone: String,
    pub activity_code: String,
    pub revenue: String,
    pub employee_count: String,
    pub locality: String,
}

impl Fields {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::ContactEmail => &self.contact_email,
            Field::Phone => &self.phone,
            Field::ActivityCode => &self.activity_code,
            Field::Revenue => &self.revenue,
            Field::EmployeeCount => &self.employee_count,
            Field::Locality => &self.locality,
        }
    }

    pub fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::ContactEmail => &mut self.contact_email,
            Field::Phone => &mut self.phone,
            Field::ActivityCode => &mut self.activity_code,
            Field::Revenue => &mut self.revenue,
            Field::EmployeeCount => &mut self.employee_count,
            Field::Locality => &mut self.locality,
        }
    }

    /// Sets a field only if it is still empty
    pub fn fill(&mut self, field: Field, value: impl Into<String>) {
        let slot = self.get_mut(field);
        if slot.is_empty() {
            *slot = value.into();
        }
    }

    /// True when no field has a value
    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|f| self.get(*f).is_empty())
    }
}

/// The record produced for one work item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub key: String,
    pub fields: Fields,
}

impl ExtractionResult {
    pub fn new(key: impl Into<String>, fields: Fields) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    /// An all-empty record, written when nothing could be extracted
    pub fn empty(key: impl Into<String>) -> Self {
        Self::new(key, Fields::default())
    }

    pub fn has_data(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Values in column order
    pub fn row(&self) -> Vec<&str> {
        std::iter::once(self.key.as_str())
            .chain(Field::ALL.iter().map(|f| self.fields.get(*f)))
            .collect()
    }
}

/// Trait for result sinks
///
/// A sink receives exactly one call per finished work item and must have
/// made the row durable before returning.
pub trait ResultSink: Send {
    /// Appends one record
    fn append(&mut self, result: &ExtractionResult) -> OutputResult<()>;
}
