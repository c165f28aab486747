//! Declarative table schemas.
//!
//! A [`ResourceSchema`] describes how one resource type is laid out as a table: which columns
//! exist, which schema versions each applies to, how the cell value is obtained and formatted,
//! and which one-to-many relationships are shown as nested rows beneath a record.
//!
//! Schemas are plain `'static` data so they can be reviewed, dumped (they implement
//! `Serialize`), and shared across threads without synchronisation.

use crate::extract::Extractor;
use crate::format::Formatter;
use fhir::{FhirVersion, ResourceType};
use serde::Serialize;

/// Schema versions a column applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Versions {
    /// Every version (`"*"`).
    All,
    /// Only the listed versions.
    Only(&'static [FhirVersion]),
}

impl Versions {
    pub fn includes(self, version: FhirVersion) -> bool {
        match self {
            Versions::All => true,
            Versions::Only(versions) => versions.contains(&version),
        }
    }
}

/// One table column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    /// Header text; empty for spacer columns.
    pub title: &'static str,
    pub versions: Versions,
    pub extractor: Extractor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Formatter>,
    /// Shown when the cell would otherwise be empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<&'static str>,
}

impl ColumnSpec {
    /// A column shown for every version with no formatter or default.
    pub const fn new(title: &'static str, extractor: Extractor) -> Self {
        Self {
            title,
            versions: Versions::All,
            extractor,
            format: None,
            default_value: None,
        }
    }

    /// A column reading the value at `path`.
    pub const fn field(title: &'static str, path: &'static str) -> Self {
        Self::new(title, Extractor::Field { path })
    }

    /// An untitled, always-empty column.
    pub const fn spacer() -> Self {
        Self::new("", Extractor::Blank)
    }

    pub const fn formatted(mut self, format: Formatter) -> Self {
        self.format = Some(format);
        self
    }

    pub const fn or_default(mut self, default_value: &'static str) -> Self {
        self.default_value = Some(default_value);
        self
    }

    pub const fn only(mut self, versions: &'static [FhirVersion]) -> Self {
        self.versions = Versions::Only(versions);
        self
    }

    pub fn applies_to(&self, version: FhirVersion) -> bool {
        self.versions.includes(version)
    }
}

/// How a row's key is derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RowIdentity {
    /// The text at a path of the record (normally `id`).
    Field { path: &'static str },
    /// The record's position among its siblings, combined with the parent key.
    SiblingIndex,
}

/// A one-to-many relationship rendered as rows beneath each parent row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NestedRowSpec {
    /// Path to the child sequence within the parent record.
    pub children: &'static str,
    pub identity: RowIdentity,
    pub columns: &'static [ColumnSpec],
}

/// Table layout for one resource type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ResourceSchema {
    pub resource_type: ResourceType,
    /// Table title.
    pub title: &'static str,
    pub columns: &'static [ColumnSpec],
    #[serde(skip_serializing_if = "no_nested_rows")]
    pub nested: &'static [NestedRowSpec],
    pub identity: RowIdentity,
    /// Style tag applied to every parent row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_style: Option<&'static str>,
}

impl ResourceSchema {
    /// Columns that apply to `version`, in declared order.
    pub fn columns_for(&self, version: FhirVersion) -> impl Iterator<Item = &'static ColumnSpec> {
        applicable(self.columns, version)
    }

    /// Header titles that apply to `version`, in declared order.
    pub fn headers(&self, version: FhirVersion) -> Vec<&'static str> {
        self.columns_for(version).map(|c| c.title).collect()
    }
}

fn no_nested_rows(nested: &&'static [NestedRowSpec]) -> bool {
    nested.is_empty()
}

pub(crate) fn applicable(
    columns: &'static [ColumnSpec],
    version: FhirVersion,
) -> impl Iterator<Item = &'static ColumnSpec> {
    columns.iter().filter(move |c| c.applies_to(version))
}
