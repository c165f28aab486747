//! # Visualizer Core
//!
//! Turns FHIR clinical records into display-ready tables and a patient summary.
//!
//! This crate contains the pure projection logic:
//! - declarative per-resource table schemas, gated by schema version
//! - value extraction and display formatting (dates, numbers, codings, periods, durations)
//! - the projection engine producing keyed rows with nested child rows
//! - resource type dispatch and the patient summary
//! - runtime configuration and record file loading
//!
//! **No presentation concerns**: painting tables to a terminal belongs in the `fhir-viz` binary.
//!
//! Every cell is computed best-effort. A missing or malformed value empties that one cell (or
//! shows the column default); it never fails the row or the table.

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod format;
pub mod input;
pub mod patient;
pub mod projection;
pub mod registry;
pub mod schema;

pub use config::VizConfig;
pub use dispatch::{dispatch, dispatch_strict, render, render_record_set, Renderer, TableView, View};
pub use error::{ExtractionFailure, FormatError, VizError, VizResult};
pub use extract::Extractor;
pub use format::Formatter;
pub use input::load_record_set;
pub use patient::{summarize, Geolocation, PatientSummary};
pub use projection::{cell_value, project, Projection, RenderedRow};
pub use registry::{schema_for, schemas};
pub use schema::{ColumnSpec, NestedRowSpec, ResourceSchema, RowIdentity, Versions};
