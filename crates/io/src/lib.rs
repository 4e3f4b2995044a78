//! `velostart-io` — everything that touches the filesystem or a database:
//! catalog loading, startlist XML export, non-destructive database
//! mutation, the external CDB converter wrapper, and the run pipeline.

pub mod catalog;
pub mod convert;
pub mod mutate;
pub mod pipeline;
pub mod xml;

pub use catalog::{load_catalog_csv, load_catalog_sqlite};
pub use convert::Converter;
pub use mutate::{apply_startlist, MutationOutcome};
pub use pipeline::{run_apply, run_export, ApplyOutcome, ApplyRun, CatalogSource, ExportRun};
pub use xml::write_startlist_xml;
