//! Gettext catalog handling: PO parsing, completion markers and `.mo` output.

mod markers;
mod mo;
mod po;

pub use markers::{count_markers, MarkerCounts};
pub use mo::{compile_po_file, parse_mo, render_mo, write_mo, MO_MAGIC};
pub use po::{parse_catalog, read_catalog, CatalogEntry};
