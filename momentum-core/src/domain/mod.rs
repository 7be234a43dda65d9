//! Domain types shared by every stage of the pipeline.

pub mod bar;

pub use bar::{validate_series, Bar, BarError};

/// Symbol type alias
pub type Symbol = String;
