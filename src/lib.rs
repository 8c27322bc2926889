//! Biodiversity footprint of a crop commodity per country.
//!
//! Joins GLOBIO impact factors with FAOSTAT production and harvested area on a
//! zero-padded country code, then derives static and dynamic MSA impacts.

pub mod arrow_converter;
pub mod config;
pub mod error;
pub mod impact;
pub mod join;
pub mod loader;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod rank;
pub mod records;
pub mod writer;

pub use crate::config::{load_config, FootprintConfig};
pub use crate::error::{FootprintError, Result};
pub use crate::pipeline::{run, FootprintReport};
pub use crate::records::FootprintRecord;
