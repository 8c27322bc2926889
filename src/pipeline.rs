//! The run as a sequence of pure stages: load, normalize, project and
//! filter, join, compute, rank.

use std::path::Path;

use tracing::info;

use crate::config::{FootprintConfig, InputPaths};
use crate::error::Result;
use crate::impact::compute_impacts;
use crate::join::*;
use crate::loader::{load_csv, Table};
use crate::normalize::normalize_country_code;
use crate::rank::{rank_all, Ranking};
use crate::records::FootprintRecord;

/// Native country-code column of the GLOBIO tables (crops, country specs).
pub const GLOBIO_COUNTRY_CODE: &str = "globio_country_code";
/// Native country-code column of the FAOSTAT tables (production, area).
pub const FAOSTAT_COUNTRY_CODE: &str = "Area Code (M49)";

/// The four source tables with their country codes normalized.
#[derive(Debug)]
pub struct Inputs {
    pub crops: Table,
    pub country_specs: Table,
    pub production: Table,
    pub area: Table,
}

#[derive(Debug)]
pub struct FootprintReport {
    pub records: Vec<FootprintRecord>,
    pub rankings: Vec<Ranking>,
}

fn load_normalized(path: &Path, code_column: &str) -> Result<Table> {
    normalize_country_code(load_csv(path)?, code_column)
}

pub fn load_inputs(paths: &InputPaths) -> Result<Inputs> {
    Ok(Inputs {
        crops: load_normalized(&paths.crops, GLOBIO_COUNTRY_CODE)?,
        country_specs: load_normalized(&paths.country_specs, GLOBIO_COUNTRY_CODE)?,
        production: load_normalized(&paths.production, FAOSTAT_COUNTRY_CODE)?,
        area: load_normalized(&paths.area, FAOSTAT_COUNTRY_CODE)?,
    })
}

/// Filter, join and derive the impact table from normalized inputs.
pub fn footprint_records(inputs: &Inputs, commodity: &str) -> Result<Vec<FootprintRecord>> {
    let factors = filter_commodity(project_impact_factors(&inputs.crops)?, commodity);
    let production = project_production(&inputs.production)?;
    let area = project_area(&inputs.area)?;
    let specs = project_country_specs(&inputs.country_specs)?;

    let joined = join_tables(factors, &production, &area, &specs);
    Ok(compute_impacts(&joined))
}

pub fn run(cfg: &FootprintConfig) -> Result<FootprintReport> {
    info!(commodity = %cfg.commodity, year = cfg.year, "starting footprint run");

    let inputs = load_inputs(&cfg.inputs)?;
    let records = footprint_records(&inputs, &cfg.commodity)?;
    let rankings = rank_all(&records, cfg.output.top_n);

    info!(rows = records.len(), "footprint table ready");
    Ok(FootprintReport { records, rankings })
}
