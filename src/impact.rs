use tracing::debug;

use crate::records::{FootprintRecord, ProductionRecord};

/// Round to the nearest integer, ties to even. Non-finite values and values
/// outside the `i64` range become null.
pub fn round_impact(value: f64) -> Option<i64> {
    let rounded = value.round_ties_even();
    // i64::MIN as f64 is exact, i64::MAX as f64 rounds up to 2^63
    (rounded >= i64::MIN as f64 && rounded < i64::MAX as f64).then_some(rounded as i64)
}

/// Sum the per-tonne factors, scale by the produced quantity and round once.
/// Any null input makes the result null.
fn scaled_impact(factors: &[Option<f64>], production_quantity: Option<f64>) -> Option<i64> {
    let per_tonne = factors.iter().copied().sum::<Option<f64>>()?;
    round_impact(per_tonne * production_quantity?)
}

/// Derive the impact columns for one joined row.
pub fn compute_impact(record: &ProductionRecord) -> FootprintRecord {
    let f = &record.factors;
    let quantity = record.production_quantity;

    let static_impact = scaled_impact(&[f.land_use_static], quantity);
    let total_static_impact = scaled_impact(
        &[f.land_use_static, f.fragmentation_static, f.encroachment_static],
        quantity,
    );
    let total_dynamic_impact = scaled_impact(
        &[
            f.land_use_dynamic,
            f.fragmentation_dynamic,
            f.encroachment_dynamic,
            f.climate_change_terrestrial_dynamic,
        ],
        quantity,
    );
    // static(year + 1) = static(year) + dynamic(year), over the rounded values
    let static_impact_2020 = total_static_impact
        .zip(total_dynamic_impact)
        .and_then(|(s, d)| s.checked_add(d));

    FootprintRecord {
        country_code: f.country_code.clone(),
        alpha_2_code: record.alpha_2_code.clone(),
        production_quantity: quantity,
        area_sqkm: record.area_sqkm,
        static_impact,
        total_static_impact,
        total_dynamic_impact,
        static_impact_2020,
    }
}

pub fn compute_impacts(records: &[ProductionRecord]) -> Vec<FootprintRecord> {
    let out: Vec<_> = records.iter().map(compute_impact).collect();
    let missing = out.iter().filter(|r| r.static_impact_2020.is_none()).count();
    debug!(rows = out.len(), missing, "computed impacts");
    out
}
