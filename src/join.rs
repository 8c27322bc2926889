//! Commodity filter, per-table projections and the country-code left joins.

use ahash::AHashMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::loader::Table;
use crate::normalize::COUNTRY_CODE;
use crate::records::*;

pub const ITEM_NAME: &str = "item_name";
pub const ALPHA_2_CODE: &str = "alpha_2_code";
/// FAOSTAT value column, tonnes for production and hectares for area.
pub const FAOSTAT_VALUE: &str = "Value";

pub const MSA_LAND_USE_STATIC: &str = "msa_land_use_static";
pub const MSA_LAND_USE_DYNAMIC: &str = "msa_land_use_dynamic";
pub const MSA_FRAGMENTATION_STATIC: &str = "msa_fragmentation_static";
pub const MSA_FRAGMENTATION_DYNAMIC: &str = "msa_fragmentation_dynamic";
pub const MSA_ENCROACHMENT_STATIC: &str = "msa_encroachment_static";
pub const MSA_ENCROACHMENT_DYNAMIC: &str = "msa_encroachment_dynamic";
pub const MSA_CLIMATE_CHANGE_TERRESTRIAL_DYNAMIC: &str = "msa_climate_change_terrestrial_dynamic";

const HECTARES_PER_SQKM: f64 = 100.0;

pub fn hectares_to_sqkm(hectares: f64) -> f64 {
    hectares / HECTARES_PER_SQKM
}

// ─────────────────────────────────────────────────────────────
//  Projections: normalized tables → typed rows
// ─────────────────────────────────────────────────────────────

pub fn project_impact_factors(table: &Table) -> Result<Vec<CropImpactFactor>> {
    let codes = table.strings(COUNTRY_CODE)?;
    let items = table.strings(ITEM_NAME)?;
    let land_use_static = table.numbers(MSA_LAND_USE_STATIC)?;
    let land_use_dynamic = table.numbers(MSA_LAND_USE_DYNAMIC)?;
    let fragmentation_static = table.numbers(MSA_FRAGMENTATION_STATIC)?;
    let fragmentation_dynamic = table.numbers(MSA_FRAGMENTATION_DYNAMIC)?;
    let encroachment_static = table.numbers(MSA_ENCROACHMENT_STATIC)?;
    let encroachment_dynamic = table.numbers(MSA_ENCROACHMENT_DYNAMIC)?;
    let climate_change = table.numbers(MSA_CLIMATE_CHANGE_TERRESTRIAL_DYNAMIC)?;

    Ok(codes
        .into_iter()
        .zip(items)
        .enumerate()
        .map(|(i, (country_code, item_name))| CropImpactFactor {
            country_code,
            item_name,
            land_use_static: land_use_static[i],
            land_use_dynamic: land_use_dynamic[i],
            fragmentation_static: fragmentation_static[i],
            fragmentation_dynamic: fragmentation_dynamic[i],
            encroachment_static: encroachment_static[i],
            encroachment_dynamic: encroachment_dynamic[i],
            climate_change_terrestrial_dynamic: climate_change[i],
        })
        .collect())
}

pub fn project_country_specs(table: &Table) -> Result<Vec<CountrySpec>> {
    let codes = table.strings(COUNTRY_CODE)?;
    let alpha_2 = table.strings(ALPHA_2_CODE)?;

    Ok(codes
        .into_iter()
        .zip(alpha_2)
        .map(|(country_code, alpha_2_code)| CountrySpec {
            country_code,
            alpha_2_code,
        })
        .collect())
}

pub fn project_production(table: &Table) -> Result<Vec<Production>> {
    let codes = table.strings(COUNTRY_CODE)?;
    let values = table.numbers(FAOSTAT_VALUE)?;

    Ok(codes
        .into_iter()
        .zip(values)
        .map(|(country_code, production_quantity)| Production {
            country_code,
            production_quantity,
        })
        .collect())
}

pub fn project_area(table: &Table) -> Result<Vec<Area>> {
    let codes = table.strings(COUNTRY_CODE)?;
    let hectares = table.numbers(FAOSTAT_VALUE)?;

    Ok(codes
        .into_iter()
        .zip(hectares)
        .map(|(country_code, hectares)| Area {
            country_code,
            area_sqkm: hectares.map(hectares_to_sqkm),
        })
        .collect())
}

/// Keep the rows whose `item_name` equals `commodity` exactly.
pub fn filter_commodity(factors: Vec<CropImpactFactor>, commodity: &str) -> Vec<CropImpactFactor> {
    let total = factors.len();
    let filtered: Vec<_> = factors
        .into_iter()
        .filter(|f| f.item_name.as_deref() == Some(commodity))
        .collect();

    if filtered.is_empty() {
        warn!(commodity, rows = total, "no impact factors match the commodity");
    } else {
        debug!(commodity, kept = filtered.len(), rows = total, "filtered impact factors");
    }
    filtered
}

// ─────────────────────────────────────────────────────────────
//  Left joins
// ─────────────────────────────────────────────────────────────

fn index_by_code<R: CountryKeyed>(rows: &[R]) -> AHashMap<&str, Vec<&R>> {
    let mut index: AHashMap<&str, Vec<&R>> = AHashMap::with_capacity(rows.len());
    for row in rows {
        // null keys never match
        if let Some(code) = row.country_code() {
            index.entry(code).or_default().push(row);
        }
    }
    index
}

/// Left join `left` with `right` on the country code.
///
/// Every left row survives. A row without a match is passed through as is; a
/// row matching several right rows is duplicated once per match, with `merge`
/// copying the right-hand columns into each copy.
pub fn left_join<L, R, F>(left: Vec<L>, right: &[R], right_name: &str, mut merge: F) -> Vec<L>
where
    L: CountryKeyed + Clone,
    R: CountryKeyed,
    F: FnMut(&mut L, &R),
{
    let index = index_by_code(right);
    let mut joined = Vec::with_capacity(left.len());
    let mut unmatched = 0usize;

    for row in left {
        let matches = row.country_code().and_then(|code| index.get(code));
        match matches {
            Some(matches) => {
                if matches.len() > 1 {
                    warn!(
                        table = right_name,
                        country_code = row.country_code().unwrap_or_default(),
                        matches = matches.len(),
                        "join key fans out"
                    );
                }
                for matched in matches {
                    let mut out = row.clone();
                    merge(&mut out, matched);
                    joined.push(out);
                }
            }
            None => {
                unmatched += 1;
                joined.push(row);
            }
        }
    }

    debug!(table = right_name, rows = joined.len(), unmatched, "left join");
    joined
}

/// Join the filtered impact factors with production, area and country specs,
/// in that order.
pub fn join_tables(
    factors: Vec<CropImpactFactor>,
    production: &[Production],
    area: &[Area],
    specs: &[CountrySpec],
) -> Vec<ProductionRecord> {
    warn_duplicate_codes(&factors);

    let records: Vec<ProductionRecord> = factors.into_iter().map(ProductionRecord::from).collect();
    let records = left_join(records, production, "production", |r, p| {
        r.production_quantity = p.production_quantity
    });
    let records = left_join(records, area, "area", |r, a| r.area_sqkm = a.area_sqkm);
    left_join(records, specs, "country_specs", |r, s| {
        r.alpha_2_code = s.alpha_2_code.clone()
    })
}

fn warn_duplicate_codes(factors: &[CropImpactFactor]) {
    for (code, rows) in index_by_code(factors) {
        if rows.len() > 1 {
            warn!(country_code = code, rows = rows.len(), "impact factors repeat a country");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow2::array::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    fn factor(code: &str, item: &str, land_use_static: f64) -> CropImpactFactor {
        CropImpactFactor {
            country_code: Some(code.to_string()),
            item_name: Some(item.to_string()),
            land_use_static: Some(land_use_static),
            ..Default::default()
        }
    }

    fn production(code: &str, quantity: f64) -> Production {
        Production {
            country_code: Some(code.to_string()),
            production_quantity: Some(quantity),
        }
    }

    fn area(code: &str, sqkm: f64) -> Area {
        Area {
            country_code: Some(code.to_string()),
            area_sqkm: Some(sqkm),
        }
    }

    fn spec(code: &str, alpha_2: &str) -> CountrySpec {
        CountrySpec {
            country_code: Some(code.to_string()),
            alpha_2_code: Some(alpha_2.to_string()),
        }
    }

    #[test]
    fn filter_keeps_only_the_commodity() {
        let factors = vec![
            factor("004", "Wheat", 0.1),
            factor("008", "Maize", 0.2),
            factor("012", "Wheat", 0.3),
        ];

        let wheat = filter_commodity(factors, "Wheat");
        assert_eq!(wheat.len(), 2);
        assert!(wheat.iter().all(|f| f.item_name.as_deref() == Some("Wheat")));
    }

    #[test]
    fn filter_on_unknown_commodity_is_empty() {
        let factors = vec![factor("004", "Wheat", 0.1), factor("008", "Maize", 0.2)];
        assert!(filter_commodity(factors.clone(), "Barley").is_empty());
        // exact match only
        assert!(filter_commodity(factors, "wheat").is_empty());
    }

    #[test]
    fn area_is_converted_to_square_kilometres() {
        let table = Table::from_arrays(
            "area.csv",
            vec![
                (COUNTRY_CODE, Utf8Array::<i32>::from(vec![Some("004"), Some("008")]).boxed()),
                (FAOSTAT_VALUE, PrimitiveArray::<i64>::from(vec![Some(500), None]).boxed()),
            ],
        );

        let rows = project_area(&table).unwrap();
        assert_eq!(rows[0].area_sqkm, Some(5.0));
        assert_eq!(rows[1].area_sqkm, None);
    }

    #[test]
    fn production_value_becomes_production_quantity() {
        let table = Table::from_arrays(
            "production.csv",
            vec![
                (COUNTRY_CODE, Utf8Array::<i32>::from(vec![Some("004")]).boxed()),
                (FAOSTAT_VALUE, PrimitiveArray::<f64>::from(vec![Some(100.0)]).boxed()),
            ],
        );

        assert_eq!(project_production(&table).unwrap(), vec![production("004", 100.0)]);
    }

    #[test]
    fn projection_requires_every_factor_column() {
        let table = Table::from_arrays(
            "crops.csv",
            vec![
                (COUNTRY_CODE, Utf8Array::<i32>::from(vec![Some("004")]).boxed()),
                (ITEM_NAME, Utf8Array::<i32>::from(vec![Some("Wheat")]).boxed()),
            ],
        );

        let err = project_impact_factors(&table).unwrap_err();
        assert!(err.to_string().contains(MSA_LAND_USE_STATIC));
    }

    #[test]
    fn left_join_keeps_every_left_row() {
        let factors = vec![
            factor("004", "Wheat", 0.1),
            factor("008", "Wheat", 0.2),
            factor("012", "Wheat", 0.3),
        ];
        let joined = join_tables(
            factors,
            &[production("004", 100.0)],
            &[area("008", 2.0)],
            &[spec("012", "DZ"), spec("999", "XX")],
        );

        assert_eq!(joined.len(), 3);
        assert_eq!(joined[0].production_quantity, Some(100.0));
        assert_eq!(joined[0].area_sqkm, None);
        assert_eq!(joined[1].production_quantity, None);
        assert_eq!(joined[1].area_sqkm, Some(2.0));
        assert_eq!(joined[2].alpha_2_code.as_deref(), Some("DZ"));
        assert_eq!(joined[2].production_quantity, None);
    }

    #[test]
    fn left_join_with_empty_right_side() {
        let joined = join_tables(vec![factor("004", "Wheat", 0.1)], &[], &[], &[]);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0], ProductionRecord::from(factor("004", "Wheat", 0.1)));
    }

    #[test]
    fn duplicate_right_rows_fan_out() {
        let joined = join_tables(
            vec![factor("004", "Wheat", 0.1), factor("008", "Wheat", 0.2)],
            &[production("004", 100.0), production("004", 50.0)],
            &[],
            &[],
        );

        let quantities: Vec<_> = joined.iter().map(|r| r.production_quantity).collect();
        assert_eq!(quantities, vec![Some(100.0), Some(50.0), None]);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn warnings(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .filter(|line| line.contains("WARN"))
                .map(str::to_string)
                .collect()
        }
    }

    fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, CapturedLogs) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, logs)
    }

    #[test]
    fn fan_out_is_reported_per_table() {
        let (joined, logs) = with_captured_logs(|| {
            join_tables(
                vec![factor("004", "Wheat", 0.1), factor("008", "Wheat", 0.2)],
                &[production("004", 100.0), production("004", 50.0)],
                &[area("008", 1.0)],
                &[],
            )
        });
        assert_eq!(joined.len(), 3);

        let warnings = logs.warnings();
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].contains("join key fans out"));
        assert!(warnings[0].contains("production"));
        assert!(warnings[0].contains("004"));
    }

    #[test]
    fn repeated_factor_codes_are_reported() {
        let (joined, logs) = with_captured_logs(|| {
            join_tables(
                vec![
                    factor("004", "Wheat", 0.1),
                    factor("004", "Wheat", 0.3),
                    factor("008", "Wheat", 0.2),
                ],
                &[],
                &[],
                &[],
            )
        });
        assert_eq!(joined.len(), 3);

        let warnings = logs.warnings();
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].contains("impact factors repeat a country"));
        assert!(warnings[0].contains("004"));
    }

    #[test]
    fn null_codes_never_match() {
        let mut orphan = factor("004", "Wheat", 0.1);
        orphan.country_code = None;
        let unnamed = Production {
            country_code: None,
            production_quantity: Some(1.0),
        };

        let joined = join_tables(vec![orphan], &[unnamed], &[], &[]);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].production_quantity, None);
    }
}
