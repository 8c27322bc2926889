use std::fmt;

use crate::records::FootprintRecord;

/// Output columns that get a per-country ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    ProductionQuantity,
    AreaSqkm,
    StaticImpact,
    TotalStaticImpact,
    TotalDynamicImpact,
    StaticImpact2020,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::ProductionQuantity,
        Metric::AreaSqkm,
        Metric::StaticImpact,
        Metric::TotalStaticImpact,
        Metric::TotalDynamicImpact,
        Metric::StaticImpact2020,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Metric::ProductionQuantity => "production_quantity",
            Metric::AreaSqkm => "area_sqkm",
            Metric::StaticImpact => "static_impact",
            Metric::TotalStaticImpact => "total_static_impact",
            Metric::TotalDynamicImpact => "total_dynamic_impact",
            Metric::StaticImpact2020 => "static_impact_2020",
        }
    }

    pub fn value(self, record: &FootprintRecord) -> Option<f64> {
        match self {
            Metric::ProductionQuantity => record.production_quantity,
            Metric::AreaSqkm => record.area_sqkm,
            Metric::StaticImpact => record.static_impact.map(|v| v as f64),
            Metric::TotalStaticImpact => record.total_static_impact.map(|v| v as f64),
            Metric::TotalDynamicImpact => record.total_dynamic_impact.map(|v| v as f64),
            Metric::StaticImpact2020 => record.static_impact_2020.map(|v| v as f64),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    /// Alpha-2 code, or the numeric country code when the country has none.
    pub label: String,
    pub value: f64,
}

/// Bar-chart data for one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub metric: Metric,
    pub entries: Vec<RankedEntry>,
}

/// Countries by descending `metric`, nulls dropped, at most `top_n` entries.
/// Equal values keep their input order.
pub fn rank(records: &[FootprintRecord], metric: Metric, top_n: usize) -> Ranking {
    let mut entries: Vec<RankedEntry> = records
        .iter()
        .filter_map(|r| {
            let value = metric.value(r)?;
            let label = r.alpha_2_code.clone().or_else(|| r.country_code.clone())?;
            Some(RankedEntry { label, value })
        })
        .collect();

    entries.sort_by(|a, b| b.value.total_cmp(&a.value));
    entries.truncate(top_n);
    Ranking { metric, entries }
}

pub fn rank_all(records: &[FootprintRecord], top_n: usize) -> Vec<Ranking> {
    Metric::ALL
        .iter()
        .map(|&metric| rank(records, metric, top_n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, alpha_2: Option<&str>, static_impact: Option<i64>) -> FootprintRecord {
        FootprintRecord {
            country_code: Some(code.to_string()),
            alpha_2_code: alpha_2.map(str::to_string),
            static_impact,
            ..Default::default()
        }
    }

    #[test]
    fn ranks_descending_and_drops_nulls() {
        let records = vec![
            row("004", Some("AF"), Some(10)),
            row("008", Some("AL"), None),
            row("012", Some("DZ"), Some(40)),
            row("020", None, Some(25)),
        ];

        let ranking = rank(&records, Metric::StaticImpact, 10);
        let labels: Vec<_> = ranking.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["DZ", "020", "AF"]);
        assert_eq!(ranking.entries[0].value, 40.0);
    }

    #[test]
    fn truncates_to_top_n_keeping_tie_order() {
        let records = vec![
            row("004", Some("AF"), Some(5)),
            row("008", Some("AL"), Some(5)),
            row("012", Some("DZ"), Some(5)),
        ];

        let ranking = rank(&records, Metric::StaticImpact, 2);
        let labels: Vec<_> = ranking.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["AF", "AL"]);
    }

    #[test]
    fn one_ranking_per_metric() {
        let rankings = rank_all(&[], 10);
        assert_eq!(rankings.len(), Metric::ALL.len());
        assert!(rankings.iter().all(|r| r.entries.is_empty()));
        assert_eq!(rankings[5].metric.to_string(), "static_impact_2020");
    }
}
