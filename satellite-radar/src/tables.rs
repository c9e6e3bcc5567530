//! Tabular views of a run and the JSON report that carries them.

use std::path::Path;

use num_bigint::BigUint;
use serde::Serialize;

use landscape_core::model::decimal;
use landscape_core::{digit_length, truncated_decimal, StarRecord};
use landscape_stats::Report;

use crate::error::Result;
use crate::locator::{LocatorStats, UndecidedIndex};
use crate::pipeline::RunOutput;
use crate::scanner::ScanStats;

/// Leading and trailing digits kept when P is abbreviated.
pub const TRUNCATE_EDGE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MainStarRow {
    #[serde(with = "decimal")]
    pub n: BigUint,
    pub digit_length: usize,
    /// P with its middle digits elided.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SatelliteRow {
    #[serde(with = "decimal")]
    pub n: BigUint,
    pub k: u64,
    pub digit_length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    #[serde(with = "decimal")]
    pub n: BigUint,
    pub satellite_count: usize,
    pub complete: bool,
}

/// Rows for every star, satellite and per-star summary, ordered by n then k.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunTables {
    pub main_stars: Vec<MainStarRow>,
    pub satellites: Vec<SatelliteRow>,
    pub summaries: Vec<SummaryRow>,
}

impl RunTables {
    pub fn from_records(records: &[StarRecord]) -> Self {
        let mut tables = RunTables::default();
        for record in records {
            let star = &record.star;
            tables.main_stars.push(MainStarRow {
                n: star.n.clone(),
                digit_length: star.digit_length,
                value: truncated_decimal(&star.value, TRUNCATE_EDGE),
            });
            for satellite in record.satellites().unwrap_or_default() {
                tables.satellites.push(SatelliteRow {
                    n: satellite.n.clone(),
                    k: satellite.k,
                    digit_length: digit_length(&satellite.value),
                });
            }
            let summary = record.summary();
            tables.summaries.push(SummaryRow {
                n: summary.n,
                satellite_count: summary.satellite_count,
                complete: summary.complete,
            });
        }
        tables
    }
}

/// The single JSON document a run writes.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub family: String,
    pub radius: u64,
    pub locator: LocatorStats,
    pub scan: ScanStats,
    pub undecided: Vec<UndecidedIndex>,
    pub elapsed_secs: f64,
    pub tables: RunTables,
    /// Absent when no star completed.
    pub statistics: Option<Report>,
}

impl RunReport {
    pub fn new(output: &RunOutput, statistics: Option<Report>) -> Self {
        Self {
            family: output.family.clone(),
            radius: output.radius,
            locator: output.locator,
            scan: output.scan,
            undecided: output.undecided.clone(),
            elapsed_secs: output.elapsed_secs,
            tables: RunTables::from_records(&output.records),
            statistics,
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("Report written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landscape_core::{Family, MainStar, PowerDifference, Satellite};

    fn record(n: u64, gaps: &[u64]) -> StarRecord {
        let family = PowerDifference::default();
        let n = BigUint::from(n);
        let value = family.value(&n).unwrap();
        let satellites = gaps
            .iter()
            .map(|&k| Satellite {
                n: n.clone(),
                k,
                value: &value - k,
            })
            .collect();
        StarRecord::complete(MainStar::new(n, value), satellites)
    }

    #[test]
    fn test_tables_from_records() {
        let family = PowerDifference::default();
        let failed_n = BigUint::from(42u32);
        let records = vec![
            record(13, &[36, 60]),
            StarRecord::failed(
                MainStar::new(failed_n.clone(), family.value(&failed_n).unwrap()),
                "panic",
            ),
            record(66, &[2]),
        ];
        let tables = RunTables::from_records(&records);
        assert_eq!(tables.main_stars.len(), 3);
        assert_eq!(tables.satellites.len(), 3);
        assert_eq!(tables.summaries[1], SummaryRow {
            n: failed_n,
            satellite_count: 0,
            complete: false,
        });
        assert_eq!(tables.satellites[2].k, 2);
        assert!(tables.main_stars[0].value.contains("..."));
        assert_eq!(
            tables.main_stars[0].digit_length,
            records[0].star.value.to_string().len()
        );
    }

    #[test]
    fn test_rows_serialize_n_as_decimal_string() {
        let tables = RunTables::from_records(&[record(13, &[36])]);
        let json = serde_json::to_value(&tables.satellites[0]).unwrap();
        assert_eq!(json["n"], "13");
        assert_eq!(json["k"], 36);
    }
}
