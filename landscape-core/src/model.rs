//! Main stars, satellites and per-star records.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::digit_length;

/// A confirmed main star: n with Q(n) prime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainStar {
    #[serde(with = "decimal")]
    pub n: BigUint,
    #[serde(with = "decimal")]
    pub value: BigUint,
    pub digit_length: usize,
}

impl MainStar {
    pub fn new(n: BigUint, value: BigUint) -> Self {
        let digit_length = digit_length(&value);
        Self {
            n,
            value,
            digit_length,
        }
    }
}

/// A prime P - k found at gap k from a main star.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Satellite {
    #[serde(with = "decimal")]
    pub n: BigUint,
    pub k: u64,
    #[serde(with = "decimal")]
    pub value: BigUint,
}

/// How a star's satellite scan ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    Complete { satellites: Vec<Satellite> },
    Failed { reason: String },
}

/// One star and the result of scanning around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarRecord {
    pub star: MainStar,
    pub outcome: ScanOutcome,
}

impl StarRecord {
    pub fn complete(star: MainStar, mut satellites: Vec<Satellite>) -> Self {
        satellites.sort_by_key(|s| s.k);
        Self {
            star,
            outcome: ScanOutcome::Complete { satellites },
        }
    }

    pub fn failed(star: MainStar, reason: impl Into<String>) -> Self {
        Self {
            star,
            outcome: ScanOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.outcome, ScanOutcome::Complete { .. })
    }

    /// Satellites sorted by k; `None` for a failed scan.
    pub fn satellites(&self) -> Option<&[Satellite]> {
        match &self.outcome {
            ScanOutcome::Complete { satellites } => Some(satellites),
            ScanOutcome::Failed { .. } => None,
        }
    }

    pub fn summary(&self) -> StarSummary {
        let satellites = self.satellites().map(<[Satellite]>::to_vec);
        StarSummary {
            n: self.star.n.clone(),
            satellite_count: satellites.as_ref().map_or(0, Vec::len),
            complete: satellites.is_some(),
            satellites: satellites.unwrap_or_default(),
        }
    }
}

/// Read-only per-star aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarSummary {
    #[serde(with = "decimal")]
    pub n: BigUint,
    pub satellite_count: usize,
    pub complete: bool,
    pub satellites: Vec<Satellite>,
}

impl StarSummary {
    /// Smallest gap, the nearest satellite.
    pub fn nearest(&self) -> Option<u64> {
        self.satellites.first().map(|s| s.k)
    }
}

/// Sort records by n (and satellites by k) so reductions do not depend on
/// completion order.
pub fn canonical_order(records: &mut [StarRecord]) {
    records.sort_by(|a, b| a.star.n.cmp(&b.star.n));
    for record in records.iter_mut() {
        if let ScanOutcome::Complete { satellites } = &mut record.outcome {
            satellites.sort_by_key(|s| s.k);
        }
    }
}

/// Serialize big integers as decimal strings.
pub mod decimal {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        BigUint::parse_bytes(s.as_bytes(), 10)
            .ok_or_else(|| de::Error::custom(format!("invalid decimal integer: {}", s)))
    }
}

/// Serialize sequences of big integers as decimal strings.
pub mod decimal_vec {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[BigUint], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| v.to_str_radix(10)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<BigUint>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| {
                BigUint::parse_bytes(s.as_bytes(), 10)
                    .ok_or_else(|| de::Error::custom(format!("invalid decimal integer: {}", s)))
            })
            .collect()
    }
}
