//! Numeric range bucketing
//!
//! A value `v` lands in bucket `floor(v / bucket_size)`. Indexing stores
//! the value under its own bucket and `precision` neighbours on each side,
//! so a query for `q` finds every value whose bucket is within `precision`
//! of `q`'s bucket.
//!
//! Geographic search uses two of these, one per axis, sized in degrees.

use crate::{ExpansionError, StrategyError};
use serde::{Deserialize, Serialize};

/// Kilometres per degree of latitude
pub const KM_PER_DEGREE: f64 = 111.32;

/// Bucketing parameters for one numeric axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBucketing {
    bucket_size: f64,
    precision: u32,
}

impl RangeBucketing {
    /// Validated bucketing; `bucket_size` must be finite and positive
    pub fn new(bucket_size: f64, precision: u32) -> Result<Self, StrategyError> {
        let bucketing = RangeBucketing {
            bucket_size,
            precision,
        };
        bucketing.validate()?;
        Ok(bucketing)
    }

    /// Bucketing for one coordinate axis of a radius search
    ///
    /// The radius is converted to degrees with [`KM_PER_DEGREE`].
    pub fn geo(radius_km: f64, precision: u32) -> Result<Self, StrategyError> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(StrategyError::new(format!(
                "geo radius must be a positive number of kilometres, got {}",
                radius_km
            )));
        }
        Self::new(radius_km / KM_PER_DEGREE, precision)
    }

    /// Check the parameters (deserialized values skip [`new`](Self::new))
    pub fn validate(&self) -> Result<(), StrategyError> {
        if !self.bucket_size.is_finite() || self.bucket_size <= 0.0 {
            return Err(StrategyError::new(format!(
                "range bucket size must be a positive finite number, got {}",
                self.bucket_size
            )));
        }
        Ok(())
    }

    /// Width of one bucket
    pub fn bucket_size(&self) -> f64 {
        self.bucket_size
    }

    /// Neighbouring buckets stored on each side
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Bucket index of a value
    pub fn bucket(&self, value: f64) -> i64 {
        (value / self.bucket_size).floor() as i64
    }

    /// Parse a raw value; surrounding whitespace is ignored
    pub fn parse(raw: &str) -> Result<f64, ExpansionError> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ExpansionError::NotNumeric {
                value: raw.to_string(),
            })
    }

    /// Keys stored at index time: the value's bucket and its neighbours
    pub fn index_keys(&self, raw: &str) -> Result<Vec<String>, ExpansionError> {
        let bucket = self.bucket(Self::parse(raw)?);
        let precision = i64::from(self.precision);
        Ok((bucket.saturating_sub(precision)..=bucket.saturating_add(precision))
            .map(|b| b.to_string())
            .collect())
    }

    /// Key looked up at query time: the value's own bucket
    pub fn query_key(&self, raw: &str) -> Option<String> {
        Self::parse(raw)
            .ok()
            .map(|value| self.bucket(value).to_string())
    }
}
