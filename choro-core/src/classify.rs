//! Fisher-Jenks natural breaks classification
//!
//! Finds the partition of a sorted one-dimensional sample into at most `k`
//! contiguous classes that minimizes the total within-class sum of squared
//! deviations. Runs in O(n²k) time and O(nk) space.

use serde::{Deserialize, Serialize};

use crate::error::{ChoroError, ChoroResult};
use crate::types::ValueMap;

/// Default number of classes for continuous maps.
pub const DEFAULT_CLASS_COUNT: usize = 7;

/// Ascending class upper bounds. The last bound is the sample maximum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassBreaks(Vec<f64>);

impl ClassBreaks {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Wrap externally supplied bounds; they must be finite, positive and strictly ascending.
    pub fn new(bounds: Vec<f64>) -> ChoroResult<Self> {
        if bounds.iter().any(|b| !b.is_finite() || *b <= 0.0) {
            return Err(ChoroError::InvalidParams("class bounds must be finite and positive".into()));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ChoroError::InvalidParams("class bounds must be strictly ascending".into()));
        }
        Ok(Self(bounds))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn max(&self) -> Option<f64> {
        self.0.last().copied()
    }

    /// Class index for `value`: the first bound it does not exceed. Values above the
    /// last bound fall in the last class; non-positive values are no-data.
    pub fn class_of(&self, value: f64) -> Option<usize> {
        if !(value > 0.0) || self.0.is_empty() {
            return None;
        }
        Some(self.0.iter().position(|&b| value <= b).unwrap_or(self.0.len() - 1))
    }
}

/// Compute natural breaks for `values` into at most `k` classes.
///
/// Non-positive and non-finite inputs are ignored. When the sample has at most `k`
/// distinct values, those values are returned unchanged, one class each.
pub fn jenks_breaks(values: &[f64], k: usize) -> ClassBreaks {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite() && *v > 0.0).collect();
    if sorted.is_empty() || k == 0 {
        return ClassBreaks::empty();
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut distinct = sorted.clone();
    distinct.dedup();
    if distinct.len() <= k {
        return ClassBreaks(distinct);
    }

    let n = sorted.len();
    // first[l][j]: 1-based index where class j starts in the best j-class split of the first l values
    let mut first = vec![vec![0usize; k + 1]; n + 1];
    // cost[l][j]: minimal total SSD of that split
    let mut cost = vec![vec![f64::INFINITY; k + 1]; n + 1];

    for j in 1..=k {
        first[1][j] = 1;
        cost[1][j] = 0.0;
    }

    for l in 2..=n {
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for m in 1..=l {
            let value = sorted[l - m];
            sum += value;
            sum_sq += value * value;
            let trailing_ssd = sum_sq - (sum * sum) / m as f64;
            let prefix = l - m;
            if prefix != 0 {
                for j in 2..=k {
                    let candidate = trailing_ssd + cost[prefix][j - 1];
                    // `<=`: on ties the larger trailing group wins
                    if candidate <= cost[l][j] {
                        first[l][j] = prefix + 1;
                        cost[l][j] = candidate;
                    }
                }
            }
        }
        first[l][1] = 1;
        cost[l][1] = sum_sq - (sum * sum) / l as f64;
    }

    let mut bounds = vec![0.0; k];
    bounds[k - 1] = sorted[n - 1];
    let mut end = n;
    for j in (2..=k).rev() {
        let start = first[end][j];
        if start < 2 {
            break;
        }
        bounds[j - 2] = sorted[start - 2];
        end = start - 1;
    }

    let mut breaks: Vec<f64> = Vec::with_capacity(k);
    for b in bounds {
        if b > 0.0 && breaks.last().map_or(true, |&prev| b > prev) {
            breaks.push(b);
        }
    }
    ClassBreaks(breaks)
}

/// Classify every positive value of a [`ValueMap`]. `k` must be at least 1.
pub fn classify_values(values: &ValueMap, k: usize) -> ChoroResult<ClassBreaks> {
    if k == 0 {
        return Err(ChoroError::InvalidParams("class count must be at least 1".into()));
    }
    let positive = values.positive_values();
    if positive.is_empty() {
        return Err(ChoroError::EmptyInput);
    }
    let breaks = jenks_breaks(&positive, k);
    log::debug!("Classified {} values into {} classes (requested {})", positive.len(), breaks.len(), k);
    Ok(breaks)
}
