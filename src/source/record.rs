// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;

use serde::{Deserialize, Serialize};

/// The scalar values carried alongside each frame.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    /// The coldest temperature in the frame.
    #[serde(alias = "min")]
    Lowest,

    /// The hottest temperature in the frame.
    #[serde(alias = "max")]
    Highest,

    /// The mean temperature of the frame.
    #[serde(alias = "avg")]
    Average,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 3] = [ScalarKind::Lowest, ScalarKind::Highest, ScalarKind::Average];
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarKind::Lowest => "lowest",
            ScalarKind::Highest => "highest",
            ScalarKind::Average => "average",
        })
    }
}

/// A snapshot of one thermal frame as published by a [`Coordinator`][super::Coordinator].
///
/// Records are never modified after they are published. New data always arrives as a new
/// record that replaces the previous one.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRecord {
    /// Temperatures in degrees Celsius, in row-major order.
    pub values: Vec<f32>,
    pub min_value: f32,
    pub max_value: f32,
    pub avg_value: f32,
    pub rows: usize,
    pub cols: usize,
}

impl FrameRecord {
    /// Create a record, computing the statistics from the values themselves.
    ///
    /// NaN values are ignored for the minimum and maximum. An empty set of values results in
    /// all statistics being 0.
    pub fn from_values(values: Vec<f32>, rows: usize, cols: usize) -> Self {
        let (min_value, max_value, avg_value) = statistics(&values);
        Self {
            values,
            min_value,
            max_value,
            avg_value,
            rows,
            cols,
        }
    }

    /// Whether this record has any data that can be rendered or published.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the values fill the configured grid exactly.
    pub fn matches_grid(&self) -> bool {
        self.values.len() == self.rows * self.cols
    }

    pub fn scalar(&self, kind: ScalarKind) -> f32 {
        match kind {
            ScalarKind::Lowest => self.min_value,
            ScalarKind::Highest => self.max_value,
            ScalarKind::Average => self.avg_value,
        }
    }
}

fn statistics(values: &[f32]) -> (f32, f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let sum: f64 = values.iter().map(|v| *v as f64).sum();
    (min, max, (sum / values.len() as f64) as f32)
}
