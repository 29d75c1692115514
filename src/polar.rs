use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::diagnostics::{DiagnosticCause, DiagnosticSink};
use crate::interpolator::Interpolator;

/// True wind angles at or below this are sailed upwind
pub const UPWIND_LIMIT_DEG: f64 = 90.0;

#[derive(Error, Debug)]
pub enum PolarError {
    #[error("cannot read polar file: {0}")]
    Io(#[from] std::io::Error),

    #[error("polar source is empty")]
    Empty,

    #[error("polar header has no wind speed columns")]
    NoWindSpeedColumns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SailingMode {
    Upwind,
    Downwind,
}

impl SailingMode {
    pub fn for_angle(true_wind_angle_deg: f64) -> Self {
        if true_wind_angle_deg.abs() <= UPWIND_LIMIT_DEG {
            SailingMode::Upwind
        } else {
            SailingMode::Downwind
        }
    }
}

/// Optimal angles and VMG published with the polar, one set per wind speed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BinMetadata {
    pub beat_angle: Option<f64>,
    pub beat_vmg: Option<f64>,
    pub run_angle: Option<f64>,
    pub run_vmg: Option<f64>,
}

impl BinMetadata {
    pub fn target_angle(&self, mode: SailingMode) -> Option<f64> {
        match mode {
            SailingMode::Upwind => self.beat_angle,
            SailingMode::Downwind => self.run_angle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PolarSample {
    pub angle: f64,      // degrees, as listed in the source
    pub boat_speed: f64, // knots
}

/// One column of the polar: all samples for a single true wind speed
#[derive(Debug, Clone, Serialize)]
pub struct WindSpeedBin {
    pub wind_speed: f64, // knots
    pub samples: Vec<PolarSample>,
    pub metadata: BinMetadata,
    #[serde(skip)]
    curve: Option<Interpolator>,
}

impl WindSpeedBin {
    /// Build a bin; samples keep their given order. A bin with fewer than
    /// two samples has no curve and never answers a speed lookup.
    pub fn new(wind_speed: f64, samples: Vec<PolarSample>, metadata: BinMetadata) -> Self {
        let points: Vec<(f64, f64)> = samples.iter().map(|s| (s.angle, s.boat_speed)).collect();
        let curve = match Interpolator::new(&points) {
            Ok(curve) => Some(curve),
            Err(e) => {
                warn!("[Polar] TWS {} kn has no usable curve: {}", wind_speed, e);
                None
            }
        };
        Self {
            wind_speed,
            samples,
            metadata,
            curve,
        }
    }

    #[cfg(test)]
    pub fn has_curve(&self) -> bool {
        self.curve.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
enum MetadataField {
    BeatAngle,
    BeatVmg,
    RunAngle,
    RunVmg,
}

impl MetadataField {
    fn from_label(label: &str) -> Option<Self> {
        let key: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        if key.contains("beatangle") {
            Some(MetadataField::BeatAngle)
        } else if key.contains("beatvmg") {
            Some(MetadataField::BeatVmg)
        } else if key.contains("runangle") {
            Some(MetadataField::RunAngle)
        } else if key.contains("runvmg") {
            Some(MetadataField::RunVmg)
        } else {
            None
        }
    }

    fn set(&self, metadata: &mut BinMetadata, value: f64) {
        match self {
            MetadataField::BeatAngle => metadata.beat_angle = Some(value),
            MetadataField::BeatVmg => metadata.beat_vmg = Some(value),
            MetadataField::RunAngle => metadata.run_angle = Some(value),
            MetadataField::RunVmg => metadata.run_vmg = Some(value),
        }
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim()
        .trim_matches('"')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Boat speed polar: per true wind speed, boat speed against true wind angle.
///
/// Lookups treat the angle symmetrically (port and starboard share a curve)
/// and interpolate angle first, wind speed second. The table is immutable;
/// see [`crate::polar_store::PolarStore`] for replacing it at runtime.
pub struct PolarTable {
    bins: Vec<WindSpeedBin>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for PolarTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PolarTable").field("bins", &self.bins).finish()
    }
}

impl PolarTable {
    pub fn empty(diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            bins: Vec::new(),
            diagnostics,
        }
    }

    /// Build a table from bins in any order; bins are sorted by wind speed.
    pub fn from_bins(mut bins: Vec<WindSpeedBin>, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        bins.sort_by(|a, b| a.wind_speed.total_cmp(&b.wind_speed));
        Self { bins, diagnostics }
    }

    pub fn load<P: AsRef<Path>>(path: P, diagnostics: Arc<dyn DiagnosticSink>) -> Result<Self, PolarError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents, diagnostics)
    }

    /// Parse comma separated polar text.
    ///
    /// Row 0 is `TWA,<tws>,<tws>,...`. Rows starting with a number are angle
    /// rows, other rows are metadata (`beatangle`, `beatvmg`, `runangle`,
    /// `runvmg`). Cells that are not numbers are skipped.
    pub fn parse(text: &str, diagnostics: Arc<dyn DiagnosticSink>) -> Result<Self, PolarError> {
        let mut rows = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.split(',').collect::<Vec<&str>>());

        let header = rows.next().ok_or(PolarError::Empty)?;

        // column index (after the label column) -> bin index
        let mut columns: Vec<Option<usize>> = Vec::with_capacity(header.len());
        let mut wind_speeds: Vec<f64> = Vec::new();
        for (column, cell) in header.iter().enumerate().skip(1) {
            let Some(wind_speed) = parse_number(cell) else {
                if !cell.trim().is_empty() {
                    debug!("[Polar] Skipping header column {} ('{}')", column, cell.trim());
                }
                columns.push(None);
                continue;
            };
            if wind_speeds.contains(&wind_speed) {
                warn!(
                    "[Polar] Wind speed {} repeated in header column {}, keeping the first",
                    wind_speed, column
                );
                columns.push(None);
                continue;
            }
            columns.push(Some(wind_speeds.len()));
            wind_speeds.push(wind_speed);
        }
        if wind_speeds.is_empty() {
            return Err(PolarError::NoWindSpeedColumns);
        }

        let mut samples: Vec<Vec<PolarSample>> = vec![Vec::new(); wind_speeds.len()];
        let mut metadata: Vec<BinMetadata> = vec![BinMetadata::default(); wind_speeds.len()];

        for row in rows {
            let Some((label, cells)) = row.split_first() else {
                continue;
            };
            let values = cells
                .iter()
                .zip(columns.iter())
                .filter_map(|(cell, column)| Some(((*column)?, parse_number(cell)?)));

            if let Some(angle) = parse_number(label) {
                for (bin, boat_speed) in values {
                    samples[bin].push(PolarSample { angle, boat_speed });
                }
            } else if let Some(field) = MetadataField::from_label(label) {
                for (bin, value) in values {
                    field.set(&mut metadata[bin], value);
                }
            } else {
                debug!("[Polar] Ignoring row with label '{}'", label.trim());
            }
        }

        let bins = wind_speeds
            .into_iter()
            .zip(samples)
            .zip(metadata)
            .map(|((wind_speed, samples), metadata)| WindSpeedBin::new(wind_speed, samples, metadata))
            .collect();

        Ok(Self::from_bins(bins, diagnostics))
    }

    pub fn bins(&self) -> &[WindSpeedBin] {
        &self.bins
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    fn bin_speed(&self, bin: &WindSpeedBin, angle_deg: f64) -> Option<f64> {
        let Some(curve) = &bin.curve else {
            self.diagnostics.report(
                DiagnosticCause::MissingCurve,
                format!("no curve for TWS {}", bin.wind_speed),
            );
            return None;
        };
        match curve.eval(angle_deg) {
            Some(speed) if speed.is_finite() => Some(speed),
            _ => {
                self.diagnostics.report(
                    DiagnosticCause::InvalidValue,
                    format!("no value for TWS {} TWA {}", bin.wind_speed, angle_deg),
                );
                None
            }
        }
    }

    /// Polar boat speed (knots) for a true wind speed (knots) and angle (degrees).
    pub fn polar_speed(&self, wind_speed_knots: f64, angle_deg: f64) -> Option<f64> {
        let angle = angle_deg.abs();
        let (first, last) = (self.bins.first()?, self.bins.last()?);

        if wind_speed_knots <= first.wind_speed {
            return self.bin_speed(first, angle);
        }
        if wind_speed_knots >= last.wind_speed {
            return self.bin_speed(last, angle);
        }

        let Some(pair) = self
            .bins
            .windows(2)
            .find(|w| wind_speed_knots >= w[0].wind_speed && wind_speed_knots <= w[1].wind_speed)
        else {
            self.diagnostics.report(
                DiagnosticCause::InvalidValue,
                format!("no wind speed bracket for TWS {}", wind_speed_knots),
            );
            return None;
        };
        let (low, high) = (&pair[0], &pair[1]);

        match (self.bin_speed(low, angle), self.bin_speed(high, angle)) {
            (Some(s1), Some(s2)) => {
                let ratio = (wind_speed_knots - low.wind_speed) / (high.wind_speed - low.wind_speed);
                Some((1.0 - ratio) * s1 + ratio * s2)
            }
            (Some(s), None) | (None, Some(s)) => Some(s),
            (None, None) => None,
        }
    }

    /// Optimal true wind angle (degrees) published by the bin nearest to the
    /// wind speed, ties going to the lighter wind speed. `None` when that bin
    /// has no angle for `mode`.
    pub fn target_angle(&self, wind_speed_knots: f64, mode: SailingMode) -> Option<f64> {
        if wind_speed_knots.is_nan() {
            return None;
        }
        let distance = |bin: &WindSpeedBin| (bin.wind_speed - wind_speed_knots).abs();
        // bins are sorted, so min_by keeps the lighter of two equally near bins
        self.bins
            .iter()
            .min_by(|a, b| distance(a).total_cmp(&distance(b)))?
            .metadata
            .target_angle(mode)
    }

    /// Polar boat speed (knots) sailing the target angle for `mode`.
    pub fn target_speed(&self, wind_speed_knots: f64, mode: SailingMode) -> Option<f64> {
        self.target_angle(wind_speed_knots, mode)
            .and_then(|angle| self.polar_speed(wind_speed_knots, angle))
    }
}
