use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum InterpolatorError {
    #[error("interpolator needs at least 2 samples, got {0}")]
    TooFewSamples(usize),
}

/// Piecewise-linear function over a fixed sample set.
///
/// Samples are expected in increasing x order. Queries outside the sampled
/// range are clamped to the first/last y value; there is no extrapolation.
#[derive(Debug, Clone)]
pub struct Interpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Interpolator {
    pub fn new(samples: &[(f64, f64)]) -> Result<Self, InterpolatorError> {
        if samples.len() < 2 {
            return Err(InterpolatorError::TooFewSamples(samples.len()));
        }
        let (xs, ys) = samples.iter().copied().unzip();
        Ok(Self { xs, ys })
    }

    /// Evaluate at `x`.
    ///
    /// Returns `None` for a NaN query. Samples out of x order still answer,
    /// using the first adjacent pair that brackets `x`.
    pub fn eval(&self, x: f64) -> Option<f64> {
        if x.is_nan() {
            return None;
        }
        let last = self.xs.len() - 1;
        if x <= self.xs[0] {
            return Some(self.ys[0]);
        }
        if x >= self.xs[last] {
            return Some(self.ys[last]);
        }

        (0..last)
            .find(|&i| x >= self.xs[i] && x <= self.xs[i + 1])
            .map(|i| {
                let (x0, x1) = (self.xs[i], self.xs[i + 1]);
                let (y0, y1) = (self.ys[i], self.ys[i + 1]);
                if x1 == x0 {
                    y0
                } else {
                    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
                }
            })
    }

    #[cfg(test)]
    pub fn sample_count(&self) -> usize {
        self.xs.len()
    }
}
