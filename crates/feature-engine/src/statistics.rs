//! Time-Domain Statistics

/// Descriptive statistics of a signal's amplitude distribution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticalFeatures {
    /// Mean value
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Median (mean of the two middle values for even lengths)
    pub median: f64,
    /// Sum of squares
    pub energy: f64,
    /// Excess kurtosis, Fisher definition (normal = 0)
    pub kurtosis: f64,
    /// Skewness (asymmetry)
    pub skewness: f64,
}

impl StatisticalFeatures {
    /// Feature names, in output order
    pub const NAMES: [&'static str; 8] = [
        "mean", "std", "min", "max", "median", "energy", "kurtosis", "skewness",
    ];

    /// Compute statistics from a slice of values.
    ///
    /// Moments use the biased (population) estimators. Skewness and kurtosis
    /// are 0 for a constant signal.
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;

        // Mean
        let mean = values.iter().sum::<f64>() / n;

        // Min/Max
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        // Central moments
        let mut m2 = 0.0;
        let mut m3 = 0.0;
        let mut m4 = 0.0;
        let mut energy = 0.0;

        for &v in values {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
            energy += v * v;
        }

        let variance = m2 / n;
        let std_dev = variance.sqrt();

        // Skewness: E[(X-μ)³] / σ³
        let skewness = if variance > 0.0 {
            (m3 / n) / variance.powf(1.5)
        } else {
            0.0
        };

        // Kurtosis: E[(X-μ)⁴] / σ⁴ - 3
        let kurtosis = if variance > 0.0 {
            (m4 / n) / (variance * variance) - 3.0
        } else {
            0.0
        };

        Self {
            mean,
            std_dev,
            min,
            max,
            median: median(values),
            energy,
            kurtosis,
            skewness,
        }
    }

    /// Values in the order of [`Self::NAMES`]
    pub fn values(&self) -> [f64; 8] {
        [
            self.mean,
            self.std_dev,
            self.min,
            self.max,
            self.median,
            self.energy,
            self.kurtosis,
            self.skewness,
        ]
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
