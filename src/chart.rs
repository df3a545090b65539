//! Line chart model for the history graph.
//!
//! Mirrors the shape of the chart configuration the dashboard page used:
//! labels plus two datasets with fixed colors, and a y axis that starts at
//! zero with a suggested 0-100 range. The chart is created once and then mutated
//! in place; `update()` marks a new frame for the renderer.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const TEMPERATURE_LABEL: &str = "Temperatura (°C)";
pub const HUMIDITY_LABEL: &str = "Wilgotność (%)";

pub const TEMPERATURE_COLOR: Rgb = Rgb(0xFF, 0x63, 0x84);
pub const HUMIDITY_COLOR: Rgb = Rgb(0x36, 0xA2, 0xEB);

/// One unfilled line series.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: &'static str,
    pub data: Vec<f64>,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisOptions {
    pub begin_at_zero: bool,
    pub suggested_min: Option<f64>,
    pub suggested_max: Option<f64>,
}

/// Humidity is a percentage, so the y axis suggests 0-100 for both series.
impl Default for AxisOptions {
    fn default() -> Self {
        Self {
            begin_at_zero: true,
            suggested_min: Some(0.0),
            suggested_max: Some(100.0),
        }
    }
}

pub const TEMPERATURE: usize = 0;
pub const HUMIDITY: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub labels: Vec<String>,
    pub datasets: [Dataset; 2],
    pub y_axis: AxisOptions,
    updates: u64,
}

impl LineChart {
    /// Builds the temperature/humidity chart. Data is expected oldest first.
    pub fn new(labels: Vec<String>, temperature: Vec<f64>, humidity: Vec<f64>) -> Self {
        Self {
            labels,
            datasets: [
                Dataset {
                    label: TEMPERATURE_LABEL,
                    data: temperature,
                    color: TEMPERATURE_COLOR,
                },
                Dataset {
                    label: HUMIDITY_LABEL,
                    data: humidity,
                    color: HUMIDITY_COLOR,
                },
            ],
            y_axis: AxisOptions::default(),
            updates: 0,
        }
    }

    /// Marks the current labels and data as the next frame.
    pub fn update(&mut self) {
        self.updates += 1;
    }

    /// How many times the chart was updated in place since it was created.
    #[cfg(test)]
    pub fn update_count(&self) -> u64 {
        self.updates
    }

    /// Data range of every dataset combined, `None` when there is no data.
    fn data_range(&self) -> Option<(f64, f64)> {
        self.datasets
            .iter()
            .flat_map(|d| d.data.iter().copied())
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Y axis bounds: the suggested range, widened to fit data outside it.
    pub fn y_bounds(&self) -> [f64; 2] {
        let y = self.y_axis;
        let mut lo = y.suggested_min.unwrap_or(f64::INFINITY);
        let mut hi = y.suggested_max.unwrap_or(f64::NEG_INFINITY);
        if y.begin_at_zero {
            lo = lo.min(0.0);
        }
        if let Some((min, max)) = self.data_range() {
            lo = lo.min(min);
            hi = hi.max(max);
        }
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return [0.0, 1.0];
        }
        [lo, hi]
    }

    /// X axis spans point indices; labels are categorical.
    pub fn x_bounds(&self) -> [f64; 2] {
        let last = self.labels.len().saturating_sub(1).max(1);
        [0.0, last as f64]
    }

    /// `(index, value)` pairs for plotting one dataset.
    pub fn points(&self, dataset: usize) -> Vec<(f64, f64)> {
        self.datasets[dataset]
            .data
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect()
    }
}
