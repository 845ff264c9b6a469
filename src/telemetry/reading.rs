//! A single simulated reading and the rule that regenerates it

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a reading moves from one tick to the next
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ReadingModel {
    /// `previous + U(-delta, delta)`
    RandomWalk { delta: f64 },
    /// `previous + U(min_step, max_step)`, e.g. battery drain
    Drift { min_step: f64, max_step: f64 },
    /// `base + amplitude * sin(time * rate)`
    Phase { base: f64, amplitude: f64, rate: f64 },
}

impl ReadingModel {
    fn is_valid(&self) -> bool {
        match *self {
            ReadingModel::RandomWalk { delta } => delta.is_finite() && delta >= 0.0,
            ReadingModel::Drift { min_step, max_step } => {
                min_step.is_finite() && max_step.is_finite() && min_step <= max_step
            }
            ReadingModel::Phase {
                base,
                amplitude,
                rate,
            } => base.is_finite() && amplitude.is_finite() && rate.is_finite(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    Normal,
    Warning,
    Critical,
}

impl ReadingStatus {
    /// Critical within 10% of either bound, warning within 20%.
    pub fn classify(value: f64, min: f64, max: f64) -> Self {
        let range = max - min;
        if value < min + range * 0.1 || value > max - range * 0.1 {
            ReadingStatus::Critical
        } else if value < min + range * 0.2 || value > max - range * 0.2 {
            ReadingStatus::Warning
        } else {
            ReadingStatus::Normal
        }
    }
}

/// Named value with a declared range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub name: String,
    pub unit: String,
    pub min: f64,
    pub max: f64,
    pub model: ReadingModel,
    /// Round to this many decimals after each update
    pub decimals: Option<u32>,
    /// Whether the value is judged against the status bands
    #[serde(default)]
    pub classified: bool,
    value: f64,
}

impl Reading {
    /// Starting value is clamped into `[min, max]`.
    pub fn new(name: &str, unit: &str, min: f64, max: f64, initial: f64, model: ReadingModel) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            min,
            max,
            model,
            decimals: None,
            classified: false,
            value: if min <= max { initial.clamp(min, max) } else { initial },
        }
    }

    /// Random walk whose step is 1% of the range each way
    pub fn walk(name: &str, unit: &str, min: f64, max: f64, initial: f64) -> Self {
        let delta = (max - min) * 0.01;
        Self::new(name, unit, min, max, initial, ReadingModel::RandomWalk { delta })
    }

    pub fn rounded(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// Report a status from the 10%/20% bands
    pub fn classified(mut self) -> Self {
        self.classified = true;
        self
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max && self.model.is_valid()
    }

    /// `None` for readings that are not classified
    pub fn status(&self) -> Option<ReadingStatus> {
        self.classified
            .then(|| ReadingStatus::classify(self.value, self.min, self.max))
    }

    /// Position of the value inside its range, in `[0, 1]`
    pub fn fraction(&self) -> f64 {
        let range = self.max - self.min;
        if range <= 0.0 {
            return 0.0;
        }
        ((self.value - self.min) / range).clamp(0.0, 1.0)
    }

    /// Regenerate from the previous value (or from `time` for phase readings).
    /// Invalid readings never move.
    pub fn update<R: Rng>(&mut self, rng: &mut R, time: f64) {
        if !self.is_valid() {
            return;
        }
        let next = match self.model {
            ReadingModel::RandomWalk { delta } => self.value + rng.random_range(-delta..=delta),
            ReadingModel::Drift { min_step, max_step } => {
                self.value + rng.random_range(min_step..=max_step)
            }
            ReadingModel::Phase {
                base,
                amplitude,
                rate,
            } => base + amplitude * (time * rate).sin(),
        };
        let next = match self.decimals {
            Some(decimals) => round_to(next, decimals),
            None => next,
        };
        self.value = next.clamp(self.min, self.max);
    }

    /// Value with its unit, the way the panels print it
    pub fn display(&self) -> String {
        match self.unit.as_str() {
            "°" => format!("{}{}", self.value.round(), self.unit),
            "" => format!("{:.2}", self.value),
            unit => format!("{:.1}{}", self.value, unit),
        }
    }
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}
