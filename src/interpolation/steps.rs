//! The classification law turning an interpolated scalar into one of six
//! color bands.

use crate::interpolation::error::GridError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six discrete heat map classes, in classification order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Band {
    Purple,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
}

impl Band {
    pub const ALL: [Band; 6] = [
        Band::Purple,
        Band::Red,
        Band::Orange,
        Band::Yellow,
        Band::Green,
        Band::Blue,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    fn name(&self) -> &'static str {
        match self {
            Band::Purple => "purple",
            Band::Red => "red",
            Band::Orange => "orange",
            Band::Yellow => "yellow",
            Band::Green => "green",
            Band::Blue => "blue",
        }
    }

    /// Default overlay color (straight RGBA).
    pub fn default_color(&self) -> [u8; 4] {
        match self {
            Band::Purple => [145, 63, 191, 160],
            Band::Red => [224, 49, 49, 160],
            Band::Orange => [247, 143, 30, 160],
            Band::Yellow => [242, 220, 40, 160],
            Band::Green => [55, 178, 77, 160],
            Band::Blue => [51, 154, 240, 160],
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridStep {
    pub threshold: f64,
    /// Straight (not premultiplied) RGBA.
    pub color: [u8; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOrder {
    /// A value belongs to the first band whose threshold it does not exceed.
    Ascending,
    /// A value belongs to the first band whose threshold it reaches.
    Descending,
}

/// Six (threshold, color) bands, purple first and blue last.
///
/// Thresholds must be strictly monotonic; the direction is detected from the
/// first pair. Values beyond the last threshold fall into the last band, so
/// every value is classified into exactly one band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSteps {
    steps: [GridStep; 6],
    order: StepOrder,
}

impl GridSteps {
    pub fn new(steps: [GridStep; 6]) -> Result<Self, GridError> {
        for (index, step) in steps.iter().enumerate() {
            if !step.threshold.is_finite() {
                return Err(GridError::NonFiniteThreshold { index });
            }
        }

        let order = if steps[1].threshold > steps[0].threshold {
            StepOrder::Ascending
        } else {
            StepOrder::Descending
        };

        for index in 1..steps.len() {
            let (previous, current) = (steps[index - 1].threshold, steps[index].threshold);
            let in_order = match order {
                StepOrder::Ascending => current > previous,
                StepOrder::Descending => current < previous,
            };
            if !in_order {
                return Err(GridError::NotMonotonic { index });
            }
        }

        Ok(Self { steps, order })
    }

    /// Builds steps from thresholds using [`Band::default_color`].
    pub fn from_thresholds(thresholds: [f64; 6]) -> Result<Self, GridError> {
        let steps = std::array::from_fn(|i| GridStep {
            threshold: thresholds[i],
            color: Band::ALL[i].default_color(),
        });
        Self::new(steps)
    }

    /// Built-in presets whose thresholds are known to be ordered.
    pub(crate) fn preset(thresholds: [f64; 6], order: StepOrder) -> Self {
        let steps = std::array::from_fn(|i| GridStep {
            threshold: thresholds[i],
            color: Band::ALL[i].default_color(),
        });
        debug_assert!(Self::new(steps).is_ok());
        Self { steps, order }
    }

    pub fn order(&self) -> StepOrder {
        self.order
    }

    pub fn step(&self, band: Band) -> &GridStep {
        &self.steps[band.index()]
    }

    /// Classifies a value. The first band whose threshold condition holds
    /// wins.
    pub fn classify(&self, value: f64) -> Band {
        Band::ALL
            .iter()
            .zip(self.steps.iter())
            .find(|(_, step)| match self.order {
                StepOrder::Ascending => value <= step.threshold,
                StepOrder::Descending => value >= step.threshold,
            })
            .map(|(band, _)| *band)
            .unwrap_or(Band::Blue)
    }
}
