pub mod error;
pub mod field;
pub mod grid;
pub mod heat_map;
pub mod steps;

pub use error::GridError;
pub use field::{samples_from_metars, GridProjection, HeatField, CEILING_UNLIMITED};
pub use grid::{GridConfig, HeatGrid, HeatSample};
pub use heat_map::{Backend, HeatMap};
pub use steps::{Band, GridStep, GridSteps, StepOrder};
