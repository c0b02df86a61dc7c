use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("Grid step threshold {index} is not a finite number")]
    NonFiniteThreshold { index: usize },

    #[error("Grid step thresholds must be strictly monotonic, step {index} breaks the order")]
    NotMonotonic { index: usize },
}
