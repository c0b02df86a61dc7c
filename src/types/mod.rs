pub mod observation;
pub mod region;
pub mod station;
