pub mod locate_station;

pub use locate_station::StationLocator;
