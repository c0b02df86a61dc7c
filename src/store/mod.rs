pub mod error;
pub mod weather_store;

pub use error::StoreError;
pub use weather_store::{CollectionKind, OrderBy, Rows, Transaction, WeatherStore};
