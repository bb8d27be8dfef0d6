//! Data layer: the provider contract, bundled providers, and the per-date
//! price structure the engine iterates.

pub mod csv_provider;
pub mod history;
pub mod memory;
pub mod provider;
pub mod synthetic;

pub use csv_provider::CsvProvider;
pub use history::{dataset_hash, DailyData, PriceHistory};
pub use memory::InMemoryProvider;
pub use provider::{DataError, DataProvider, PriceFrame};
pub use synthetic::SyntheticProvider;
