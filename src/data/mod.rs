pub mod fetcher;
pub mod loader;

pub use fetcher::{fetch_and_save, FetchWindows};
pub use loader::{LoadError, PriceLoader};
