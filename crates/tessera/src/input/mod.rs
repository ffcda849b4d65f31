//! Records, datasets and file loading.

mod loader;
mod record;
mod source;

pub use loader::{CsvLoader, LoaderConfig, write_delimited};
pub use record::{Dataset, Entity, Record, Workbook};
pub use source::SourceMetadata;
