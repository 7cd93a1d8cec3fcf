//! Reading and persisting OHLC tables.

pub mod csv;
pub mod sink;

pub use csv::{read_table, write_table};
pub use sink::{CsvTableSink, TableSink, table_path};
