pub mod schema;
pub mod seed;
pub mod table;
pub mod value;

pub use schema::{schema, Column, ColumnKind, TableSchema, CATALOG};
pub use table::RecordTable;
pub use value::{record, Record, Value};
