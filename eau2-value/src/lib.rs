//! Typed value primitives shared by the rest of the eau2 workspace: cells, schema, and row.

mod cell;
mod key;
mod row;
mod schema;

pub use cell::{Cell, CellType, CellValue};
pub use key::Key;
pub use row::Row;
pub use schema::Schema;
