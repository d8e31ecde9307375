use crate::cell::{Cell, CellType, CellValue};
use crate::schema::Schema;

/// A row is a typed tuple of [`Cell`]s shaped by a [`Schema`] (§3).
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    /// Builds an all-missing row matching the given schema's column types.
    pub fn for_schema(schema: &Schema) -> Row {
        Row {
            cells: schema.types().iter().map(|&ty| Cell::missing(ty)).collect(),
        }
    }

    pub fn from_types(types: &[CellType]) -> Row {
        Row {
            cells: types.iter().map(|&ty| Cell::missing(ty)).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    pub fn cell(&self, col: usize) -> &Cell {
        &self.cells[col]
    }

    pub fn cell_mut(&mut self, col: usize) -> &mut Cell {
        &mut self.cells[col]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn is_missing(&self, col: usize) -> bool {
        self.cells[col].is_missing()
    }

    pub fn set_missing(&mut self, col: usize) {
        self.cells[col].set_missing();
    }

    pub fn set(&mut self, col: usize, value: CellValue) {
        self.cells[col].set(value);
    }

    pub fn get_int(&self, col: usize) -> i32 {
        self.cells[col].value().as_i32().expect("column is not I32")
    }

    pub fn get_float(&self, col: usize) -> f32 {
        self.cells[col].value().as_f32().expect("column is not F32")
    }

    pub fn get_bool(&self, col: usize) -> bool {
        self.cells[col].value().as_bool().expect("column is not Bool")
    }

    pub fn get_string(&self, col: usize) -> &str {
        self.cells[col].value().as_str().expect("column is not Str")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_starts_all_missing() {
        let row = Row::from_types(&[CellType::I32, CellType::Bool]);
        assert!(row.is_missing(0));
        assert!(row.is_missing(1));
    }

    #[test]
    fn set_then_get() {
        let mut row = Row::from_types(&[CellType::I32, CellType::F32]);
        row.set(0, CellValue::I32(42));
        row.set(1, CellValue::F32(7.5));
        assert!(!row.is_missing(0));
        assert_eq!(row.get_int(0), 42);
        assert_eq!(row.get_float(1), 7.5);
    }
}
