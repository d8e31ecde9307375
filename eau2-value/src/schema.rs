use crate::cell::CellType;

/// An ordered sequence of column type tags plus a row count (§3).
///
/// The type sequence is fixed at construction; only the row count changes, and only via
/// row-append operations. Column and row names are optional, carried because the wire format
/// (§6: `<types>;<col_names>;<row_names>`) always has slots for them.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    types: Vec<CellType>,
    col_names: Vec<Option<String>>,
    row_names: Vec<Option<String>>,
    n_rows: usize,
}

impl Schema {
    pub fn new(types: Vec<CellType>) -> Self {
        let width = types.len();
        Schema {
            types,
            col_names: vec![None; width],
            row_names: Vec::new(),
            n_rows: 0,
        }
    }

    pub fn with_names(types: Vec<CellType>, col_names: Vec<Option<String>>) -> Self {
        assert_eq!(
            types.len(),
            col_names.len(),
            "column name vector must have one entry per column"
        );
        Schema {
            types,
            col_names,
            row_names: Vec::new(),
            n_rows: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.types.len()
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn types(&self) -> &[CellType] {
        &self.types
    }

    pub fn col_type(&self, col: usize) -> Option<CellType> {
        self.types.get(col).copied()
    }

    pub fn col_names(&self) -> &[Option<String>] {
        &self.col_names
    }

    pub fn row_names(&self) -> &[Option<String>] {
        &self.row_names
    }

    pub fn col_name(&self, col: usize) -> Option<&str> {
        self.col_names.get(col).and_then(|n| n.as_deref())
    }

    /// Appends one logical row, incrementing the row count. Optionally names the new row.
    pub fn add_row(&mut self, name: Option<String>) {
        self.row_names.push(name);
        self.n_rows += 1;
    }

    /// Builds a new schema with one additional trailing column, keeping this schema's row names
    /// and count. A schema's own type sequence stays fixed once built; a caller that needs to add
    /// a column swaps in the returned schema rather than mutating this one in place.
    pub fn with_added_column(&self, ty: CellType, name: Option<String>) -> Schema {
        let mut types = self.types.clone();
        types.push(ty);
        let mut col_names = self.col_names.clone();
        col_names.push(name);
        Schema {
            types,
            col_names,
            row_names: self.row_names.clone(),
            n_rows: self.n_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_matches_type_count() {
        let schema = Schema::new(vec![CellType::I32, CellType::F32, CellType::Str, CellType::Bool]);
        assert_eq!(schema.width(), 4);
        assert_eq!(schema.n_rows(), 0);
    }

    #[test]
    fn add_row_increments_count_only() {
        let mut schema = Schema::new(vec![CellType::I32]);
        schema.add_row(None);
        schema.add_row(Some("r1".to_string()));
        assert_eq!(schema.n_rows(), 2);
        assert_eq!(schema.width(), 1);
        assert_eq!(schema.row_names()[1].as_deref(), Some("r1"));
    }

    #[test]
    fn with_added_column_grows_width_and_keeps_rows() {
        let mut schema = Schema::new(vec![CellType::I32]);
        schema.add_row(None);
        let grown = schema.with_added_column(CellType::Str, Some("label".to_string()));
        assert_eq!(grown.width(), 2);
        assert_eq!(grown.n_rows(), 1);
        assert_eq!(grown.col_name(1), Some("label"));
    }
}
