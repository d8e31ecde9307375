use eau2_errors::ColumnError;
use eau2_value::{Cell, CellType, CellValue};

/// A fixed-size chunk's contents in memory: a typed value array and its parallel missing-bit
/// array (§3: "Column (local). Typed, ordered sequence of cells with a parallel missing-bit
/// sequence"). This is the unit fetched from and written back to the KV store for one chunk.
#[derive(Clone, Debug)]
pub struct LocalColumn {
    cell_type: CellType,
    values: Vec<CellValue>,
    missing: Vec<bool>,
}

impl LocalColumn {
    pub fn new(cell_type: CellType) -> Self {
        Self {
            cell_type,
            values: Vec::new(),
            missing: Vec::new(),
        }
    }

    /// Builds an all-missing chunk of exactly `size` cells, the shape every newly allocated chunk
    /// starts in.
    pub fn empty_of_size(cell_type: CellType, size: usize) -> Self {
        Self {
            cell_type,
            values: vec![CellValue::default_for(cell_type); size],
            missing: vec![true; size],
        }
    }

    pub fn from_parts(cell_type: CellType, values: Vec<CellValue>, missing: Vec<bool>) -> Self {
        Self {
            cell_type,
            values,
            missing,
        }
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn missing(&self) -> &[bool] {
        &self.missing
    }

    pub fn get(&self, offset: usize) -> Result<Cell, ColumnError> {
        let value = self.values.get(offset).cloned().ok_or(ColumnError::OutOfBounds {
            index: offset,
            length: self.values.len(),
        })?;
        let mut cell = Cell::new(value);
        if self.missing[offset] {
            cell.set_missing();
        }
        Ok(cell)
    }

    pub fn is_missing(&self, offset: usize) -> Result<bool, ColumnError> {
        self.missing.get(offset).copied().ok_or(ColumnError::OutOfBounds {
            index: offset,
            length: self.missing.len(),
        })
    }

    /// Sets the value at `offset`, clearing its missing bit — a `set` always asserts a real value
    /// is now present.
    pub fn set(&mut self, offset: usize, value: CellValue) -> Result<(), ColumnError> {
        let len = self.values.len();
        let slot = self.values.get_mut(offset).ok_or(ColumnError::OutOfBounds { index: offset, length: len })?;
        *slot = value;
        self.missing[offset] = false;
        Ok(())
    }

    pub fn set_missing(&mut self, offset: usize) -> Result<(), ColumnError> {
        let len = self.missing.len();
        let slot = self.missing.get_mut(offset).ok_or(ColumnError::OutOfBounds { index: offset, length: len })?;
        *slot = true;
        Ok(())
    }
}
