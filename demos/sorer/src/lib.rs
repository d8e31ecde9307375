//! Schema-on-read reader for the `<field> <field> ...` text format demo applications load their
//! starting data frames from (§4.8, grounded on the original source's `src/client/sorer.h`).
//!
//! Out of scope for the core store (§1): this crate only produces rows, the same way the
//! original `Sorer` class only ever handed a `DataFrame` builder typed cells to append.

use std::fs;
use std::path::Path;

use eau2_errors::FrameError;
use eau2_frame::{DistributedDataFrame, RowWriter};
use eau2_value::{CellType, CellValue, Key, Row};
use tracing::debug;

/// How many leading lines are sampled to infer a column's type (mirrors the original's
/// `parse_schema`, which only ever looks at the first 500 lines).
const SCHEMA_SAMPLE_LINES: usize = 500;

/// One sampled line's fields, already split out of their `<...>` wrappers.
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut rest = line;
    while let Some(open) = rest.find('<') {
        let after_open = &rest[open + 1..];
        match after_open.find('>') {
            Some(close) => {
                fields.push(after_open[..close].trim());
                rest = &after_open[close + 1..];
            }
            None => break,
        }
    }
    fields
}

/// A field's inferred type, ranked low to high; a column's type is the highest rank seen across
/// every sampled value in it (STRING beats FLOAT beats INT beats the BOOL default).
fn field_type(token: &str) -> CellType {
    if token.is_empty() {
        return CellType::Bool;
    }
    if token == "0" || token == "1" {
        return CellType::Bool;
    }
    if token.parse::<i64>().is_ok() {
        return CellType::I32;
    }
    if token.parse::<f64>().is_ok() {
        return CellType::F32;
    }
    CellType::Str
}

fn rank(ty: CellType) -> u8 {
    match ty {
        CellType::Bool => 0,
        CellType::I32 => 1,
        CellType::F32 => 2,
        CellType::Str => 3,
    }
}

fn widen(current: CellType, candidate: CellType) -> CellType {
    if rank(candidate) > rank(current) {
        candidate
    } else {
        current
    }
}

fn parse_cell(token: &str, ty: CellType) -> CellValue {
    match ty {
        CellType::Bool => CellValue::Bool(token == "1"),
        CellType::I32 => CellValue::I32(token.parse().unwrap_or(0)),
        CellType::F32 => CellValue::F32(token.parse().unwrap_or(0.0)),
        CellType::Str => CellValue::Str(token.to_string()),
    }
}

/// A parsed file: its inferred column types and every row's raw fields, ready to be driven
/// through a [`RowWriter`].
pub struct SorFile {
    types: Vec<CellType>,
    lines: Vec<String>,
}

impl SorFile {
    /// Reads `path`, inferring column types from up to [`SCHEMA_SAMPLE_LINES`] leading lines
    /// (the original's `count_cols`/`parse_schema` pass).
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<SorFile> {
        let text = fs::read_to_string(path)?;
        let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();

        let num_columns = lines
            .iter()
            .take(SCHEMA_SAMPLE_LINES)
            .map(|l| split_fields(l).len())
            .max()
            .unwrap_or(0);

        let mut types = vec![CellType::Bool; num_columns];
        for line in lines.iter().take(SCHEMA_SAMPLE_LINES) {
            for (col, field) in split_fields(line).into_iter().enumerate() {
                if col >= types.len() {
                    break;
                }
                types[col] = widen(types[col], field_type(field));
            }
        }

        debug!(num_columns, num_rows = lines.len(), "inferred sor schema");
        Ok(SorFile { types, lines })
    }

    pub fn types(&self) -> &[CellType] {
        &self.types
    }

    pub fn num_rows(&self) -> usize {
        self.lines.len()
    }

    /// Builds a [`DistributedDataFrame`] from every row in the file and publishes it under `key`
    /// (§4.8's writer-factory path).
    pub fn into_frame(
        self,
        kv: std::sync::Arc<eau2_kv::KvStore>,
        n_nodes: usize,
        key: &Key,
    ) -> Result<DistributedDataFrame, FrameError> {
        let types = self.types.clone();
        let mut writer = SorWriter {
            file: self,
            next: 0,
        };
        DistributedDataFrame::from_writer(types, &mut writer, kv, n_nodes, key)
    }
}

struct SorWriter {
    file: SorFile,
    next: usize,
}

impl RowWriter for SorWriter {
    fn next(&mut self, row: &mut Row) {
        let fields = split_fields(&self.file.lines[self.next]);
        for (col, ty) in self.file.types.clone().into_iter().enumerate() {
            match fields.get(col) {
                Some(field) if !field.is_empty() => row.set(col, parse_cell(field, ty)),
                _ => row.set_missing(col),
            }
        }
        self.next += 1;
    }

    fn done(&self) -> bool {
        self.next >= self.file.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn infers_a_mixed_schema_from_sampled_lines() {
        let file = write_temp("<1> <hello> <3.5>\n<0> <world> <2>\n");
        let sor = SorFile::load(file.path()).unwrap();
        assert_eq!(sor.types(), &[CellType::Bool, CellType::Str, CellType::F32]);
        assert_eq!(sor.num_rows(), 2);
    }

    #[test]
    fn a_single_non_string_field_widens_to_int_then_float() {
        let file = write_temp("<10>\n<3.5>\n");
        let sor = SorFile::load(file.path()).unwrap();
        assert_eq!(sor.types(), &[CellType::F32]);
    }

    #[test]
    fn missing_fields_become_missing_cells() {
        let file = write_temp("<1> <a>\n<0>\n");
        let sor = SorFile::load(file.path()).unwrap();
        assert_eq!(sor.types(), &[CellType::Bool, CellType::Str]);

        let kv = eau2_kv::KvStore::new(0);
        let key = Key::new("sor-test", 0).unwrap();
        let frame = sor.into_frame(kv, 1, &key).unwrap();
        assert_eq!(frame.n_rows(), 2);
        assert!(frame.is_missing(1, 1).unwrap());
    }
}
