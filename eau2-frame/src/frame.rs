use std::sync::Arc;

use eau2_codec::{decode_schema, encode_schema};
use eau2_column::{ChunkDirectory, DistributedColumn, CHUNK_SIZE};
use eau2_errors::FrameError;
use eau2_kv::KvStore;
use eau2_value::{Cell, CellType, CellValue, Key, Row, Schema};
use parking_lot::Mutex;
use tracing::instrument;

use crate::rower::{RowWriter, Rower};

/// A schema plus a vector of distributed columns sharing its row count (§4.7). Each column is
/// behind its own mutex: per §5, a column's single-chunk cache isn't thread-safe, so concurrent
/// row ranges (`parallel_map`) serialize on whichever column they touch rather than sharing
/// unsynchronized state.
pub struct DistributedDataFrame {
    schema: Schema,
    columns: Vec<Mutex<DistributedColumn>>,
    kv: Arc<KvStore>,
    n_nodes: usize,
}

impl DistributedDataFrame {
    /// Builds an empty frame (no rows) with one column per type in `types`.
    pub fn empty(types: Vec<CellType>, kv: Arc<KvStore>, n_nodes: usize) -> Result<Self, FrameError> {
        let schema = Schema::new(types.clone());
        let columns = types
            .into_iter()
            .map(|ty| DistributedColumn::new(ty, kv.clone(), n_nodes).map(Mutex::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DistributedDataFrame {
            schema,
            columns,
            kv,
            n_nodes,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn n_rows(&self) -> usize {
        self.schema.n_rows()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Appends a brand-new column, requiring its length to equal the frame's current row count
    /// (or zero, which is the same condition when the frame is itself empty). The frame's schema
    /// grows by the column's type; there is no prior declared type for this column to conflict
    /// with, so only length is checked (§9's open question).
    pub fn add_column(&mut self, col: DistributedColumn) -> Result<(), FrameError> {
        let expected = self.n_rows();
        if col.len() != expected {
            return Err(FrameError::LengthMismatch {
                expected,
                got: col.len(),
            });
        }
        self.schema = self.schema.with_added_column(col.cell_type(), None);
        self.columns.push(Mutex::new(col));
        Ok(())
    }

    /// Appends one value to every column, consulting `row`'s missing bits.
    pub fn add_row(&mut self, row: &Row) -> Result<(), FrameError> {
        if row.width() != self.columns.len() {
            return Err(FrameError::LengthMismatch {
                expected: self.columns.len(),
                got: row.width(),
            });
        }
        for (c, column) in self.columns.iter().enumerate() {
            let mut column = column.lock();
            if row.is_missing(c) {
                column.push_back_missing()?;
            } else {
                column.push_back(row.cell(c).value().clone())?;
            }
        }
        self.schema.add_row(None);
        Ok(())
    }

    pub fn get(&self, col: usize, row: usize) -> Result<Cell, FrameError> {
        let column = self.columns.get(col).ok_or(FrameError::NoSuchColumn(col))?;
        Ok(column.lock().get(row)?)
    }

    pub fn is_missing(&self, col: usize, row: usize) -> Result<bool, FrameError> {
        let column = self.columns.get(col).ok_or(FrameError::NoSuchColumn(col))?;
        Ok(column.lock().is_missing(row)?)
    }

    /// Writes `value` at `(col, row)`, rejecting a value whose type doesn't match the column's
    /// declared type (§7: a defensive re-implementation should reject rather than silently drop).
    pub fn set(&self, col: usize, row: usize, value: CellValue) -> Result<(), FrameError> {
        let expected_ty = self.schema.col_type(col).ok_or(FrameError::NoSuchColumn(col))?;
        if value.cell_type() != expected_ty {
            return Err(FrameError::TypeMismatch { column: col });
        }
        let column = &self.columns[col];
        Ok(column.lock().set(row, value)?)
    }

    fn row_at(&self, r: usize) -> Result<Row, FrameError> {
        let mut row = Row::for_schema(&self.schema);
        for (c, column) in self.columns.iter().enumerate() {
            let cell = column.lock().get(r)?;
            if cell.is_missing() {
                row.set_missing(c);
            } else {
                row.set(c, cell.value().clone());
            }
        }
        Ok(row)
    }

    /// Writes back any present (non-missing) cells the rower changed. There's no operation to
    /// clear an existing index's missing bit, so a row marked missing by the rower is left alone.
    fn write_row_back(&self, r: usize, row: &Row) -> Result<(), FrameError> {
        for (c, column) in self.columns.iter().enumerate() {
            if !row.is_missing(c) {
                column.lock().set(r, row.cell(c).value().clone())?;
            }
        }
        Ok(())
    }

    fn visit_range<R: Rower>(&self, start: usize, end: usize, rower: &mut R) -> Result<(), FrameError> {
        for r in start..end {
            let mut row = self.row_at(r)?;
            rower.accept(&mut row);
            self.write_row_back(r, &row)?;
        }
        Ok(())
    }

    /// Visits every row index in order, fetching each column transparently through the KV layer.
    pub fn map<R: Rower>(&self, rower: &mut R) -> Result<(), FrameError> {
        self.visit_range(0, self.n_rows(), rower)
    }

    /// Visits only the row indices whose owning chunk is home to this node:
    /// `(row_index / C) mod N == this_node`.
    pub fn local_map<R: Rower>(&self, rower: &mut R) -> Result<(), FrameError> {
        let this_node = self.kv.own_id();
        for r in 0..self.n_rows() {
            if (r / CHUNK_SIZE) % self.n_nodes == this_node {
                let mut row = self.row_at(r)?;
                rower.accept(&mut row);
                self.write_row_back(r, &row)?;
            }
        }
        Ok(())
    }

    /// Produces a new frame with the same column types, containing only the rows for which
    /// `accept` returned true.
    pub fn filter<R: Rower>(&self, rower: &mut R) -> Result<DistributedDataFrame, FrameError> {
        let mut result = DistributedDataFrame::empty(self.schema.types().to_vec(), self.kv.clone(), self.n_nodes)?;
        for r in 0..self.n_rows() {
            let mut row = self.row_at(r)?;
            if rower.accept(&mut row) {
                result.add_row(&row)?;
            }
        }
        Ok(result)
    }

    /// Splits the row range across `num_workers` threads, each operating on a cloned rower, then
    /// joins the partial rowers back into the caller's. The caller's own rower handles the final
    /// range and is merged last, so it is never itself folded into another rower's state.
    pub fn parallel_map<R: Rower + Send>(&self, rower: &mut R, num_workers: usize) -> Result<(), FrameError> {
        let n_rows = self.n_rows();
        if n_rows == 0 {
            return Ok(());
        }
        let workers = num_workers.max(1).min(n_rows);
        let rows_per_worker = n_rows.div_ceil(workers);

        let mut partials: Vec<R> = (0..workers.saturating_sub(1)).map(|_| rower.clone_for_fork()).collect();

        let last_start = (workers - 1) * rows_per_worker;
        let outcome: Result<(), FrameError> = std::thread::scope(|scope| {
            let mut handles = Vec::with_capacity(partials.len());
            for (i, partial) in partials.iter_mut().enumerate() {
                let start = i * rows_per_worker;
                let end = (start + rows_per_worker).min(last_start);
                if start >= end {
                    continue;
                }
                handles.push(scope.spawn(move || self.visit_range(start, end, partial)));
            }

            let self_result = self.visit_range(last_start, n_rows, rower);

            for handle in handles {
                handle.join().expect("parallel_map worker thread panicked")?;
            }
            self_result
        });
        outcome?;

        for partial in partials {
            rower.join(partial);
        }
        Ok(())
    }

    /// Encodes `<schema>~<col0>;<col1>;…` and publishes it under `key`. Each column is encoded as
    /// its chunk directory (the chunk payloads themselves already live in the KV store).
    #[instrument(skip(self), fields(key = %key.name()))]
    pub fn publish(&self, key: &Key) -> Result<(), FrameError> {
        let schema_text = encode_schema(&self.schema);
        let columns_text = self
            .columns
            .iter()
            .map(|c| c.lock().directory().encode())
            .collect::<Vec<_>>()
            .join(";");
        let payload = format!("{schema_text}~{columns_text}");
        self.kv
            .put(key, &payload)
            .map_err(|e| FrameError::Column(eau2_errors::ColumnError::Kv(e)))?;
        Ok(())
    }

    /// Reads a frame previously published under `key`, reconstructing column handles bound to
    /// the existing chunk keys recorded in each directory.
    pub fn read(key: &Key, kv: Arc<KvStore>, n_nodes: usize) -> Result<Self, FrameError> {
        let payload = kv
            .get(key)
            .map_err(|e| FrameError::Column(eau2_errors::ColumnError::Kv(e)))?
            .ok_or_else(|| {
                FrameError::Column(eau2_errors::ColumnError::Kv(eau2_errors::KvError::NotFound(
                    key.name().to_string(),
                )))
            })?;
        Self::from_payload(&payload, kv, n_nodes)
    }

    /// As [`read`](Self::read), but blocks until `key` is published rather than failing when it
    /// isn't there yet — the `waitAndGet` a consumer application calls to pick up a data frame
    /// another node produced (§4.5, §4.8).
    pub fn wait_and_read(key: &Key, kv: Arc<KvStore>, n_nodes: usize) -> Result<Self, FrameError> {
        let payload = kv
            .wait_and_get(key)
            .map_err(|e| FrameError::Column(eau2_errors::ColumnError::Kv(e)))?;
        Self::from_payload(&payload, kv, n_nodes)
    }

    fn from_payload(payload: &str, kv: Arc<KvStore>, n_nodes: usize) -> Result<Self, FrameError> {
        let (schema_text, columns_text) = payload
            .split_once('~')
            .ok_or(FrameError::Column(eau2_errors::ColumnError::Codec(
                eau2_errors::CodecError::MissingFrameSeparator,
            )))?;
        let schema = decode_schema(schema_text)
            .map_err(|e| FrameError::Column(eau2_errors::ColumnError::Codec(e)))?;

        let directories: Vec<&str> = if columns_text.is_empty() {
            Vec::new()
        } else {
            columns_text.split(';').collect()
        };

        let columns = directories
            .into_iter()
            .zip(schema.types().iter())
            .map(|(text, ty)| {
                let dir = ChunkDirectory::decode(text)
                    .map_err(|e| FrameError::Column(eau2_errors::ColumnError::Codec(e)))?;
                Ok(Mutex::new(DistributedColumn::from_directory(*ty, kv.clone(), n_nodes, dir)))
            })
            .collect::<Result<Vec<_>, FrameError>>()?;

        Ok(DistributedDataFrame {
            schema,
            columns,
            kv,
            n_nodes,
        })
    }

    /// Builds a one-column frame from a contiguous array of values, publishes it under `key`.
    pub fn from_array(
        cell_type: CellType,
        values: &[CellValue],
        kv: Arc<KvStore>,
        n_nodes: usize,
        key: &Key,
    ) -> Result<Self, FrameError> {
        let mut frame = DistributedDataFrame::empty(vec![cell_type], kv, n_nodes)?;
        for value in values {
            let mut row = Row::from_types(&[cell_type]);
            row.set(0, value.clone());
            frame.add_row(&row)?;
        }
        frame.publish(key)?;
        Ok(frame)
    }

    /// Builds a one-column, one-row frame from a single scalar, publishes it under `key`.
    pub fn from_scalar(value: CellValue, kv: Arc<KvStore>, n_nodes: usize, key: &Key) -> Result<Self, FrameError> {
        Self::from_array(value.cell_type(), std::slice::from_ref(&value), kv, n_nodes, key)
    }

    /// Builds a frame by pulling rows from `writer` until it reports completion, then publishes
    /// it under `key` (§4.8).
    pub fn from_writer(
        schema_types: Vec<CellType>,
        writer: &mut impl RowWriter,
        kv: Arc<KvStore>,
        n_nodes: usize,
        key: &Key,
    ) -> Result<Self, FrameError> {
        let mut frame = DistributedDataFrame::empty(schema_types.clone(), kv, n_nodes)?;
        while !writer.done() {
            let mut row = Row::from_types(&schema_types);
            writer.next(&mut row);
            frame.add_row(&row)?;
        }
        frame.publish(key)?;
        Ok(frame)
    }
}
