use std::sync::Arc;

use eau2_codec::{decode_array, decode_bool_array, encode_array, encode_bool_array};
use eau2_errors::ColumnError;
use eau2_kv::KvStore;
use eau2_value::{Cell, CellType, CellValue, Key};

use crate::chunk_directory::ChunkDirectory;
use crate::local::LocalColumn;

/// Fixed chunk size in cells (§3's design constant `C`).
pub const CHUNK_SIZE: usize = 100;

/// A logical column sharded into fixed-size chunks, each addressed by a KV key whose home node
/// is `chunk_index mod N` (§4.6). All mutation methods take `&mut self`: per §5, a distributed
/// column's cache is not thread-safe and concurrent traversal of the same column requires
/// separate handles or external synchronization.
pub struct DistributedColumn {
    cell_type: CellType,
    column_id: String,
    n_nodes: usize,
    length: usize,
    num_chunks: usize,
    chunk_keys: Vec<Key>,
    missing_keys: Vec<Key>,
    cache: Option<(usize, LocalColumn)>,
    kv: Arc<KvStore>,
}

impl DistributedColumn {
    /// Creates an empty column backed by `kv`, against a cluster of `n_nodes` nodes.
    pub fn new(cell_type: CellType, kv: Arc<KvStore>, n_nodes: usize) -> Result<Self, ColumnError> {
        Self::with_initial_chunks(cell_type, kv, n_nodes, 1)
    }

    /// As [`new`](Self::new), but pre-allocates `initial_num_chunks` chunks up front rather than
    /// growing lazily from one.
    pub fn with_initial_chunks(
        cell_type: CellType,
        kv: Arc<KvStore>,
        n_nodes: usize,
        initial_num_chunks: usize,
    ) -> Result<Self, ColumnError> {
        let column_id = format!("{:x}", rand::random::<u64>());
        let mut column = DistributedColumn {
            cell_type,
            column_id,
            n_nodes,
            length: 0,
            num_chunks: 0,
            chunk_keys: Vec::new(),
            missing_keys: Vec::new(),
            cache: None,
            kv,
        };
        column.allocate_chunks(initial_num_chunks)?;
        Ok(column)
    }

    /// Rebuilds a handle onto a column already published in the store, e.g. when reading a data
    /// frame back from a key (§4.7).
    pub fn from_directory(
        cell_type: CellType,
        kv: Arc<KvStore>,
        n_nodes: usize,
        dir: ChunkDirectory,
    ) -> Self {
        let to_keys = |names: Vec<String>| -> Vec<Key> {
            names
                .into_iter()
                .enumerate()
                .map(|(i, name)| Key::new(name, i % n_nodes).expect("persisted chunk key name is valid"))
                .collect()
        };
        let chunk_keys = to_keys(dir.chunk_keys);
        let missing_keys = to_keys(dir.missing_keys);
        let num_chunks = chunk_keys.len();
        DistributedColumn {
            cell_type,
            column_id: dir.column_id,
            n_nodes,
            length: dir.length,
            num_chunks,
            chunk_keys,
            missing_keys,
            cache: None,
            kv,
        }
    }

    pub fn directory(&self) -> ChunkDirectory {
        ChunkDirectory {
            column_id: self.column_id.clone(),
            length: self.length,
            chunk_keys: self.chunk_keys.iter().map(|k| k.name().to_string()).collect(),
            missing_keys: self.missing_keys.iter().map(|k| k.name().to_string()).collect(),
        }
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn num_chunks(&self) -> usize {
        self.num_chunks
    }

    pub fn push_back(&mut self, value: CellValue) -> Result<(), ColumnError> {
        self.ensure_capacity_for_one_more()?;
        let (chunk_index, offset) = self.locate(self.length);
        let mut local = self.fetch_chunk(chunk_index)?.clone();
        local.set(offset, value)?;
        self.persist_chunk(chunk_index, &local)?;
        self.length += 1;
        self.invalidate_cache();
        Ok(())
    }

    pub fn push_back_missing(&mut self) -> Result<(), ColumnError> {
        self.ensure_capacity_for_one_more()?;
        let (chunk_index, offset) = self.locate(self.length);
        let mut local = self.fetch_chunk(chunk_index)?.clone();
        local.set_missing(offset)?;
        self.persist_chunk(chunk_index, &local)?;
        self.length += 1;
        self.invalidate_cache();
        Ok(())
    }

    pub fn get(&mut self, index: usize) -> Result<Cell, ColumnError> {
        self.check_bounds(index)?;
        let (chunk_index, offset) = self.locate(index);
        self.fetch_chunk(chunk_index)?.get(offset)
    }

    pub fn is_missing(&mut self, index: usize) -> Result<bool, ColumnError> {
        self.check_bounds(index)?;
        let (chunk_index, offset) = self.locate(index);
        self.fetch_chunk(chunk_index)?.is_missing(offset)
    }

    /// Sets the value at `index`, clearing its missing bit (§9's open question on whether `set`
    /// clears missing: the source does, so we follow it).
    pub fn set(&mut self, index: usize, value: CellValue) -> Result<(), ColumnError> {
        self.check_bounds(index)?;
        let (chunk_index, offset) = self.locate(index);
        let mut local = self.fetch_chunk(chunk_index)?.clone();
        local.set(offset, value)?;
        self.persist_chunk(chunk_index, &local)?;
        self.invalidate_cache();
        Ok(())
    }

    fn check_bounds(&self, index: usize) -> Result<(), ColumnError> {
        if index >= self.length {
            return Err(ColumnError::OutOfBounds {
                index,
                length: self.length,
            });
        }
        Ok(())
    }

    fn locate(&self, index: usize) -> (usize, usize) {
        (index / CHUNK_SIZE, index % CHUNK_SIZE)
    }

    fn ensure_capacity_for_one_more(&mut self) -> Result<(), ColumnError> {
        if self.length == self.num_chunks * CHUNK_SIZE {
            self.grow()?;
        }
        Ok(())
    }

    fn grow(&mut self) -> Result<(), ColumnError> {
        let new_total = if self.num_chunks == 0 { 1 } else { self.num_chunks * 2 };
        self.allocate_chunks(new_total - self.num_chunks)
    }

    fn allocate_chunks(&mut self, additional: usize) -> Result<(), ColumnError> {
        for _ in 0..additional {
            let idx = self.num_chunks;
            let chunk_key = self.make_key(idx, false);
            let missing_key = self.make_key(idx, true);
            let empty = LocalColumn::empty_of_size(self.cell_type, CHUNK_SIZE);
            self.persist_chunk_at(&chunk_key, &missing_key, &empty)?;
            self.chunk_keys.push(chunk_key);
            self.missing_keys.push(missing_key);
            self.num_chunks += 1;
        }
        Ok(())
    }

    fn make_key(&self, chunk_index: usize, is_missing: bool) -> Key {
        let name = if is_missing {
            format!("{}:{}:missing", self.column_id, chunk_index)
        } else {
            format!("{}:{}", self.column_id, chunk_index)
        };
        Key::new(name, chunk_index % self.n_nodes).expect("generated chunk key name is valid")
    }

    fn fetch_chunk(&mut self, chunk_index: usize) -> Result<&LocalColumn, ColumnError> {
        let already_cached = matches!(&self.cache, Some((idx, _)) if *idx == chunk_index);
        if !already_cached {
            let value_text = self
                .kv
                .get(&self.chunk_keys[chunk_index])?
                .ok_or(ColumnError::MissingChunk(chunk_index))?;
            let missing_text = self
                .kv
                .get(&self.missing_keys[chunk_index])?
                .ok_or(ColumnError::MissingChunk(chunk_index))?;
            let values = decode_array(self.cell_type, &value_text)?;
            let missing = decode_bool_array(&missing_text)?;
            self.cache = Some((chunk_index, LocalColumn::from_parts(self.cell_type, values, missing)));
        }
        Ok(&self.cache.as_ref().unwrap().1)
    }

    fn persist_chunk(&mut self, chunk_index: usize, local: &LocalColumn) -> Result<(), ColumnError> {
        let chunk_key = self.chunk_keys[chunk_index].clone();
        let missing_key = self.missing_keys[chunk_index].clone();
        self.persist_chunk_at(&chunk_key, &missing_key, local)
    }

    fn persist_chunk_at(&self, chunk_key: &Key, missing_key: &Key, local: &LocalColumn) -> Result<(), ColumnError> {
        let value_text = encode_array(local.values())?;
        let missing_text = encode_bool_array(local.missing());
        self.kv.put(chunk_key, &value_text)?;
        self.kv.put(missing_key, &missing_text)?;
        Ok(())
    }

    fn invalidate_cache(&mut self) {
        self.cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eau2_kv::KvStore;

    fn single_node_kv() -> Arc<KvStore> {
        KvStore::new(0)
    }

    #[test]
    fn push_back_then_get_round_trips_in_order() {
        let mut col = DistributedColumn::with_initial_chunks(CellType::I32, single_node_kv(), 1, 10).unwrap();
        for i in 0..2000 {
            col.push_back(CellValue::I32(i)).unwrap();
        }
        assert_eq!(col.len(), 2000);
        assert_eq!(col.num_chunks(), 20);
        for i in 0..2000 {
            assert_eq!(col.get(i).unwrap().value().as_i32(), Some(i as i32));
        }
    }

    #[test]
    fn set_overwrites_the_value_and_clears_missing() {
        let mut col = DistributedColumn::new(CellType::F32, single_node_kv(), 1).unwrap();
        col.push_back_missing().unwrap();
        assert!(col.is_missing(0).unwrap());
        col.set(0, CellValue::F32(7.5)).unwrap();
        assert!(!col.is_missing(0).unwrap());
        assert_eq!(col.get(0).unwrap().value().as_f32(), Some(7.5));
    }

    #[test]
    fn out_of_bounds_get_is_rejected() {
        let mut col = DistributedColumn::new(CellType::Bool, single_node_kv(), 1).unwrap();
        col.push_back(CellValue::Bool(true)).unwrap();
        assert!(matches!(col.get(1), Err(ColumnError::OutOfBounds { .. })));
    }

    #[test]
    fn directory_round_trips_into_a_working_handle() {
        let kv = single_node_kv();
        let mut col = DistributedColumn::new(CellType::I32, kv.clone(), 1).unwrap();
        for i in 0..5 {
            col.push_back(CellValue::I32(i)).unwrap();
        }
        let dir = col.directory();
        let mut reopened = DistributedColumn::from_directory(CellType::I32, kv, 1, dir);
        for i in 0..5 {
            assert_eq!(reopened.get(i).unwrap().value().as_i32(), Some(i as i32));
        }
    }

    #[test]
    fn chunk_index_offset_and_home_node_follow_the_formula() {
        let col = DistributedColumn::with_initial_chunks(CellType::I32, single_node_kv(), 3, 4).unwrap();
        for i in [0usize, 99, 100, 250, 399] {
            let (chunk_index, offset) = col.locate(i);
            assert_eq!(chunk_index, i / CHUNK_SIZE);
            assert_eq!(offset, i % CHUNK_SIZE);
            assert_eq!(col.chunk_keys[chunk_index].home_node(), chunk_index % 3);
        }
    }
}
