//! Distributed data frames: a schema plus a vector of chunked, KV-backed columns (§4.7).

mod frame;
mod rower;

pub use frame::DistributedDataFrame;
pub use rower::{RowWriter, Rower};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use eau2_kv::KvStore;
    use eau2_value::{CellType, CellValue, Key, Row};

    use super::*;

    fn single_node_kv() -> Arc<KvStore> {
        KvStore::new(0)
    }

    struct SumRower {
        total: i32,
    }

    impl Rower for SumRower {
        fn accept(&mut self, row: &mut Row) -> bool {
            self.total += row.get_int(0);
            true
        }

        fn clone_for_fork(&self) -> Self {
            SumRower { total: 0 }
        }

        fn join(&mut self, other: Self) {
            self.total += other.total;
        }
    }

    #[test]
    fn add_column_requires_matching_length() {
        let kv = single_node_kv();
        let mut frame = DistributedDataFrame::empty(vec![CellType::I32], kv.clone(), 1).unwrap();
        let mut row = Row::from_types(&[CellType::I32]);
        row.set(0, CellValue::I32(1));
        frame.add_row(&row).unwrap();

        let empty_col = eau2_column::DistributedColumn::new(CellType::Str, kv.clone(), 1).unwrap();
        assert!(matches!(
            frame.add_column(empty_col),
            Err(eau2_errors::FrameError::LengthMismatch { expected: 1, got: 0 })
        ));

        let mut matching_col = eau2_column::DistributedColumn::new(CellType::Str, kv, 1).unwrap();
        matching_col.push_back(CellValue::Str("x".to_string())).unwrap();
        assert!(frame.add_column(matching_col).is_ok());
        assert_eq!(frame.n_cols(), 2);
        assert_eq!(frame.schema().width(), 2);
    }

    #[test]
    fn set_rejects_a_type_mismatch() {
        let kv = single_node_kv();
        let mut frame = DistributedDataFrame::empty(vec![CellType::I32], kv, 1).unwrap();
        let mut row = Row::from_types(&[CellType::I32]);
        row.set(0, CellValue::I32(1));
        frame.add_row(&row).unwrap();

        assert!(matches!(
            frame.set(0, 0, CellValue::Bool(true)),
            Err(eau2_errors::FrameError::TypeMismatch { column: 0 })
        ));
        frame.set(0, 0, CellValue::I32(42)).unwrap();
        assert_eq!(frame.get(0, 0).unwrap().value().as_i32(), Some(42));
    }

    #[test]
    fn get_and_is_missing_report_out_of_range_columns() {
        let kv = single_node_kv();
        let frame = DistributedDataFrame::empty(vec![CellType::I32], kv, 1).unwrap();
        assert!(matches!(frame.get(5, 0), Err(eau2_errors::FrameError::NoSuchColumn(5))));
        assert!(matches!(
            frame.is_missing(5, 0),
            Err(eau2_errors::FrameError::NoSuchColumn(5))
        ));
    }

    #[test]
    fn map_visits_every_row_and_sums_a_column() {
        let kv = single_node_kv();
        let mut frame = DistributedDataFrame::empty(vec![CellType::I32], kv, 1).unwrap();
        for i in 0..10 {
            let mut row = Row::from_types(&[CellType::I32]);
            row.set(0, CellValue::I32(i));
            frame.add_row(&row).unwrap();
        }
        let mut rower = SumRower { total: 0 };
        frame.map(&mut rower).unwrap();
        assert_eq!(rower.total, (0..10).sum());
    }

    #[test]
    fn local_map_only_visits_rows_whose_chunk_is_home_to_this_node() {
        let kv = single_node_kv();
        let mut frame = DistributedDataFrame::empty(vec![CellType::I32], kv, 1).unwrap();
        for i in 0..10 {
            let mut row = Row::from_types(&[CellType::I32]);
            row.set(0, CellValue::I32(i));
            frame.add_row(&row).unwrap();
        }
        let mut rower = SumRower { total: 0 };
        frame.local_map(&mut rower).unwrap();
        // Single-node cluster: every chunk is home to node 0, so local_map matches map.
        assert_eq!(rower.total, (0..10).sum());
    }

    struct EvenFilter;

    impl Rower for EvenFilter {
        fn accept(&mut self, row: &mut Row) -> bool {
            row.get_int(0) % 2 == 0
        }

        fn clone_for_fork(&self) -> Self {
            EvenFilter
        }

        fn join(&mut self, _other: Self) {}
    }

    #[test]
    fn filter_keeps_only_accepted_rows() {
        let kv = single_node_kv();
        let mut frame = DistributedDataFrame::empty(vec![CellType::I32], kv, 1).unwrap();
        for i in 0..6 {
            let mut row = Row::from_types(&[CellType::I32]);
            row.set(0, CellValue::I32(i));
            frame.add_row(&row).unwrap();
        }
        let filtered = frame.filter(&mut EvenFilter).unwrap();
        assert_eq!(filtered.n_rows(), 3);
        for r in 0..3 {
            assert_eq!(filtered.get(0, r).unwrap().value().as_i32().unwrap() % 2, 0);
        }
    }

    #[test]
    fn parallel_map_sums_the_same_total_as_a_sequential_map() {
        let kv = single_node_kv();
        let mut frame = DistributedDataFrame::empty(vec![CellType::I32], kv, 1).unwrap();
        for i in 0..97 {
            let mut row = Row::from_types(&[CellType::I32]);
            row.set(0, CellValue::I32(i));
            frame.add_row(&row).unwrap();
        }
        let mut rower = SumRower { total: 0 };
        frame.parallel_map(&mut rower, 4).unwrap();
        assert_eq!(rower.total, (0..97).sum());
    }

    #[test]
    fn from_array_publishes_and_reads_back_a_single_column_frame() {
        let kv = single_node_kv();
        let key = Key::new("nums", 0).unwrap();
        let values = [CellValue::I32(1), CellValue::I32(2), CellValue::I32(3)];
        DistributedDataFrame::from_array(CellType::I32, &values, kv.clone(), 1, &key).unwrap();

        let reopened = DistributedDataFrame::read(&key, kv, 1).unwrap();
        assert_eq!(reopened.n_rows(), 3);
        for (i, v) in values.iter().enumerate() {
            assert_eq!(reopened.get(0, i).unwrap().value(), v);
        }
    }

    #[test]
    fn from_scalar_round_trips_a_single_value() {
        let kv = single_node_kv();
        let key = Key::new("scalar", 0).unwrap();
        DistributedDataFrame::from_scalar(CellValue::F32(7.5), kv.clone(), 1, &key).unwrap();

        let reopened = DistributedDataFrame::read(&key, kv, 1).unwrap();
        assert_eq!(reopened.n_rows(), 1);
        assert_eq!(reopened.get(0, 0).unwrap().value().as_f32(), Some(7.5));
    }

    struct FixedRows {
        rows: Vec<(i32, Option<String>)>,
        next: usize,
    }

    impl RowWriter for FixedRows {
        fn next(&mut self, row: &mut Row) {
            let (n, s) = self.rows[self.next].clone();
            row.set(0, CellValue::I32(n));
            match s {
                Some(s) => row.set(1, CellValue::Str(s)),
                None => row.set_missing(1),
            }
            self.next += 1;
        }

        fn done(&self) -> bool {
            self.next >= self.rows.len()
        }
    }

    #[test]
    fn publish_and_read_preserve_missing_bits_across_a_mixed_schema() {
        let kv = single_node_kv();
        let key = Key::new("mixed", 0).unwrap();
        let mut writer = FixedRows {
            rows: vec![
                (1, Some("a".to_string())),
                (2, None),
                (3, Some("c".to_string())),
            ],
            next: 0,
        };
        DistributedDataFrame::from_writer(vec![CellType::I32, CellType::Str], &mut writer, kv.clone(), 1, &key)
            .unwrap();

        let mut reopened = DistributedDataFrame::read(&key, kv, 1).unwrap();
        assert_eq!(reopened.n_rows(), 3);
        assert!(!reopened.is_missing(1, 0).unwrap());
        assert!(reopened.is_missing(1, 1).unwrap());
        assert!(!reopened.is_missing(1, 2).unwrap());
        assert_eq!(reopened.get(0, 1).unwrap().value().as_i32(), Some(2));

        reopened.set(1, 1, CellValue::Str("filled-in".to_string())).unwrap();
        assert!(!reopened.is_missing(1, 1).unwrap());
    }
}
