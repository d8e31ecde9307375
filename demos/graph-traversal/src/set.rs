use eau2_frame::{RowWriter, Rower};
use eau2_value::{CellValue, Row};

/// A fixed-size membership set over row indices 0..size, used to track which users/projects are
/// "tagged" as within N degrees of the seed user, matching the original source's `Set::set`/
/// `Set::test`: an out-of-bound `set` is silently ignored, but an out-of-bound `test` reports
/// `true` rather than `false` — a pid/uid a commit references but that never showed up in the
/// sampled projects/users file is treated as already a collaborator, not as absent.
#[derive(Clone, Debug)]
pub struct Set(Vec<bool>);

impl Set {
    pub fn new(size: usize) -> Self {
        Set(vec![false; size])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn set(&mut self, idx: usize) {
        if idx < self.0.len() {
            self.0[idx] = true;
        }
    }

    pub fn test(&self, idx: usize) -> bool {
        idx >= self.0.len() || self.0[idx]
    }

    pub fn union_(&mut self, other: &Set) {
        for (i, v) in other.0.iter().enumerate() {
            if *v {
                self.set(i);
            }
        }
    }

    pub fn num_true(&self) -> usize {
        self.0.iter().filter(|b| **b).count()
    }
}

/// Reads an integer-column frame and marks each value's index in its own set. Used both to turn a
/// delta-of-new-indices frame back into a `Set`, and (via `join`) to fold per-worker deltas back
/// together.
pub struct SetUpdater {
    pub set: Set,
}

impl Rower for SetUpdater {
    fn accept(&mut self, row: &mut Row) -> bool {
        self.set.set(row.get_int(0) as usize);
        false
    }

    fn clone_for_fork(&self) -> Self {
        SetUpdater { set: Set::new(self.set.len()) }
    }

    fn join(&mut self, other: Self) {
        self.set.union_(&other.set);
    }
}

/// Writes the `true` indices of a set out as a one-column `I32` frame, in ascending order.
pub struct SetWriter<'a> {
    set: &'a Set,
    next: usize,
}

impl<'a> SetWriter<'a> {
    pub fn new(set: &'a Set) -> Self {
        SetWriter { set, next: 0 }
    }

    fn advance_to_next_true(&mut self) {
        while self.next < self.set.len() && !self.set.test(self.next) {
            self.next += 1;
        }
    }
}

impl RowWriter for SetWriter<'_> {
    fn next(&mut self, row: &mut Row) {
        self.advance_to_next_true();
        row.set(0, CellValue::I32(self.next as i32));
        self.next += 1;
    }

    fn done(&self) -> bool {
        let mut probe = self.next;
        while probe < self.set.len() && !self.set.test(probe) {
            probe += 1;
        }
        probe == self.set.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_writer_emits_only_true_indices_in_order() {
        let mut set = Set::new(5);
        set.set(1);
        set.set(4);
        let mut writer = SetWriter::new(&set);

        assert!(!writer.done());
        let mut row = Row::from_types(&[eau2_value::CellType::I32]);
        writer.next(&mut row);
        assert_eq!(row.get_int(0), 1);
        writer.next(&mut row);
        assert_eq!(row.get_int(0), 4);
        assert!(writer.done());
    }

    #[test]
    fn union_combines_two_sets() {
        let mut a = Set::new(4);
        a.set(0);
        let mut b = Set::new(4);
        b.set(2);
        a.union_(&b);
        assert!(a.test(0));
        assert!(a.test(2));
        assert_eq!(a.num_true(), 2);
    }

    #[test]
    fn out_of_bound_sets_are_ignored_but_out_of_bound_tests_report_true() {
        let mut set = Set::new(2);
        set.set(10);
        assert_eq!(set.num_true(), 0);
        assert!(set.test(10));
    }
}
