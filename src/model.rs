//! Differential testing driver for [`OSTreapSet`].
//!
//! A [`StreamTester`] consumes a binary stream of mutation records, applies
//! each one to an `OSTreapSet<u16>` and to a plain sorted vector, and checks
//! the two against each other, together with every structural invariant of
//! the tree, after **every** record. The same driver backs the fuzz target
//! and the regression corpus in the integration tests.
//!
//! # Stream format
//!
//! Each record is one opcode byte followed by its operands; multi-byte
//! operands are little-endian. A truncated operand reads as zero and ends
//! the stream after its record. Unknown opcodes are skipped.
//!
//! | Code | Operands                  | Effect                                   |
//! |------|---------------------------|------------------------------------------|
//! | 0    | `u16` value               | insert one value                         |
//! | 1    | `u8` count, count × `u16` | insert many values                       |
//! | 2    | `u16` value               | remove by value                          |
//! | 3    | `u16` n                   | remove the `(n % len)`-th element        |
//! | 4    | `u16` x, `u16` y          | remove the rank range `[x', y']`, where  |
//! |      |                           | `x', y'` are reduced mod `len` and swapped into order |
//!
//! Opcodes 3 and 4 are no-ops on an empty set and then consume no operands.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use crate::OSTreapSet;
use crate::raw::{Handle, RawTreap};

const INSERT_SINGLE: u8 = 0;
const INSERT_MANY: u8 = 1;
const ERASE_VALUE: u8 = 2;
const ERASE_NTH: u8 = 3;
const ERASE_NTH_RANGE: u8 = 4;

/// Cursor over the raw byte stream.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn opcode(&mut self) -> Option<u8> {
        let byte = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    /// Reads a little-endian `u16`; a truncated read yields zero and jumps
    /// to the end of the stream.
    fn operand(&mut self) -> u16 {
        let Some(raw) = self.bytes.get(self.pos..self.pos + 2) else {
            self.pos = self.bytes.len();
            return 0;
        };
        self.pos += 2;
        u16::from_le_bytes([raw[0], raw[1]])
    }

    /// Reads a `u8` operand with the same truncation behavior.
    fn operand_byte(&mut self) -> u8 {
        let Some(&byte) = self.bytes.get(self.pos) else {
            self.pos = self.bytes.len();
            return 0;
        };
        self.pos += 1;
        byte
    }
}

/// Replays mutation streams against a set and a sorted-vector oracle.
///
/// # Examples
///
/// ```
/// use ostreap::model::StreamTester;
///
/// // insert 7, insert 7 again (collides), remove the 0th element
/// StreamTester::run(&[0, 7, 0, 0, 7, 0, 3, 0, 0]);
/// ```
///
/// # Panics
///
/// Panics as soon as the set disagrees with the oracle or any structural
/// invariant breaks.
pub struct StreamTester {
    set: OSTreapSet<u16>,
    oracle: Vec<u16>,
}

impl Default for StreamTester {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamTester {
    #[must_use]
    pub fn new() -> Self {
        StreamTester {
            set: OSTreapSet::new(),
            oracle: Vec::new(),
        }
    }

    /// Replays one stream on a fresh tester.
    pub fn run(bytes: &[u8]) {
        StreamTester::new().push(bytes);
    }

    /// The set under test.
    #[must_use]
    pub fn set(&self) -> &OSTreapSet<u16> {
        &self.set
    }

    /// The oracle: the sorted unique values the set must contain.
    #[must_use]
    pub fn oracle(&self) -> &[u16] {
        &self.oracle
    }

    /// Applies every record in `bytes`, checking all invariants after each.
    pub fn push(&mut self, bytes: &[u8]) {
        let mut reader = Reader::new(bytes);
        while let Some(opcode) = reader.opcode() {
            match opcode {
                INSERT_SINGLE => self.insert_single(&mut reader),
                INSERT_MANY => self.insert_many(&mut reader),
                ERASE_VALUE => self.erase_value(&mut reader),
                ERASE_NTH => self.erase_nth(&mut reader),
                ERASE_NTH_RANGE => self.erase_nth_range(&mut reader),
                // Reserved opcodes have no effect.
                _ => {}
            }
            self.check();
        }
    }

    fn insert_oracle(&mut self, value: u16) -> bool {
        match self.oracle.binary_search(&value) {
            Ok(_) => false,
            Err(at) => {
                self.oracle.insert(at, value);
                true
            }
        }
    }

    fn insert_single(&mut self, reader: &mut Reader<'_>) {
        let value = reader.operand();
        let fresh = self.insert_oracle(value);
        assert_eq!(self.set.insert(value), fresh, "insert({value}) disagreed with oracle");
    }

    fn insert_many(&mut self, reader: &mut Reader<'_>) {
        let count = usize::from(reader.operand_byte());

        let mut i = 0;
        while i < count && !reader.at_end() {
            let value = reader.operand();
            let fresh = self.insert_oracle(value);
            assert_eq!(self.set.insert(value), fresh, "insert({value}) disagreed with oracle");
            i += 1;
        }
    }

    fn erase_value(&mut self, reader: &mut Reader<'_>) {
        let value = reader.operand();
        match self.oracle.binary_search(&value) {
            Ok(at) => {
                assert_eq!(self.set.remove(&value), 1, "remove({value}) missed a present value");
                self.oracle.remove(at);
            }
            Err(_) => {
                assert_eq!(self.set.remove(&value), 0, "remove({value}) removed an absent value");
            }
        }
    }

    fn erase_nth(&mut self, reader: &mut Reader<'_>) {
        if self.set.is_empty() {
            return;
        }
        let n = usize::from(reader.operand()) % self.set.len();

        let expected = self.oracle.remove(n);
        assert_eq!(self.set.remove_by_rank(n), Some(expected), "remove_by_rank({n}) disagreed with oracle");
    }

    fn erase_nth_range(&mut self, reader: &mut Reader<'_>) {
        if self.set.is_empty() {
            return;
        }
        let mut x = usize::from(reader.operand()) % self.set.len();
        let mut y = usize::from(reader.operand()) % self.set.len();
        if x > y {
            core::mem::swap(&mut x, &mut y);
        }

        let removed = self.set.remove_rank_range(x..=y);
        assert_eq!(removed, y - x + 1, "remove_rank_range({x}..={y}) removed the wrong count");
        self.oracle.drain(x..=y);
    }

    /// Verifies every structural invariant and full oracle agreement.
    fn check(&self) {
        let raw = &self.set.raw;

        assert_eq!(self.set.len(), self.oracle.len(), "size disagrees with oracle");
        assert_eq!(self.set.is_empty(), self.oracle.is_empty());
        assert_eq!(raw.live_slots(), self.set.len(), "arena is leaking or double-freeing slots");

        if let Some(root) = raw.root() {
            assert!(raw.node(root).parent.is_none(), "root must not have a parent");
            let mut visited = BTreeSet::new();
            check_subtree(raw, root, &mut visited);
        }

        // Every element at its rank, with the full query surface agreeing.
        assert!(self.set.iter().eq(self.oracle.iter()), "in-order traversal disagrees with oracle");
        for (rank, &value) in self.oracle.iter().enumerate() {
            assert_eq!(self.set.get_by_rank(rank), Some(&value));
            assert_eq!(self.set.rank_of(&value), Some(rank));
            assert_eq!(self.set.count(&value), 1);
            assert!(self.set.contains(&value));
            assert_eq!(self.set.find(&value).rank(), rank);
            assert_eq!(self.set.lower_bound(&value).rank(), rank);
            assert_eq!(self.set.upper_bound(&value).rank(), rank + 1);

            // Probe a value inside the gap below, when there is one.
            if rank != 0 && self.oracle[rank - 1] + 1 < value {
                let probe = self.oracle[rank - 1] + 1;
                assert_eq!(self.set.count(&probe), 0);
                assert!(!self.set.contains(&probe));
                assert!(self.set.find(&probe).get().is_none());
                assert_eq!(self.set.lower_bound(&probe).rank(), rank);
                assert_eq!(self.set.upper_bound(&probe).rank(), rank);
            }
        }
        assert!(self.set.get_by_rank(self.oracle.len()).is_none());
    }
}

/// Recursive structural check: BST order, heap order, counts, parent links,
/// and no sharing of nodes between subtrees.
fn check_subtree(raw: &RawTreap<u16>, handle: Handle, visited: &mut BTreeSet<usize>) -> usize {
    assert!(visited.insert(handle.index()), "node reachable twice; the tree has a cycle");

    let node = raw.node(handle);
    let mut count = 1;

    if let Some(left) = node.left {
        let child = raw.node(left);
        assert!(node.priority >= child.priority, "heap order violated");
        assert!(child.key < node.key, "left child out of order");
        assert_eq!(child.parent, Some(handle), "left child's parent link broken");
        count += check_subtree(raw, left, visited);
    }
    if let Some(right) = node.right {
        let child = raw.node(right);
        assert!(node.priority >= child.priority, "heap order violated");
        assert!(child.key > node.key, "right child out of order");
        assert_eq!(child.parent, Some(handle), "right child's parent link broken");
        count += check_subtree(raw, right, visited);
    }

    assert_eq!(node.count, count, "subtree count out of step");
    count
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn empty_stream() {
        StreamTester::run(&[]);
    }

    #[test]
    fn insert_erase_round_trip() {
        let mut stream = vec![];
        for value in [5u16, 1, 9, 5] {
            stream.push(INSERT_SINGLE);
            stream.extend_from_slice(&value.to_le_bytes());
        }
        stream.push(ERASE_VALUE);
        stream.extend_from_slice(&5u16.to_le_bytes());

        let mut tester = StreamTester::new();
        tester.push(&stream);
        assert_eq!(tester.oracle(), &[1, 9]);
    }

    #[test]
    fn insert_many_then_erase_nth() {
        // 1: count 3, values 30, 10, 20; 3: erase rank (7 % 3) == 1.
        let stream = [1, 3, 30, 0, 10, 0, 20, 0, 3, 7, 0];

        let mut tester = StreamTester::new();
        tester.push(&stream);
        assert_eq!(tester.oracle(), &[10, 30]);
    }

    #[test]
    fn erase_range_swaps_inverted_operands() {
        let mut stream = vec![1, 5, 1, 0, 2, 0, 3, 0, 4, 0, 5, 0];
        // 4: x = 3, y = 1 -> removes ranks 1..=3.
        stream.extend_from_slice(&[4, 3, 0, 1, 0]);

        let mut tester = StreamTester::new();
        tester.push(&stream);
        assert_eq!(tester.oracle(), &[1, 5]);
    }

    #[test]
    fn truncated_operand_reads_zero() {
        // A lone opcode 0 with a one-byte tail inserts 0 and stops cleanly.
        let mut tester = StreamTester::new();
        tester.push(&[0, 1]);
        assert_eq!(tester.oracle(), &[0]);
    }

    #[test]
    fn unknown_opcodes_are_skipped() {
        let mut tester = StreamTester::new();
        tester.push(&[250, 0, 7, 0]);
        assert_eq!(tester.oracle(), &[7]);
    }

    #[test]
    fn erase_on_empty_consumes_no_operands() {
        // Opcode 3 on an empty set is a no-op; the next byte is an opcode.
        let mut tester = StreamTester::new();
        tester.push(&[3, 0, 42, 0]);
        assert_eq!(tester.oracle(), &[42]);
    }
}
