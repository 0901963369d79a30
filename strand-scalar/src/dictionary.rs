use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::race::OnceBox;
use parking_lot::Mutex;
use strand_error::{StrandResult, strand_err};

use crate::Value;

const FIRST_BUCKET: usize = 32;
// bucket `b` holds FIRST_BUCKET << b entries; 28 buckets cover every u32 index
const BUCKETS: usize = 28;

/// The ordered, distinct native values referenced by DICTIONARY slots.
///
/// A dictionary is shared by every clone of the descriptor that owns it and only ever grows, so
/// an index handed out by [`Dictionary::intern`] stays valid for the life of the dictionary.
/// Reads never lock: entries live in fixed buckets that are published once and never move.
/// Only [`Dictionary::intern`] of a new value takes the writer lock.
#[derive(Clone, Default)]
pub struct Dictionary {
    entries: Arc<Entries>,
}

struct Entries {
    buckets: [OnceBox<Vec<OnceBox<Value>>>; BUCKETS],
    len: AtomicUsize,
    writer: Mutex<()>,
}

impl Default for Entries {
    fn default() -> Self {
        Self {
            buckets: std::array::from_fn(|_| OnceBox::new()),
            len: AtomicUsize::new(0),
            writer: Mutex::new(()),
        }
    }
}

/// The bucket and the offset inside it that hold entry `index`.
fn locate(index: usize) -> (usize, usize) {
    let shifted = index + FIRST_BUCKET;
    let bucket = (shifted.ilog2() - FIRST_BUCKET.ilog2()) as usize;
    (bucket, shifted - (FIRST_BUCKET << bucket))
}

impl Entries {
    fn get(&self, index: usize) -> Option<&Value> {
        if index >= self.len.load(Ordering::Acquire) {
            return None;
        }
        let (bucket, offset) = locate(index);
        self.buckets[bucket].get()?.get(offset)?.get()
    }

    fn position(&self, from: usize, to: usize, value: &Value) -> Option<usize> {
        (from..to).find(|&idx| self.get(idx) == Some(value))
    }

    /// Append `value`. The caller holds the writer lock.
    fn push(&self, value: Value) -> StrandResult<u32> {
        let len = self.len.load(Ordering::Relaxed);
        let idx = index(len)?;
        let (bucket, offset) = locate(len);
        let slots = self.buckets[bucket].get_or_init(|| {
            Box::new((0..FIRST_BUCKET << bucket).map(|_| OnceBox::new()).collect())
        });
        if slots[offset].set(Box::new(value)).is_err() {
            return Err(strand_err!("dictionary entry {} was already published", len));
        }
        self.len.store(len + 1, Ordering::Release);
        Ok(idx)
    }
}

impl Dictionary {
    /// An empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// A dictionary holding `values`, with duplicates dropped.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        let dict = Self::new();
        for value in values {
            // only fails once every u32 index is taken
            if dict.intern(value).is_err() {
                break;
            }
        }
        dict
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len.load(Ordering::Acquire)
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The entry at `index`.
    pub fn get(&self, index: u32) -> Option<&Value> {
        self.entries.get(index as usize)
    }

    /// Run `f` on the entry at `index`.
    pub fn with_value<R>(&self, index: u32, f: impl FnOnce(&Value) -> R) -> Option<R> {
        self.get(index).map(f)
    }

    /// The index of `value`, appending it first if it is not present yet.
    pub fn intern(&self, value: Value) -> StrandResult<u32> {
        let seen = self.len();
        if let Some(idx) = self.entries.position(0, seen, &value) {
            return index(idx);
        }
        let _writer = self.entries.writer.lock();
        // Another writer may have appended the same value since the scan.
        let len = self.len();
        if let Some(idx) = self.entries.position(seen, len, &value) {
            return index(idx);
        }
        log::trace!("dictionary grows to {} entries", len + 1);
        self.entries.push(value)
    }

    /// A snapshot of all entries in index order.
    pub fn values(&self) -> Vec<Value> {
        self.iter().cloned().collect()
    }

    /// The entries in index order, as published when the iterator was created.
    pub fn iter(&self) -> impl Iterator<Item = &Value> + '_ {
        (0..self.len()).filter_map(|idx| self.entries.get(idx))
    }

    /// Whether both handles refer to the same shared storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

fn index(idx: usize) -> StrandResult<u32> {
    u32::try_from(idx).map_err(|_| strand_err!(InvalidArgument: "dictionary index {} exceeds u32", idx))
}

impl Debug for Dictionary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Dictionaries are equal when they hold the same entries in the same order.
impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.iter().eq(other.iter())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use rstest::rstest;

    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let dict = Dictionary::new();
        assert_eq!(dict.intern(Value::from("a")).unwrap(), 0);
        assert_eq!(dict.intern(Value::from("b")).unwrap(), 1);
        assert_eq!(dict.intern(Value::from("a")).unwrap(), 0);
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn clones_share_storage() {
        let dict = Dictionary::from_values([Value::from(false), Value::from(true), Value::from(true)]);
        let clone = dict.clone();
        assert_eq!(clone.len(), 2);
        clone.intern(Value::from("x")).unwrap();
        assert_eq!(dict.get(2), Some(&Value::from("x")));
        assert!(dict.ptr_eq(&clone));
        assert_eq!(dict.with_value(1, |v| v.clone()), Some(Value::from(true)));
        assert_eq!(dict.get(9), None);
    }

    #[rstest]
    #[case(0, (0, 0))]
    #[case(31, (0, 31))]
    #[case(32, (1, 0))]
    #[case(95, (1, 63))]
    #[case(96, (2, 0))]
    #[case(u32::MAX as usize, (BUCKETS - 1, 31))]
    fn buckets_cover_every_index(#[case] index: usize, #[case] expected: (usize, usize)) {
        let (bucket, offset) = locate(index);
        assert_eq!((bucket, offset), expected);
        assert!(offset < FIRST_BUCKET << bucket);
    }

    #[test]
    fn entries_survive_bucket_growth() {
        let dict = Dictionary::new();
        for i in 0..1000i64 {
            assert_eq!(dict.intern(Value::from(i)).unwrap(), i as u32);
        }
        assert_eq!(dict.len(), 1000);
        assert_eq!(dict.get(999), Some(&Value::from(999i64)));
        assert!(dict.values().iter().zip(0i64..).all(|(v, i)| *v == Value::from(i)));
    }

    #[test]
    fn concurrent_interning_agrees_on_indexes() {
        let dict = Dictionary::new();
        let indexes: Vec<Vec<u32>> = thread::scope(|s| {
            let workers: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(|| {
                        (0..200i64)
                            .map(|i| dict.intern(Value::from(i % 50)).unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        assert_eq!(dict.len(), 50);
        for per_worker in &indexes {
            for (i, idx) in per_worker.iter().enumerate() {
                assert_eq!(dict.get(*idx), Some(&Value::from(i as i64 % 50)));
            }
        }
    }
}
