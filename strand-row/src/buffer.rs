//! Helpers for the backing array of a row.
//!
//! Rows are built by appending one column at a time and are rarely shrunk, so the helpers keep a
//! few spare slots past the logical length. The logical length lives in the schema, not in the
//! vector: slots past it are slack.

use strand_error::{StrandResult, strand_bail};
use strand_scalar::Slot;

use crate::Row;

/// The number of spare slots added whenever a row is allocated or grown.
pub const OVER_ALLOCATE: usize = 5;

/// A row with room for `n` values plus [`OVER_ALLOCATE`] spare slots, all null.
pub fn allocate(n: usize) -> Row {
    vec![None; n + OVER_ALLOCATE]
}

/// `row` itself when it already holds `min_len` slots, otherwise a copy with room for `min_len`
/// values plus the spare slots.
pub fn grow_if_needed(mut row: Row, min_len: usize) -> Row {
    if row.len() < min_len {
        row.resize(min_len + OVER_ALLOCATE, None);
    }
    row
}

/// Put `slot` at position `len`, growing the row when it is full.
pub fn append_slot(row: Row, len: usize, slot: Option<Slot>) -> Row {
    let mut row = grow_if_needed(row, len + 1);
    row[len] = slot;
    row
}

/// Set the logical length of `row` to `len`: a shorter row grows, slack past `len` is cleared.
pub fn resize(row: Row, len: usize) -> Row {
    let mut row = grow_if_needed(row, len);
    for slot in &mut row[len..] {
        *slot = None;
    }
    row
}

/// One row holding the first `lengths[i]` slots of `rows[i]`, in order.
pub fn concat(rows: &[&[Option<Slot>]], lengths: &[usize]) -> StrandResult<Row> {
    if rows.len() != lengths.len() {
        strand_bail!(
            InvalidArgument: "{} rows but {} lengths",
            rows.len(),
            lengths.len()
        );
    }
    let total = lengths.iter().sum();
    let mut out = allocate(total);
    let mut at = 0;
    for (row, &len) in rows.iter().zip(lengths) {
        if len > row.len() {
            strand_bail!(OutOfBounds: len, 0, row.len());
        }
        out[at..at + len].clone_from_slice(&row[..len]);
        at += len;
    }
    out.truncate(total);
    Ok(out)
}

/// An exactly sized copy of `row` without the slot at `index`.
pub fn remove_at(row: &[Option<Slot>], index: usize) -> StrandResult<Row> {
    if index >= row.len() {
        strand_bail!(OutOfBounds: index, 0, row.len());
    }
    let mut out = Vec::with_capacity(row.len() - 1);
    out.extend_from_slice(&row[..index]);
    out.extend_from_slice(&row[index + 1..]);
    Ok(out)
}

/// An exactly sized copy of `row` without the slots at `sorted_indices`, which must be strictly
/// ascending.
pub fn remove_many(row: &[Option<Slot>], sorted_indices: &[usize]) -> StrandResult<Row> {
    if let Some(pair) = sorted_indices.windows(2).find(|w| w[0] >= w[1]) {
        strand_bail!(InvalidArgument: "indices {} and {} are not ascending", pair[0], pair[1]);
    }
    if let Some(&last) = sorted_indices.last() {
        if last >= row.len() {
            strand_bail!(OutOfBounds: last, 0, row.len());
        }
    }
    let mut skip = sorted_indices.iter().peekable();
    let mut out = Vec::with_capacity(row.len() - sorted_indices.len());
    for (idx, slot) in row.iter().enumerate() {
        if skip.next_if_eq(&&idx).is_none() {
            out.push(slot.clone());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn row(values: &[i64]) -> Row {
        values.iter().map(|&v| Some(Slot::from(v))).collect()
    }

    #[test]
    fn allocate_leaves_slack() {
        let row = allocate(3);
        assert_eq!(row.len(), 3 + OVER_ALLOCATE);
        assert!(row.iter().all(Option::is_none));
    }

    #[test]
    fn growth_keeps_the_allocation_when_possible() {
        let row = allocate(4);
        let ptr = row.as_ptr();
        let same = grow_if_needed(row, 9);
        assert_eq!(same.as_ptr(), ptr);

        let grown = grow_if_needed(same, 10);
        assert_eq!(grown.len(), 10 + OVER_ALLOCATE);
    }

    #[test]
    fn append_grows_on_demand() {
        let mut r = Vec::new();
        for i in 0..7 {
            r = append_slot(r, i, Some(Slot::from(i as i64)));
        }
        assert_eq!(r[6], Some(Slot::from(6i64)));
        assert!(r.len() >= 7);
    }

    #[test]
    fn resize_clears_slack() {
        let r = resize(row(&[1, 2, 3]), 1);
        assert_eq!(r[0], Some(Slot::from(1i64)));
        assert!(r[1..].iter().all(Option::is_none));
    }

    #[test]
    fn concat_takes_logical_prefixes() {
        let a = row(&[1, 2, 99]);
        let b = row(&[3]);
        let joined = concat(&[&a, &b], &[2, 1]).unwrap();
        assert_eq!(joined, row(&[1, 2, 3]));
        assert!(concat(&[&a], &[4]).is_err());
        assert!(concat(&[&a], &[]).is_err());
    }

    #[rstest]
    #[case(0, &[2, 3])]
    #[case(1, &[1, 3])]
    #[case(2, &[1, 2])]
    fn remove_one(#[case] index: usize, #[case] expected: &[i64]) {
        let out = remove_at(&row(&[1, 2, 3]), index).unwrap();
        assert_eq!(out, row(expected));
        assert_eq!(out.capacity(), 2);
    }

    #[test]
    fn remove_several() {
        let r = row(&[0, 1, 2, 3, 4]);
        assert_eq!(remove_many(&r, &[0, 2, 4]).unwrap(), row(&[1, 3]));
        assert_eq!(remove_many(&r, &[]).unwrap(), r);
        assert!(remove_many(&r, &[2, 1]).is_err());
        assert!(remove_many(&r, &[5]).is_err());
    }

    proptest! {
        #[test]
        fn remove_many_keeps_the_rest_in_order(
            len in 0usize..40,
            picks in proptest::collection::btree_set(0usize..40, 0..10),
        ) {
            let values: Vec<i64> = (0..len as i64).collect();
            let indices: Vec<usize> = picks.into_iter().filter(|&i| i < len).collect();
            let out = remove_many(&row(&values), &indices).unwrap();
            let expected: Vec<i64> = values
                .iter()
                .enumerate()
                .filter(|(i, _)| !indices.contains(i))
                .map(|(_, &v)| v)
                .collect();
            prop_assert_eq!(out, row(&expected));
        }
    }
}
