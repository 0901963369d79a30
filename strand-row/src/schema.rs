use std::cmp::Ordering;
use std::fmt::Write as _;
use std::hash::Hasher;

use itertools::Itertools;
use rustc_hash::FxHasher;
use strand_dtype::BigDecimal;
use strand_dtype::jiff::Timestamp;
use strand_error::{StrandResult, strand_bail, strand_err};
use strand_scalar::{Slot, ValueDescriptor};

use crate::Row;

fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
        || a.chars()
            .flat_map(char::to_lowercase)
            .eq(b.chars().flat_map(char::to_lowercase))
}

/// The ordered column descriptors shared by every row of a pipeline link.
///
/// Column names are unique without regard to case. Adding a column whose name is taken renames
/// the incoming column to `name_2`, `name_3` and so on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSchema {
    descriptors: Vec<ValueDescriptor>,
}

impl RowSchema {
    /// An empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// A schema over `descriptors`, renaming collisions in order.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ValueDescriptor>) -> Self {
        let mut schema = Self::new();
        for descriptor in descriptors {
            schema.append(descriptor);
        }
        schema
    }

    /// The number of columns.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Iterate the column descriptors in order.
    pub fn iter(&self) -> impl Iterator<Item = &ValueDescriptor> + '_ {
        self.descriptors.iter()
    }

    /// The column names in order.
    pub fn field_names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name()).collect()
    }

    /// The position of the column called `name`, compared without regard to case.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.descriptors.iter().position(|d| same_name(d.name(), name))
    }

    /// The column called `name`.
    pub fn search(&self, name: &str) -> Option<&ValueDescriptor> {
        self.index_of(name).map(|idx| &self.descriptors[idx])
    }

    /// Whether a column called `name` exists.
    pub fn exists(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// The column at `index`.
    pub fn descriptor(&self, index: usize) -> StrandResult<&ValueDescriptor> {
        self.descriptors
            .get(index)
            .ok_or_else(|| strand_err!(OutOfBounds: index, 0, self.descriptors.len()))
    }

    fn descriptor_mut(&mut self, index: usize) -> StrandResult<&mut ValueDescriptor> {
        let len = self.descriptors.len();
        self.descriptors
            .get_mut(index)
            .ok_or_else(|| strand_err!(OutOfBounds: index, 0, len))
    }

    /// Change the column at `index` in place, for the negotiation phase.
    ///
    /// Column names stay unique: if `f` renames the column to a name another column already has,
    /// the old name is restored and a schema error is returned. Every other change `f` made is
    /// kept.
    pub fn update_at<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut ValueDescriptor) -> R,
    ) -> StrandResult<R> {
        let descriptor = self.descriptor_mut(index)?;
        let before = descriptor.name().to_string();
        let out = f(descriptor);
        let after = descriptor.name().to_string();
        if after != before {
            let taken = self
                .descriptors
                .iter()
                .enumerate()
                .any(|(i, d)| i != index && same_name(d.name(), &after));
            if taken {
                let err = strand_err!(Schema: "cannot rename column {} to {}: name is taken", before, after);
                self.descriptors[index].set_name(before);
                return Err(err);
            }
            log::debug!("renamed column {} to {}", before, after);
        }
        Ok(out)
    }

    /// The column called `name`, failing with a schema error when there is none.
    pub fn require(&self, name: &str) -> StrandResult<usize> {
        self.index_of(name)
            .ok_or_else(|| strand_err!(Schema: "no column named {} in [{}]", name, self.field_names().join(", ")))
    }

    /// The first free name among `name`, `name_2`, `name_3`, ….
    fn unique_name(&self, name: &str) -> String {
        if !self.exists(name) {
            return name.to_string();
        }
        (2usize..)
            .map(|n| format!("{}_{}", name, n))
            .find(|candidate| !self.exists(candidate))
            .unwrap_or_else(|| name.to_string())
    }

    fn admit(&self, mut descriptor: ValueDescriptor) -> ValueDescriptor {
        let name = self.unique_name(descriptor.name());
        if name != descriptor.name() {
            log::debug!("column {} already exists, renamed to {}", descriptor.name(), name);
            descriptor.set_name(name);
        }
        descriptor
    }

    /// Add a column at the end, returning its position.
    pub fn append(&mut self, descriptor: ValueDescriptor) -> usize {
        let descriptor = self.admit(descriptor);
        self.descriptors.push(descriptor);
        self.descriptors.len() - 1
    }

    /// Add a column at `index`, shifting later columns right.
    pub fn insert_at(&mut self, index: usize, descriptor: ValueDescriptor) -> StrandResult<()> {
        if index > self.descriptors.len() {
            strand_bail!(OutOfBounds: index, 0, self.descriptors.len());
        }
        let descriptor = self.admit(descriptor);
        self.descriptors.insert(index, descriptor);
        Ok(())
    }

    /// Append every column of `other`, renaming collisions.
    pub fn merge(&mut self, other: &RowSchema) {
        log::debug!(
            "merging [{}] into [{}]",
            other.field_names().join(", "),
            self.field_names().join(", ")
        );
        for descriptor in other.iter() {
            self.append(descriptor.clone());
        }
    }

    /// Remove the column at `index`.
    pub fn remove_at(&mut self, index: usize) -> StrandResult<ValueDescriptor> {
        if index >= self.descriptors.len() {
            strand_bail!(OutOfBounds: index, 0, self.descriptors.len());
        }
        let removed = self.descriptors.remove(index);
        log::debug!("removed column {} at {}", removed.name(), index);
        Ok(removed)
    }

    /// Remove the column called `name`.
    pub fn remove_by_name(&mut self, name: &str) -> StrandResult<ValueDescriptor> {
        let index = self.require(name)?;
        self.remove_at(index)
    }

    /// Rename the column at `index`. The name must not belong to another column.
    pub fn rename_at(&mut self, index: usize, name: &str) -> StrandResult<()> {
        if let Some(existing) = self.index_of(name) {
            if existing != index {
                strand_bail!(Schema: "cannot rename column {} to {}: name is taken", index, name);
            }
        }
        let descriptor = self.descriptor_mut(index)?;
        log::debug!("renamed column {} to {}", descriptor.name(), name);
        descriptor.set_name(name);
        Ok(())
    }

    fn column<'r>(&self, row: &'r [Option<Slot>], index: usize) -> StrandResult<(&ValueDescriptor, Option<&'r Slot>)> {
        let descriptor = self.descriptor(index)?;
        Ok((descriptor, row.get(index).and_then(Option::as_ref)))
    }

    /// Order two rows by the columns at `keys`, in key order.
    pub fn compare_rows(&self, a: &[Option<Slot>], b: &[Option<Slot>], keys: &[usize]) -> StrandResult<Ordering> {
        for &key in keys {
            let (descriptor, left) = self.column(a, key)?;
            let right = b.get(key).and_then(Option::as_ref);
            match descriptor.compare(left, right)? {
                Ordering::Equal => {}
                other => return Ok(other),
            }
        }
        Ok(Ordering::Equal)
    }

    /// Whether two rows are equal on the columns at `keys`.
    pub fn rows_equal(&self, a: &[Option<Slot>], b: &[Option<Slot>], keys: &[usize]) -> StrandResult<bool> {
        Ok(self.compare_rows(a, b, keys)? == Ordering::Equal)
    }

    /// A hash of the columns at `keys`, consistent with [`RowSchema::rows_equal`].
    pub fn hash_row(&self, row: &[Option<Slot>], keys: &[usize]) -> StrandResult<u64> {
        let mut hasher = FxHasher::default();
        for &key in keys {
            let (descriptor, slot) = self.column(row, key)?;
            hasher.write_u64(descriptor.hash(slot)?);
        }
        Ok(hasher.finish())
    }

    /// A deep copy of `row` that shares no byte buffers with it.
    pub fn clone_row(&self, row: &[Option<Slot>]) -> Row {
        row.iter()
            .map(|slot| slot.as_ref().map(Slot::deep_copy))
            .collect()
    }

    /// A human readable rendering, `[name=text, …]`, with `<null>` for nulls.
    pub fn row_to_display(&self, row: &[Option<Slot>]) -> StrandResult<String> {
        let mut out = String::from("[");
        for (index, descriptor) in self.descriptors.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            let slot = row.get(index).and_then(Option::as_ref);
            match descriptor.as_text(slot)? {
                Some(text) if !descriptor.is_null(slot) => {
                    let _ = write!(out, "{}={}", descriptor.name(), text);
                }
                _ => {
                    let _ = write!(out, "{}=<null>", descriptor.name());
                }
            }
        }
        out.push(']');
        Ok(out)
    }
}

macro_rules! typed_getters {
    ($($(#[$doc:meta])* $get:ident, $by_name:ident, $accessor:ident -> $ty:ty;)*) => {
        impl RowSchema {
            $(
                $(#[$doc])*
                pub fn $get(&self, row: &[Option<Slot>], index: usize) -> StrandResult<Option<$ty>> {
                    let (descriptor, slot) = self.column(row, index)?;
                    Ok(descriptor.$accessor(slot)?.map(Into::into))
                }

                $(#[$doc])*
                ///
                /// The column is looked up by name, without regard to case.
                pub fn $by_name(&self, row: &[Option<Slot>], name: &str) -> StrandResult<Option<$ty>> {
                    self.$get(row, self.require(name)?)
                }
            )*
        }
    };
}

typed_getters! {
    /// The value at `index` as text.
    get_text, get_text_by_name, as_text -> String;
    /// The value at `index` as an integer.
    get_integer, get_integer_by_name, as_integer -> i64;
    /// The value at `index` as a double.
    get_float, get_float_by_name, as_float -> f64;
    /// The value at `index` as a boolean.
    get_boolean, get_boolean_by_name, as_boolean -> bool;
    /// The value at `index` as an instant.
    get_date, get_date_by_name, as_date -> Timestamp;
    /// The value at `index` as a decimal.
    get_decimal, get_decimal_by_name, as_decimal -> BigDecimal;
}

impl<'a> IntoIterator for &'a RowSchema {
    type Item = &'a ValueDescriptor;
    type IntoIter = std::slice::Iter<'a, ValueDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

impl FromIterator<ValueDescriptor> for RowSchema {
    fn from_iter<T: IntoIterator<Item = ValueDescriptor>>(iter: T) -> Self {
        Self::from_descriptors(iter)
    }
}

/// Column names joined for log and error messages.
pub(crate) fn describe(schema: &RowSchema) -> String {
    schema.iter().map(|d| format!("{}:{}", d.name(), d.logical_type())).join(", ")
}
