use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::Serialize;
use zvision_formats::{read_state_table, write_state_table, SaveError};

/// Sparse key -> value and key -> flag tables. Absent keys read as zero and
/// zero is never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateTable {
    values: BTreeMap<u32, i32>,
    flags: BTreeMap<u32, u32>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, key: u32) -> i32 {
        self.values.get(&key).copied().unwrap_or(0)
    }

    pub fn flags(&self, key: u32) -> u32 {
        self.flags.get(&key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: u32) -> bool {
        self.values.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = (u32, i32)> + '_ {
        self.values.iter().map(|(&key, &value)| (key, value))
    }

    /// Writes the value without notifying dependents. Returns the previous
    /// value.
    pub(crate) fn store_value(&mut self, key: u32, value: i32) -> i32 {
        let previous = if value == 0 {
            self.values.remove(&key)
        } else {
            self.values.insert(key, value)
        };
        previous.unwrap_or(0)
    }

    pub(crate) fn insert_flags(&mut self, key: u32, mask: u32) {
        if mask != 0 {
            *self.flags.entry(key).or_insert(0) |= mask;
        }
    }

    pub(crate) fn remove_flags(&mut self, key: u32, mask: u32) {
        if let Some(current) = self.flags.get_mut(&key) {
            *current &= !mask;
            if *current == 0 {
                self.flags.remove(&key);
            }
        }
    }

    /// Persists the value table. Flags are rebuilt from scripts on load and
    /// are not written.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), SaveError> {
        write_state_table(writer, self.values())
    }

    /// Replaces every value with the persisted table. Zero entries are
    /// dropped; dependents are not notified.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<(), SaveError> {
        let pairs = read_state_table(reader)?;
        self.values = pairs.into_iter().filter(|&(_, value)| value != 0).collect();
        Ok(())
    }
}
