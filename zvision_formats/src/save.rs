//! Persisted state-table layout: a little-endian `u32` pair count followed by
//! that many `(key, value)` little-endian `u32` pairs.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("state table truncated: expected {expected} pairs, read {read}")]
    Truncated { expected: u32, read: u32 },
    #[error("state table holds {0} entries, more than the format can count")]
    TooManyEntries(usize),
    #[error("state table i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes `entries` in iteration order. Values are stored as their raw
/// two's-complement bits.
pub fn write_state_table<W, I>(writer: &mut W, entries: I) -> Result<(), SaveError>
where
    W: Write,
    I: IntoIterator<Item = (u32, i32)>,
    I::IntoIter: ExactSizeIterator,
{
    let entries = entries.into_iter();
    let count = u32::try_from(entries.len()).map_err(|_| SaveError::TooManyEntries(entries.len()))?;
    writer.write_u32::<LittleEndian>(count)?;
    for (key, value) in entries {
        writer.write_u32::<LittleEndian>(key)?;
        writer.write_u32::<LittleEndian>(value as u32)?;
    }
    Ok(())
}

pub fn read_state_table<R: Read>(reader: &mut R) -> Result<Vec<(u32, i32)>, SaveError> {
    let expected = reader.read_u32::<LittleEndian>()?;
    let mut pairs = Vec::with_capacity(expected.min(4096) as usize);
    for read in 0..expected {
        match read_pair(reader) {
            Ok(pair) => pairs.push(pair),
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(SaveError::Truncated { expected, read });
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(pairs)
}

fn read_pair<R: Read>(reader: &mut R) -> std::io::Result<(u32, i32)> {
    let key = reader.read_u32::<LittleEndian>()?;
    let value = reader.read_u32::<LittleEndian>()?;
    Ok((key, value as i32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn layout_is_count_then_little_endian_pairs() {
        let mut bytes = Vec::new();
        write_state_table(&mut bytes, vec![(3, 0x67), (40, -1)]).expect("write table");
        assert_eq!(
            bytes,
            vec![
                2, 0, 0, 0, //
                3, 0, 0, 0, 0x67, 0, 0, 0, //
                40, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF,
            ]
        );

        let pairs = read_state_table(&mut Cursor::new(bytes)).expect("read table");
        assert_eq!(pairs, vec![(3, 0x67), (40, -1)]);
    }

    #[test]
    fn truncated_tables_are_rejected() {
        let mut bytes = Vec::new();
        write_state_table(&mut bytes, vec![(1, 1), (2, 2)]).expect("write table");
        bytes.truncate(bytes.len() - 2);

        let err = read_state_table(&mut Cursor::new(bytes)).expect_err("truncated");
        assert!(matches!(
            err,
            SaveError::Truncated {
                expected: 2,
                read: 1
            }
        ));
    }
}
