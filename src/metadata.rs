//! String table of the runtime's `global-metadata.dat`.
//!
//! The file is not encrypted. Its header holds, at 0x08, four little-endian
//! i32 fields: the string length table offset and size, then the string data
//! table offset and size. Each length table record is `[length:4][offset:4]`,
//! with `offset` relative to the data table.
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;

use crate::error::{DecryptError, Result};

const TABLES_OFFSET: u64 = 0x08;
const STRING_RECORD_LEN: usize = 8;

/// A parsed metadata file, borrowing the caller's bytes.
#[derive(Debug, Clone, Copy)]
pub struct GlobalMetadata<'a> {
    data: &'a [u8],
    pub string_lengths_start: usize,
    pub string_lengths_size: usize,
    pub string_data_start: usize,
    pub string_data_size: usize,
}

impl<'a> GlobalMetadata<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let mut reader = Cursor::new(data);
        reader.set_position(TABLES_OFFSET);

        let mut field = || -> Result<usize> {
            let value = reader
                .read_i32::<LittleEndian>()
                .map_err(|_| DecryptError::StructuralOverflow("metadata header truncated"))?;
            usize::try_from(value).map_err(|_| DecryptError::StructuralOverflow("negative metadata table field"))
        };

        let metadata = Self {
            data,
            string_lengths_start: field()?,
            string_lengths_size: field()?,
            string_data_start: field()?,
            string_data_size: field()?,
        };
        debug!(
            "metadata strings: lengths {:#X}+{:#X}, data {:#X}+{:#X}",
            metadata.string_lengths_start,
            metadata.string_lengths_size,
            metadata.string_data_start,
            metadata.string_data_size
        );
        Ok(metadata)
    }

    pub fn string_count(&self) -> usize {
        self.string_lengths_size / STRING_RECORD_LEN
    }

    /// String `index` of the table, decoded as UTF-8 with replacement.
    pub fn string_at(&self, index: usize) -> Result<String> {
        let record_at = index
            .checked_mul(STRING_RECORD_LEN)
            .and_then(|n| n.checked_add(self.string_lengths_start))
            .ok_or(DecryptError::StructuralOverflow("string record past end of metadata"))?;
        let record = self
            .data
            .get(record_at..)
            .filter(|rest| rest.len() >= STRING_RECORD_LEN)
            .ok_or(DecryptError::StructuralOverflow("string record past end of metadata"))?;

        let mut reader = Cursor::new(record);
        let len = reader.read_i32::<LittleEndian>()?;
        let offset = reader.read_i32::<LittleEndian>()?;

        let start = usize::try_from(offset)
            .ok()
            .and_then(|offset| offset.checked_add(self.string_data_start));
        let bytes = usize::try_from(len)
            .ok()
            .zip(start)
            .and_then(|(len, start)| self.data.get(start..start.checked_add(len)?))
            .ok_or(DecryptError::StructuralOverflow("string data past end of metadata"))?;

        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Every string of the table, in record order.
    pub fn entries(&self) -> Result<Vec<String>> {
        (0..self.string_count()).map(|i| self.string_at(i)).collect()
    }
}
