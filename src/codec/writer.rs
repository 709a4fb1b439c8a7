/*!
 Contains logic to serialize a value tree into the binary plist wire format.

 Encoding happens in two passes. The first pass walks the tree depth-first and
 flattens it into the object table: a container is appended before its children
 are visited, and each child's table index is recorded in the container's
 reference list before the next sibling is walked. The second pass serializes
 the table in index order while recording each entry's byte offset, then emits
 the offset table and the fixed 32-byte trailer.

 Equal values are never deduplicated; every occurrence in the tree becomes its
 own table entry.
*/

use std::io::{Seek, SeekFrom, Write};

use chrono::{DateTime, Utc};

use crate::{
    codec::{markers, models::TableEntry},
    error::writer::PlistWriterError,
    util::dates,
    value::{Dictionary, Value},
};

/// Serializes value trees rooted at a dictionary to a seekable stream
#[derive(Debug, Default)]
pub struct BinaryPlistWriter<'a> {
    /// Flat table of every value in the tree, root at index 0
    object_table: Vec<TableEntry<'a>>,
    /// Byte offset of each serialized table entry, measured from the start of the stream
    offset_table: Vec<u64>,
    /// Width in bytes of every object reference in this plist
    object_ref_size: u8,
}

impl<'a> BinaryPlistWriter<'a> {
    pub fn new() -> Self {
        Self {
            object_table: vec![],
            offset_table: vec![],
            object_ref_size: 0,
        }
    }

    /// Write the given dictionary to the stream as a complete binary plist
    ///
    /// The stream must be seekable: dictionary reference blocks are written
    /// into pre-reserved space and backfilled, because the key block and the
    /// value block are laid out contiguously but computed pairwise.
    pub fn write_object<W: Write + Seek>(
        &mut self,
        stream: &mut W,
        dictionary: &'a Dictionary,
    ) -> Result<(), PlistWriterError> {
        self.reset();
        self.add_dictionary(dictionary);

        if self.object_table.len() > u32::MAX as usize {
            return Err(PlistWriterError::TableOverflow(self.object_table.len()));
        }
        self.object_ref_size = byte_size_for_count(self.object_table.len());

        stream.write_all(&markers::MAGIC).map_err(PlistWriterError::Io)?;
        stream.write_all(&markers::VERSION).map_err(PlistWriterError::Io)?;

        self.write_object_table(stream)?;

        let offset_table_start = stream.stream_position().map_err(PlistWriterError::Io)?;
        let offset_int_size = byte_size_for_offset(offset_table_start);

        for index in 0..self.offset_table.len() {
            write_sized_integer(stream, self.offset_table[index], offset_int_size)?;
        }

        // Trailer: 6 reserved bytes, the two width bytes, then three fixed 8-byte fields
        stream.write_all(&[0u8; 6]).map_err(PlistWriterError::Io)?;
        stream
            .write_all(&[offset_int_size, self.object_ref_size])
            .map_err(PlistWriterError::Io)?;
        stream
            .write_all(&(self.object_table.len() as u64).to_be_bytes())
            .map_err(PlistWriterError::Io)?;
        stream.write_all(&0u64.to_be_bytes()).map_err(PlistWriterError::Io)?;
        stream
            .write_all(&offset_table_start.to_be_bytes())
            .map_err(PlistWriterError::Io)?;

        Ok(())
    }

    fn reset(&mut self) {
        self.object_table.clear();
        self.offset_table.clear();
        self.object_ref_size = 0;
    }

    /// Append a value to the object table and return its reference index
    fn add_value(&mut self, value: &'a Value) -> u32 {
        match value {
            Value::Array(items) => self.add_array(items),
            Value::Dictionary(entries) => self.add_dictionary(entries),
            _ => {
                let index = self.object_table.len() as u32;
                self.object_table.push(TableEntry::Scalar(value));
                index
            }
        }
    }

    /// Append a dictionary key to the object table and return its reference index
    fn add_key(&mut self, key: &'a str) -> u32 {
        let index = self.object_table.len() as u32;
        self.object_table.push(TableEntry::Key(key));
        index
    }

    fn add_array(&mut self, items: &'a [Value]) -> u32 {
        let index = self.object_table.len() as u32;
        self.object_table
            .push(TableEntry::Array(Vec::with_capacity(items.len())));

        for item in items {
            let reference = self.add_value(item);
            if let TableEntry::Array(references) = &mut self.object_table[index as usize] {
                references.push(reference);
            }
        }

        index
    }

    fn add_dictionary(&mut self, dictionary: &'a Dictionary) -> u32 {
        let index = self.object_table.len() as u32;
        self.object_table.push(TableEntry::Dictionary {
            keys: Vec::with_capacity(dictionary.len()),
            values: Vec::with_capacity(dictionary.len()),
        });

        for (key, value) in dictionary {
            let key_reference = self.add_key(key);
            if let TableEntry::Dictionary { keys, .. } = &mut self.object_table[index as usize] {
                keys.push(key_reference);
            }

            let value_reference = self.add_value(value);
            if let TableEntry::Dictionary { values, .. } = &mut self.object_table[index as usize] {
                values.push(value_reference);
            }
        }

        index
    }

    /// Serialize every table entry in index order, recording each entry's start offset
    fn write_object_table<W: Write + Seek>(
        &mut self,
        stream: &mut W,
    ) -> Result<(), PlistWriterError> {
        for index in 0..self.object_table.len() {
            let offset = stream.stream_position().map_err(PlistWriterError::Io)?;
            self.offset_table.push(offset);

            match &self.object_table[index] {
                TableEntry::Scalar(value) => write_scalar(stream, value)?,
                TableEntry::Key(key) => write_string(stream, key)?,
                TableEntry::Array(references) => {
                    write_array(stream, references, self.object_ref_size)?;
                }
                TableEntry::Dictionary { keys, values } => {
                    write_dictionary(stream, keys, values, self.object_ref_size)?;
                }
            }
        }

        Ok(())
    }
}

/// Number of bytes needed to reference the given number of objects
pub(crate) fn byte_size_for_count(count: usize) -> u8 {
    let mut size = 1;

    if count > 255 {
        size = 2;
    }

    if count > 65_535 {
        size = 4;
    }

    size
}

/// Number of bytes needed to store offsets up to the given value
pub(crate) fn byte_size_for_offset(offset: u64) -> u8 {
    if offset <= 0xFF {
        1
    } else if offset <= 0xFFFF {
        2
    } else if offset <= 0xFFFF_FFFF {
        4
    } else {
        8
    }
}

/// Big-endian bytes of the smallest of {1, 2, 4, 8} byte widths that
/// losslessly represents the value; the 1-byte form is only used for 0..=127
pub(crate) fn integer_bytes(value: i64) -> Vec<u8> {
    if (0..128).contains(&value) {
        vec![value as u8]
    } else if value >= i64::from(i16::MIN) && value <= i64::from(i16::MAX) {
        (value as i16).to_be_bytes().to_vec()
    } else if value >= i64::from(i32::MIN) && value <= i64::from(i32::MAX) {
        (value as i32).to_be_bytes().to_vec()
    } else {
        value.to_be_bytes().to_vec()
    }
}

/// Write the low `size` bytes of the value big-endian, zero-padded
pub(crate) fn write_sized_integer<W: Write>(
    stream: &mut W,
    value: u64,
    size: u8,
) -> Result<(), PlistWriterError> {
    let bytes = value.to_be_bytes();
    stream
        .write_all(&bytes[8 - size as usize..])
        .map_err(PlistWriterError::Io)
}

/// Write a type marker whose low nibble holds the length, falling back to the
/// extended form when the length does not fit in a nibble
fn write_marker<W: Write>(stream: &mut W, marker: u8, length: usize) -> Result<(), PlistWriterError> {
    if length < markers::EXTENDED_LENGTH as usize {
        stream
            .write_all(&[marker | length as u8])
            .map_err(PlistWriterError::Io)
    } else {
        stream
            .write_all(&[marker | markers::EXTENDED_LENGTH])
            .map_err(PlistWriterError::Io)?;
        write_markerless_integer(stream, length as i64)
    }
}

fn write_scalar<W: Write>(stream: &mut W, value: &Value) -> Result<(), PlistWriterError> {
    match value {
        Value::Null => write_primitive(stream, None),
        Value::Boolean(value) => write_primitive(stream, Some(*value)),
        Value::Integer(value) => write_integer(stream, *value),
        Value::Real(value) => write_real(stream, *value),
        Value::Date(date) => write_date(stream, date),
        Value::Data(bytes) => write_data(stream, bytes),
        Value::String(text) => write_string(stream, text),
        // Containers get dedicated table entries in `add_value`
        Value::Array(_) | Value::Dictionary(_) => unreachable!(),
    }
}

/// Write a null or boolean; a single marker byte with no payload
pub(crate) fn write_primitive<W: Write>(
    stream: &mut W,
    value: Option<bool>,
) -> Result<(), PlistWriterError> {
    let marker = match value {
        None => markers::NULL,
        Some(false) => markers::FALSE,
        Some(true) => markers::TRUE,
    };
    stream.write_all(&[marker]).map_err(PlistWriterError::Io)
}

pub(crate) fn write_integer<W: Write>(stream: &mut W, value: i64) -> Result<(), PlistWriterError> {
    let bytes = integer_bytes(value);
    let marker = markers::INTEGER | bytes.len().trailing_zeros() as u8;

    stream.write_all(&[marker]).map_err(PlistWriterError::Io)?;
    stream.write_all(&bytes).map_err(PlistWriterError::Io)
}

/// Write an integer in the marker-less form used for extended lengths: the
/// log2 of the byte width followed by the big-endian value
pub(crate) fn write_markerless_integer<W: Write>(
    stream: &mut W,
    value: i64,
) -> Result<(), PlistWriterError> {
    let bytes = integer_bytes(value);

    stream
        .write_all(&[bytes.len().trailing_zeros() as u8])
        .map_err(PlistWriterError::Io)?;
    stream.write_all(&bytes).map_err(PlistWriterError::Io)
}

/// Reals are always widened to an 8-byte double on write
pub(crate) fn write_real<W: Write>(stream: &mut W, value: f64) -> Result<(), PlistWriterError> {
    stream
        .write_all(&[markers::REAL | 0x03])
        .map_err(PlistWriterError::Io)?;
    stream
        .write_all(&value.to_be_bytes())
        .map_err(PlistWriterError::Io)
}

pub(crate) fn write_date<W: Write>(
    stream: &mut W,
    date: &DateTime<Utc>,
) -> Result<(), PlistWriterError> {
    stream.write_all(&[markers::DATE]).map_err(PlistWriterError::Io)?;
    stream
        .write_all(&dates::to_reference_seconds(date).to_be_bytes())
        .map_err(PlistWriterError::Io)
}

pub(crate) fn write_data<W: Write>(stream: &mut W, bytes: &[u8]) -> Result<(), PlistWriterError> {
    write_marker(stream, markers::DATA, bytes.len())?;
    stream.write_all(bytes).map_err(PlistWriterError::Io)
}

/// All-ASCII strings are written byte per character; anything else is written
/// as UTF-16BE code units with the length counted in units, not bytes
pub(crate) fn write_string<W: Write>(stream: &mut W, text: &str) -> Result<(), PlistWriterError> {
    if text.is_ascii() {
        write_marker(stream, markers::ASCII_STRING, text.len())?;
        stream.write_all(text.as_bytes()).map_err(PlistWriterError::Io)
    } else {
        let units: Vec<u16> = text.encode_utf16().collect();
        write_marker(stream, markers::UNICODE_STRING, units.len())?;

        for unit in units {
            stream
                .write_all(&unit.to_be_bytes())
                .map_err(PlistWriterError::Io)?;
        }

        Ok(())
    }
}

fn write_array<W: Write>(
    stream: &mut W,
    references: &[u32],
    reference_size: u8,
) -> Result<(), PlistWriterError> {
    write_marker(stream, markers::ARRAY, references.len())?;

    for reference in references {
        write_sized_integer(stream, u64::from(*reference), reference_size)?;
    }

    Ok(())
}

/// The key block and value block are contiguous, so entries are seeked into
/// pre-reserved space pairwise and the stream is left at the end of both blocks
fn write_dictionary<W: Write + Seek>(
    stream: &mut W,
    keys: &[u32],
    values: &[u32],
    reference_size: u8,
) -> Result<(), PlistWriterError> {
    write_marker(stream, markers::DICTIONARY, keys.len())?;

    let start = stream.stream_position().map_err(PlistWriterError::Io)?;
    let skip = keys.len() as u64 * u64::from(reference_size);

    for (index, (key, value)) in keys.iter().zip(values).enumerate() {
        let position = start + index as u64 * u64::from(reference_size);

        stream
            .seek(SeekFrom::Start(position))
            .map_err(PlistWriterError::Io)?;
        write_sized_integer(stream, u64::from(*key), reference_size)?;

        stream
            .seek(SeekFrom::Start(position + skip))
            .map_err(PlistWriterError::Io)?;
        write_sized_integer(stream, u64::from(*value), reference_size)?;
    }

    stream
        .seek(SeekFrom::Start(start + skip * 2))
        .map_err(PlistWriterError::Io)?;

    Ok(())
}
