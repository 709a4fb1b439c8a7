/*!
 Contains logic to parse a binary plist stream back into a value tree.

 Parsing validates the header, reads the fixed 32-byte trailer, loads the
 offset table, and decodes one [`Descriptor`] per object table index. Arrays
 and dictionaries are decoded into lightweight descriptors holding only their
 child reference lists; resolution into nested values happens afterwards,
 recursively, with bounds and cycle checks on every reference.

 The reader is strict about the framing regions (header, trailer, offsets) but
 deliberately tolerant of malformed references inside the object table: an
 element or entry whose reference is out of bounds, points back into a
 container currently being resolved, or nests deeper than
 [`MAX_RESOLVE_DEPTH`] is silently dropped from its containing collection
 instead of failing the whole parse.
*/

use std::io::{Read, Seek, SeekFrom};

use crate::{
    codec::{markers, models::Descriptor},
    error::reader::PlistReaderError,
    util::dates,
    value::{Dictionary, Value},
};

/// Deepest container nesting the resolver will materialize; resolution
/// recurses once per level, so an unbounded chain of single-element containers
/// would otherwise exhaust the stack before any cycle guard could fire
pub(crate) const MAX_RESOLVE_DEPTH: usize = 512;

/// Parses binary plist data from a seekable stream
#[derive(Debug)]
pub struct BinaryPlistReader<R> {
    /// The stream holding the plist; objects are located via offset-table jumps
    stream: R,
    /// Total length of the stream in bytes
    stream_length: u64,
    /// Width in bytes of each offset table entry
    offset_int_size: u8,
    /// Width in bytes of each object reference
    object_ref_size: u8,
    /// Number of entries in the object table
    object_count: u64,
    /// Object table index of the root value
    root_index: u64,
    /// Byte offset at which the offset table starts
    offset_table_start: u64,
}

impl<R: Read + Seek> BinaryPlistReader<R> {
    pub fn new(stream: R) -> Self {
        Self {
            stream,
            stream_length: 0,
            offset_int_size: 0,
            object_ref_size: 0,
            object_count: 0,
            root_index: 0,
            offset_table_start: 0,
        }
    }

    /// Parse the stream into its root value
    ///
    /// Fails on a bad header, an inconsistent trailer, or a truncated stream.
    /// Malformed references inside containers are tolerated; the affected
    /// collection just comes back with fewer entries than its declared count.
    pub fn read_object(&mut self) -> Result<Value, PlistReaderError> {
        self.validate_header()?;
        self.read_trailer()?;

        let offsets = self.read_offset_table()?;
        let mut table = Vec::with_capacity(offsets.len());

        for (index, &offset) in offsets.iter().enumerate() {
            if offset < markers::HEADER_LENGTH || offset >= self.offset_table_start {
                return Err(PlistReaderError::InvalidOffset(index as u64, offset));
            }

            self.stream
                .seek(SeekFrom::Start(offset))
                .map_err(PlistReaderError::Io)?;
            table.push(self.read_entry()?);
        }

        let root = usize::try_from(self.root_index)
            .map_err(|_| PlistReaderError::InvalidRootReference(self.root_index))?;
        if root >= table.len() {
            return Err(PlistReaderError::InvalidRootReference(self.root_index));
        }

        let mut in_flight = vec![false; table.len()];
        Ok(resolve_entry(&table, root, &mut in_flight, 0))
    }

    /// Validate the 8-byte `bplist00` magic at the start of the stream
    fn validate_header(&mut self) -> Result<(), PlistReaderError> {
        self.stream_length = self
            .stream
            .seek(SeekFrom::End(0))
            .map_err(PlistReaderError::Io)?;

        let minimum = markers::HEADER_LENGTH + markers::TRAILER_LENGTH;
        if self.stream_length < minimum {
            return Err(PlistReaderError::Truncated(self.stream_length, minimum));
        }

        self.stream
            .seek(SeekFrom::Start(0))
            .map_err(PlistReaderError::Io)?;
        let header = self.read_array::<8>()?;

        if header[..4] != markers::MAGIC || header[4..] != markers::VERSION {
            return Err(PlistReaderError::InvalidHeader);
        }

        Ok(())
    }

    /// Parse the fixed trailer: 6 reserved bytes, the two width bytes, then
    /// object count, root index, and offset table start as 8-byte big-endian fields
    fn read_trailer(&mut self) -> Result<(), PlistReaderError> {
        self.stream
            .seek(SeekFrom::End(-(markers::TRAILER_LENGTH as i64)))
            .map_err(PlistReaderError::Io)?;
        let trailer = self.read_array::<32>()?;

        self.offset_int_size = trailer[6];
        self.object_ref_size = trailer[7];
        self.object_count = u64::from_be_bytes(
            trailer[8..16]
                .try_into()
                .map_err(PlistReaderError::SliceError)?,
        );
        self.root_index = u64::from_be_bytes(
            trailer[16..24]
                .try_into()
                .map_err(PlistReaderError::SliceError)?,
        );
        self.offset_table_start = u64::from_be_bytes(
            trailer[24..32]
                .try_into()
                .map_err(PlistReaderError::SliceError)?,
        );

        if !matches!(self.offset_int_size, 1 | 2 | 4 | 8)
            || !matches!(self.object_ref_size, 1 | 2 | 4 | 8)
        {
            return Err(PlistReaderError::InvalidTrailer);
        }

        // Every object occupies at least one byte, so the count can never
        // exceed the stream length; the offset table plus trailer must also
        // fit between the table start and the end of the stream
        let table_bytes = self
            .object_count
            .checked_mul(u64::from(self.offset_int_size))
            .and_then(|bytes| bytes.checked_add(self.offset_table_start))
            .and_then(|bytes| bytes.checked_add(markers::TRAILER_LENGTH))
            .ok_or(PlistReaderError::InvalidTrailer)?;

        if self.object_count > self.stream_length
            || self.offset_table_start < markers::HEADER_LENGTH
            || table_bytes > self.stream_length
        {
            return Err(PlistReaderError::InvalidTrailer);
        }

        Ok(())
    }

    fn read_offset_table(&mut self) -> Result<Vec<u64>, PlistReaderError> {
        self.stream
            .seek(SeekFrom::Start(self.offset_table_start))
            .map_err(PlistReaderError::Io)?;

        let mut offsets = Vec::with_capacity(self.object_count as usize);
        for _ in 0..self.object_count {
            offsets.push(self.read_sized_integer(self.offset_int_size)?);
        }

        Ok(offsets)
    }

    /// Decode one tagged object at the current stream position
    fn read_entry(&mut self) -> Result<Descriptor, PlistReaderError> {
        let marker = self.read_byte()?;

        match marker & 0xF0 {
            0x00 => match marker {
                markers::NULL => Ok(Descriptor::Null),
                markers::FALSE => Ok(Descriptor::Boolean(false)),
                markers::TRUE => Ok(Descriptor::Boolean(true)),
                _ => Err(PlistReaderError::UnknownMarker(marker)),
            },
            markers::INTEGER => Ok(Descriptor::Integer(self.read_integer(marker & 0x0F)?)),
            markers::REAL => Ok(Descriptor::Real(self.read_real(marker & 0x0F)?)),
            0x30 => {
                if marker == markers::DATE {
                    self.read_date()
                } else {
                    Err(PlistReaderError::UnknownMarker(marker))
                }
            }
            markers::DATA => {
                let length = self.read_length(marker)?;
                Ok(Descriptor::Data(self.read_exact_bytes(length)?))
            }
            markers::ASCII_STRING => {
                let length = self.read_length(marker)?;
                let bytes = self.read_exact_bytes(length)?;
                let text = std::str::from_utf8(&bytes)
                    .map_err(PlistReaderError::StringParseError)?;
                Ok(Descriptor::String(text.to_string()))
            }
            markers::UNICODE_STRING => {
                // The stored length counts UTF-16 code units, not bytes
                let length = self.read_length(marker)?;
                let mut units = Vec::with_capacity(length);
                for _ in 0..length {
                    units.push(u16::from_be_bytes(self.read_array::<2>()?));
                }
                let text =
                    String::from_utf16(&units).map_err(PlistReaderError::Utf16ParseError)?;
                Ok(Descriptor::String(text))
            }
            markers::ARRAY => {
                let count = self.read_length(marker)?;
                Ok(Descriptor::Array(self.read_references(count)?))
            }
            markers::DICTIONARY => {
                let count = self.read_length(marker)?;
                let keys = self.read_references(count)?;
                let values = self.read_references(count)?;
                Ok(Descriptor::Dictionary { keys, values })
            }
            _ => Err(PlistReaderError::UnknownMarker(marker)),
        }
    }

    /// Read a signed integer of the given log2 width, sign-extending to 64 bits
    fn read_integer(&mut self, width_log: u8) -> Result<i64, PlistReaderError> {
        match width_log {
            0 => Ok(i64::from(self.read_array::<1>()?[0] as i8)),
            1 => Ok(i64::from(i16::from_be_bytes(self.read_array::<2>()?))),
            2 => Ok(i64::from(i32::from_be_bytes(self.read_array::<4>()?))),
            3 => Ok(i64::from_be_bytes(self.read_array::<8>()?)),
            _ => Err(PlistReaderError::InvalidIntegerWidth(width_log)),
        }
    }

    /// Read a float of the given log2 width; singles are widened to doubles
    fn read_real(&mut self, width_log: u8) -> Result<f64, PlistReaderError> {
        match width_log {
            2 => Ok(f64::from(f32::from_be_bytes(self.read_array::<4>()?))),
            3 => Ok(f64::from_be_bytes(self.read_array::<8>()?)),
            _ => Err(PlistReaderError::InvalidRealWidth(width_log)),
        }
    }

    fn read_date(&mut self) -> Result<Descriptor, PlistReaderError> {
        let seconds = f64::from_be_bytes(self.read_array::<8>()?);
        dates::from_reference_seconds(seconds)
            .map(Descriptor::Date)
            .ok_or(PlistReaderError::InvalidDate(seconds))
    }

    /// Read a length from a marker's low nibble, or from the marker-less
    /// integer that follows when the nibble holds the extended-length flag
    fn read_length(&mut self, marker: u8) -> Result<usize, PlistReaderError> {
        let nibble = marker & 0x0F;

        let length = if nibble == markers::EXTENDED_LENGTH {
            self.read_markerless_integer()?
        } else {
            u64::from(nibble)
        };

        // A declared length can never exceed the stream itself
        if length > self.stream_length {
            return Err(PlistReaderError::InvalidLength(length));
        }

        usize::try_from(length).map_err(|_| PlistReaderError::InvalidLength(length))
    }

    /// Read the marker-less integer form: a log2 width byte followed by the
    /// big-endian value
    fn read_markerless_integer(&mut self) -> Result<u64, PlistReaderError> {
        let width_log = self.read_byte()?;

        match width_log {
            0 => Ok(u64::from(self.read_array::<1>()?[0])),
            1 => Ok(u64::from(u16::from_be_bytes(self.read_array::<2>()?))),
            2 => Ok(u64::from(u32::from_be_bytes(self.read_array::<4>()?))),
            3 => Ok(u64::from_be_bytes(self.read_array::<8>()?)),
            _ => Err(PlistReaderError::InvalidIntegerWidth(width_log)),
        }
    }

    fn read_references(&mut self, count: usize) -> Result<Vec<u64>, PlistReaderError> {
        let mut references = Vec::with_capacity(count);
        for _ in 0..count {
            references.push(self.read_sized_integer(self.object_ref_size)?);
        }
        Ok(references)
    }

    /// Read a big-endian unsigned integer of `size` bytes
    fn read_sized_integer(&mut self, size: u8) -> Result<u64, PlistReaderError> {
        let bytes = self.read_exact_bytes(size as usize)?;
        Ok(bytes.iter().fold(0u64, |value, byte| value << 8 | u64::from(*byte)))
    }

    fn read_byte(&mut self) -> Result<u8, PlistReaderError> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PlistReaderError> {
        let mut buffer = [0u8; N];
        self.stream
            .read_exact(&mut buffer)
            .map_err(PlistReaderError::Io)?;
        Ok(buffer)
    }

    fn read_exact_bytes(&mut self, n: usize) -> Result<Vec<u8>, PlistReaderError> {
        let mut buffer = vec![0u8; n];
        self.stream
            .read_exact(&mut buffer)
            .map_err(PlistReaderError::Io)?;
        Ok(buffer)
    }
}

/// Materialize the table entry at `index` into a nested value
///
/// `in_flight` marks every container on the current resolution path; a
/// reference that points at an in-flight index would recurse forever, so it is
/// treated the same as an out-of-bounds reference and dropped. `depth` counts
/// the container levels above this entry and caps recursion at
/// [`MAX_RESOLVE_DEPTH`].
fn resolve_entry(table: &[Descriptor], index: usize, in_flight: &mut [bool], depth: usize) -> Value {
    match &table[index] {
        Descriptor::Null => Value::Null,
        Descriptor::Boolean(value) => Value::Boolean(*value),
        Descriptor::Integer(value) => Value::Integer(*value),
        Descriptor::Real(value) => Value::Real(*value),
        Descriptor::Date(date) => Value::Date(*date),
        Descriptor::Data(bytes) => Value::Data(bytes.clone()),
        Descriptor::String(text) => Value::String(text.clone()),
        Descriptor::Array(references) => {
            in_flight[index] = true;

            let mut items = Vec::with_capacity(references.len());
            for reference in references {
                if let Some(item) = resolve_child(table, *reference, in_flight, depth + 1) {
                    items.push(item);
                }
            }

            in_flight[index] = false;
            Value::Array(items)
        }
        Descriptor::Dictionary { keys, values } => {
            in_flight[index] = true;

            let mut entries = Dictionary::with_capacity(keys.len());
            for (key_reference, value_reference) in keys.iter().zip(values) {
                let Some(key) = resolve_child(table, *key_reference, in_flight, depth + 1) else {
                    continue;
                };
                let Some(value) = resolve_child(table, *value_reference, in_flight, depth + 1)
                else {
                    continue;
                };
                let Some(name) = dictionary_key(&key) else {
                    continue;
                };
                entries.insert(name, value);
            }

            in_flight[index] = false;
            Value::Dictionary(entries)
        }
    }
}

/// Dereference a child, or [`None`] if the reference is out of bounds, cyclic,
/// or nested too deeply to resolve
fn resolve_child(
    table: &[Descriptor],
    reference: u64,
    in_flight: &mut [bool],
    depth: usize,
) -> Option<Value> {
    let index = usize::try_from(reference).ok()?;

    if depth > MAX_RESOLVE_DEPTH || index >= table.len() || in_flight[index] {
        return None;
    }

    Some(resolve_entry(table, index, in_flight, depth))
}

/// Dictionary keys must resolve to strings for lookup; scalar number and
/// boolean keys are stringified, anything else marks the pair as malformed
fn dictionary_key(key: &Value) -> Option<String> {
    match key {
        Value::String(text) => Some(text.clone()),
        Value::Integer(value) => Some(value.to_string()),
        Value::Real(value) => Some(value.to_string()),
        Value::Boolean(value) => Some(value.to_string()),
        _ => None,
    }
}
