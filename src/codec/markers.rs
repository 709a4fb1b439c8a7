/*!
 Marker bytes and fixed field sizes used by the binary plist wire format.

 Every object in the table starts with a single marker byte. The high nibble
 selects the type; for variable-length types the low nibble holds the length
 when it is smaller than [`EXTENDED_LENGTH`], otherwise the length follows as
 a marker-less integer.
*/

/// First half of the 8-byte header magic
pub const MAGIC: [u8; 4] = *b"bpli";
/// Second half of the header, doubling as the format version
pub const VERSION: [u8; 4] = *b"st00";

/// Length of the header region in bytes
pub const HEADER_LENGTH: u64 = 8;
/// Length of the fixed trailer region in bytes
pub const TRAILER_LENGTH: u64 = 32;

/// A null value; a bare marker with no payload
pub const NULL: u8 = 0x00;
/// Boolean `false`; a bare marker with no payload
pub const FALSE: u8 = 0x08;
/// Boolean `true`; a bare marker with no payload
pub const TRUE: u8 = 0x09;
/// An integer; the low nibble is the log2 of the payload byte width
pub const INTEGER: u8 = 0x10;
/// A floating-point number; the low nibble is the log2 of the payload byte width
pub const REAL: u8 = 0x20;
/// A date; always followed by an 8-byte big-endian double
pub const DATE: u8 = 0x33;
/// Raw bytes; the low nibble is the byte count
pub const DATA: u8 = 0x40;
/// A string of 7-bit characters; the low nibble is the character count
pub const ASCII_STRING: u8 = 0x50;
/// A string of UTF-16BE code units; the low nibble is the unit count, not the byte count
pub const UNICODE_STRING: u8 = 0x60;
/// An array; the low nibble is the element count
pub const ARRAY: u8 = 0xA0;
/// A dictionary; the low nibble is the entry count
pub const DICTIONARY: u8 = 0xD0;

/// Low-nibble value indicating the real length follows as a marker-less integer
pub const EXTENDED_LENGTH: u8 = 0x0F;
