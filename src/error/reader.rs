/*!
 Errors that can happen when parsing binary plist data.
*/

use std::{
    array::TryFromSliceError,
    fmt::{Display, Formatter, Result},
    io::Error as IoError,
    str::Utf8Error,
    string::FromUtf16Error,
};

/// Errors that can happen when parsing binary plist data
#[derive(Debug)]
pub enum PlistReaderError {
    Io(IoError),
    InvalidHeader,
    InvalidTrailer,
    Truncated(u64, u64),
    InvalidOffset(u64, u64),
    UnknownMarker(u8),
    InvalidIntegerWidth(u8),
    InvalidRealWidth(u8),
    InvalidLength(u64),
    SliceError(TryFromSliceError),
    StringParseError(Utf8Error),
    Utf16ParseError(FromUtf16Error),
    InvalidDate(f64),
    InvalidRootReference(u64),
    RootNotDictionary,
}

impl Display for PlistReaderError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            PlistReaderError::Io(why) => write!(fmt, "Unable to read from stream: {why}"),
            PlistReaderError::InvalidHeader => write!(fmt, "Invalid binary plist header!"),
            PlistReaderError::InvalidTrailer => write!(fmt, "Invalid binary plist trailer!"),
            PlistReaderError::Truncated(have, need) => {
                write!(fmt, "Stream is {have} bytes but at least {need} are required!")
            }
            PlistReaderError::InvalidOffset(index, offset) => {
                write!(fmt, "Object {index} has offset {offset:x} outside of the object table region!")
            }
            PlistReaderError::UnknownMarker(marker) => {
                write!(fmt, "Unknown object marker: {marker:#04x}")
            }
            PlistReaderError::InvalidIntegerWidth(width) => {
                write!(fmt, "Invalid integer width: {width}")
            }
            PlistReaderError::InvalidRealWidth(width) => {
                write!(fmt, "Invalid real width: {width}")
            }
            PlistReaderError::InvalidLength(length) => {
                write!(fmt, "Length {length} does not fit in memory!")
            }
            PlistReaderError::SliceError(why) => {
                write!(fmt, "Unable to slice source stream: {why}")
            }
            PlistReaderError::StringParseError(why) => {
                write!(fmt, "Failed to parse ASCII string: {why}")
            }
            PlistReaderError::Utf16ParseError(why) => {
                write!(fmt, "Failed to parse UTF-16 string: {why}")
            }
            PlistReaderError::InvalidDate(seconds) => {
                write!(fmt, "Date offset {seconds} is not a representable instant!")
            }
            PlistReaderError::InvalidRootReference(index) => {
                write!(fmt, "Root object index {index} is outside of the object table!")
            }
            PlistReaderError::RootNotDictionary => {
                write!(fmt, "Root object is not a dictionary!")
            }
        }
    }
}
