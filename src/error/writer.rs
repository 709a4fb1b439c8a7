/*!
 Errors that can happen when serializing binary plist data.
*/

use std::{
    fmt::{Display, Formatter, Result},
    io::Error as IoError,
};

/// Errors that can happen when serializing binary plist data
#[derive(Debug)]
pub enum PlistWriterError {
    Io(IoError),
    TableOverflow(usize),
}

impl Display for PlistWriterError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            PlistWriterError::Io(why) => write!(fmt, "Unable to write to stream: {why}"),
            PlistWriterError::TableOverflow(count) => {
                write!(fmt, "Object table holds {count} entries, more than references can address!")
            }
        }
    }
}
