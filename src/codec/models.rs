/*!
 Data structures representing entries of the flat object table while it exists.

 Both halves of the codec operate on an index-addressed table in which
 containers hold integer references to their children rather than the children
 themselves. The encode and decode sides need different shapes: the writer
 borrows scalars straight out of the caller's tree, while the reader owns the
 scalars it has decoded but leaves container children as unresolved reference
 lists until resolution.
*/

use chrono::{DateTime, Utc};

use crate::value::Value;

/// An object table entry on the encode path
///
/// Scalars borrow from the value tree being written. Containers are appended
/// to the table before their children are visited, then their reference lists
/// are filled in one sibling at a time, so a container's index is always lower
/// than the indices of values reachable only through it.
#[derive(Debug)]
pub(crate) enum TableEntry<'a> {
    Scalar(&'a Value),
    /// A dictionary key; keys are plain strings in the value tree but occupy
    /// ordinary string entries in the table
    Key(&'a str),
    Array(Vec<u32>),
    Dictionary { keys: Vec<u32>, values: Vec<u32> },
}

/// An object table entry on the decode path
///
/// Containers keep the raw reference indices read off the wire; they are only
/// chased (with bounds and cycle checks) when the entry is resolved into a
/// [`Value`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Descriptor {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Date(DateTime<Utc>),
    Data(Vec<u8>),
    String(String),
    Array(Vec<u64>),
    Dictionary { keys: Vec<u64>, values: Vec<u64> },
}
