/*!
 Data structures describing how a typed value maps onto a plist dictionary.
*/

use crate::{projector::Projector, value::Value};

/// Describes one serializable member of a type
///
/// Member lists are declared statically per type; the projector never
/// discovers members on its own.
pub struct Member<T> {
    /// The key this member is stored under in the projected dictionary
    pub name: &'static str,
    /// Whether to emit the member even when its projected value is the
    /// default for its kind
    pub emit_default: bool,
    /// Project the member out of an instance; nested serializable types can
    /// recurse through the supplied projector
    pub get: fn(&Projector, &T) -> Value,
    /// Absorb a decoded value back into an instance; implementations are
    /// expected to ignore values of an unexpected kind
    pub set: fn(&Projector, &mut T, Value),
}

/// Types that can cross the boundary between typed values and plist
/// dictionaries by declaring an ordered member list
pub trait PlistSerializable: Sized {
    fn members() -> Vec<Member<Self>>;
}
