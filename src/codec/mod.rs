/*!
 Contains logic and data structures used to serialize and deserialize the binary plist wire format.

 ## Overview

 A binary plist is laid out as four regions:

 ```txt
 [header][object table][offset table][trailer]
 ```

 The header is the 8-byte magic `bplist00`. The object table is a sequence of
 tagged values in which containers hold fixed-width references into the table
 instead of nesting their children inline. The offset table records the byte
 position of every object so any entry can be located without a linear scan,
 and the fixed 32-byte trailer carries the reference width, offset width,
 object count, root index, and offset-table position needed to parse the rest.

 ## Origin

 The format is produced and consumed by Apple's `CFBinaryPlist` implementation
 in CoreFoundation; this module implements the `bplist00` revision.
*/

pub mod markers;
pub(crate) mod models;
pub mod reader;
pub mod writer;
