/*!
 This module contains types of errors that can happen when reading or writing binary plist data.
*/

pub mod reader;
pub mod writer;
