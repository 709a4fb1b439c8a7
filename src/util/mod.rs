/*!
 This module defines common utilities used across the codec.
*/

pub mod dates;
