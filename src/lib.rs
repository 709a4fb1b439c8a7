#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod codec;
pub mod error;
pub mod projector;
pub mod util;
pub mod value;
