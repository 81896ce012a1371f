#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod data_input;
pub mod error;

pub use data_input::*;
pub use error::*;
