//! IP address literal helpers for hosts without a resolver.
//!
//! Nothing in this crate performs a name lookup: text is either an address
//! literal or it is rejected.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod embedded;
pub mod error;
pub mod format;
pub mod parse;
pub mod teredo;

pub use embedded::*;
pub use error::*;
pub use format::*;
pub use parse::*;
pub use teredo::*;
