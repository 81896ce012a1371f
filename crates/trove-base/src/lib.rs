pub mod error;
pub mod memoize;
pub mod supplier;
pub mod time;

pub use error::*;
pub use memoize::*;
pub use supplier::*;
pub use time::*;
