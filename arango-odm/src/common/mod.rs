//! Shared constants, document aliases and concurrency helpers.

mod constants;
mod lock;
mod util;

pub use constants::*;
pub use lock::*;
pub use util::*;
