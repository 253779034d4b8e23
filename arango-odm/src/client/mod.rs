//! The database client seam.
//!
//! The mapping layer never talks to the network itself. Everything it needs
//! from the database goes through a [`DatabaseClientProvider`], wrapped in a
//! cheaply cloneable [`ArangoClient`]. [`InMemoryClient`] stands in for a
//! server in tests and demos.

mod memory;
mod provider;

pub use memory::*;
pub use provider::*;
