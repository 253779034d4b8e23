//! Typed read access to entities through search views.

mod search_repository;

pub use search_repository::*;
