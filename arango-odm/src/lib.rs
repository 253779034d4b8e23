//! # Arango ODM - Entity Mapping for ArangoDB
//!
//! Arango ODM maps Rust types onto ArangoDB collections, indexes and
//! ArangoSearch views. Entity types describe themselves once, usually through
//! `#[derive(ArangoEntity)]` from the `arango-odm-derive` crate, and the
//! mapping layer derives everything the database needs from that description.
//!
//! ## Key Features
//!
//! - **Declarative mapping**: document or edge collections, key options,
//!   sharding settings and index declarations per type
//! - **Templated names**: collection and view names such as
//!   `"{tenant}_orders"` resolved against a runtime evaluation context
//! - **Shared search views**: several entity types contribute links to one
//!   view; their settings are merged and conflicts are detected
//! - **Pluggable client**: a provider trait for the database operations, with
//!   an in-memory implementation
//! - **Clean API**: PIMPL pattern provides stable, encapsulated interface
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use arango_odm::arango_template::ArangoTemplate;
//! use arango_odm_derive::ArangoEntity;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(ArangoEntity, Serialize, Deserialize)]
//! #[arango(document(name = "articles"), search_view(name = "library"))]
//! pub struct Article {
//!     #[arango(id)]
//!     pub id: Option<String>,
//!     #[arango(field_link)]
//!     pub title: String,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let template = ArangoTemplate::builder().build()?;
//! template.insert(&Article { id: None, title: "Rust".into() })?;
//!
//! let repository = template.search_repository::<Article>()?;
//! let found = repository.find_by("title", "Rust")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Pattern
//!
//! The template, mapping context, view registry and client use the **PIMPL
//! (Pointer To IMPLementation)** design pattern:
//!
//! - **Encapsulation**: Implementation details are hidden behind a small facade
//! - **Thread Safety**: All clones share the same underlying state through an `Arc`
//! - **Cheap Sharing**: Handles can be cloned into threads and repositories
//!
//! ## Module Organization
//!
//! - [`arango_template`] - Entry point for collections, views and entities
//! - [`client`] - Database client provider trait and in-memory client
//! - [`common`] - Constants, document helpers and locks
//! - [`errors`] - Error types and result definitions
//! - [`index`] - Index definitions sent to the database
//! - [`mapping`] - Entity descriptions, persistent entities and the mapping context
//! - [`odm_config`] - Mapping layer configuration
//! - [`operations`] - Operations on a single collection or view
//! - [`repository`] - Typed access through search views
//! - [`template_builder`] - Template builder
//! - [`view`] - Aggregation of search view contributions

pub mod arango_template;
pub mod client;
pub mod common;
pub mod errors;
pub mod index;
pub mod mapping;
pub mod odm_config;
pub mod operations;
pub mod repository;
pub mod template_builder;
pub mod view;
