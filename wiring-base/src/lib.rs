//! # wiring-base
//!
//! Container and ambient services for the wiring definition resolver.
//!
//! The core `wiring` crate resolves one definition at a time against any
//! [`wiring::Lookup`]. This crate provides the surrounding pieces an
//! application needs: a container with lazy materialization and cycle
//! detection, definition providers, JSON configuration sections and tracing
//! setup.
//!
//! ## Core Components
//!
//! - **Container**: maps identifiers to definitions and caches every
//!   materialized entry
//! - **Definition Providers**: batches of definitions, including parameters
//!   loaded from configuration
//! - **Configuration System**: named JSON sections merged from multiple sources
//! - **Tracing Integration**: `tracing-subscriber` setup from configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use wiring::{ObjectDefinition, ReferenceDefinition, TypeRegistry, register};
//! use wiring_base::{ArrayDefinitionProvider, Config, Container};
//!
//! struct Database {
//!     dsn: String,
//! }
//!
//! #[register]
//! impl Database {
//!     #[constructor]
//!     fn new(dsn: String) -> Self {
//!         Self { dsn }
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let config = Config::parse(r#"{"parameters": {"dsn": "sqlite::memory:"}}"#)?;
//!
//! let mut registry = TypeRegistry::new();
//! registry.add::<Database>();
//!
//! let container = Container::builder()
//!     .add_provider(ArrayDefinitionProvider::from_config(&config, "parameters")?)
//!     .add_definition(
//!         "database",
//!         ObjectDefinition::new("Database")
//!             .add_constructor_argument(ReferenceDefinition::new("dsn")),
//!     )
//!     .build(registry)?;
//!
//! let database = container.get("database")?;
//! assert_eq!(database.downcast_ref::<Database>().unwrap().dsn, "sqlite::memory:");
//! # Ok(())
//! # }
//! ```

mod config;
mod container;
mod provider;
mod tracing;

pub use config::*;
pub use container::*;
pub use provider::*;
pub use tracing::*;
