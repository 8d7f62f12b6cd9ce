//! # wiring
//!
//! Definition resolution engine for dependency injection containers.
//!
//! A container maps identifiers to *definitions*: declarative descriptions of
//! how to obtain a value. This crate turns a single definition into the value it
//! describes, resolving every definition nested in constructor arguments,
//! property values, method arguments and factory arguments along the way.
//!
//! ## Core Concepts
//!
//! - **Definition**: pure data describing a value: a constant
//!   ([`ParameterDefinition`]), an alias of another entry
//!   ([`ReferenceDefinition`]), a constructed object ([`ObjectDefinition`]) or
//!   the result of a factory method ([`FactoryCallDefinition`])
//! - **Resolvable**: anything that may appear at an argument position: a plain
//!   [`Value`], a sequence of resolvables or a nested definition
//! - **TypeRegistry**: the closed set of types definitions may construct and
//!   call into
//! - **Lookup**: the container seam used to resolve references
//! - **DefinitionResolver**: the only component that performs resolution
//!
//! ## Basic Usage
//!
//! ```rust
//! use std::collections::HashMap;
//! use wiring::{
//!     Arguments, DefinitionResolver, ObjectDefinition, ReferenceDefinition, TypeBuilder,
//!     TypeRegistry, Value,
//! };
//!
//! struct Mailer {
//!     transport: String,
//!     sender: String,
//! }
//!
//! let mut registry = TypeRegistry::new();
//! registry.add_type(
//!     TypeBuilder::<Mailer>::new("Mailer")
//!         .constructor(|mut args: Arguments| {
//!             let transport = args.arg()?;
//!             args.finish()?;
//!             Ok(Mailer { transport, sender: String::new() })
//!         })
//!         .property("sender", |mailer: &mut Mailer, value: Value| {
//!             mailer.sender = value.as_str().unwrap_or_default().to_owned();
//!             Ok(())
//!         }),
//! );
//!
//! let entries = HashMap::from([("transport".to_string(), Value::from("smtp://localhost"))]);
//! let definition = ObjectDefinition::new("Mailer")
//!     .add_constructor_argument(ReferenceDefinition::new("transport"))
//!     .add_property_assignment("sender", "noreply@example.com");
//!
//! let resolver = DefinitionResolver::new(registry);
//! let mailer = resolver.resolve(&definition.into(), &entries).unwrap();
//! let mailer = mailer.downcast_ref::<Mailer>().unwrap();
//! assert_eq!(mailer.transport, "smtp://localhost");
//! assert_eq!(mailer.sender, "noreply@example.com");
//! ```
//!
//! ## Using Macros
//!
//! With the `macros` feature enabled, registrations are generated from impl
//! blocks:
//!
//! ```rust
//! use wiring::{Register, TypeRegistry, register};
//!
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! #[register]
//! impl Greeter {
//!     #[constructor]
//!     fn new(greeting: String) -> Self {
//!         Self { greeting }
//!     }
//!
//!     #[method]
//!     fn greet(&self, name: String) -> String {
//!         format!("{} {name}", self.greeting)
//!     }
//! }
//!
//! let mut registry = TypeRegistry::new();
//! registry.add::<Greeter>();
//! assert_eq!(Greeter::NAME, "Greeter");
//! ```
//!
//! ## Features
//!
//! - `macros` (default): Enables `#[register]` and `#[derive(Register)]`

mod definition;
mod error;
mod lookup;
mod registry;
mod resolver;
mod value;

pub use definition::*;
pub use error::*;
pub use lookup::*;
pub use registry::*;
pub use resolver::*;
pub use value::*;

#[cfg(feature = "macros")]
pub use wiring_macros::*;
