//! # Bean Factory - Declarative IoC Container for Rust
//!
//! A Spring-style bean container: declarative definitions in, fully wired
//! object graphs out.
//!
//! ## Features
//!
//! - 📋 **Declarative** - [`BeanDefinition`] metadata describes construction, scope, and wiring
//! - 🔒 **Type-safe** - Instances resolve to `Arc<T>` with runtime type checking at the seams
//! - ⚡ **Lock-free reads** - `DashMap` caches keep the singleton hot path uncontended
//! - 🔄 **Scopes** - Cached singletons and fresh-per-lookup prototypes
//! - 🪢 **Autowiring** - By name, by type, or constructor selection with `primary` tie-breaks
//! - 🧬 **Templates** - Child definitions inherit from abstract parent definitions
//! - 🏭 **Factory beans** - Indirect construction with `&name` dereference lookups
//! - 🧵 **Thread-safe** - Concurrent resolution creates each singleton exactly once
//! - 🔁 **Cycle detection** - Dependency cycles fail with the full path, not a deadlock
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use bean_factory::prelude::*;
//! use std::sync::{Arc, OnceLock};
//!
//! struct Database {
//!     url: &'static str,
//! }
//!
//! struct UserService {
//!     db: OnceLock<Arc<Database>>,
//! }
//!
//! // Construction metadata stands in for reflection
//! let types = Arc::new(TypeRegistry::new());
//! types.register(
//!     BeanType::builder::<Database>("Database")
//!         .constructor0(|| Database { url: "postgres://localhost" })
//!         .build(),
//! );
//! types.register(
//!     BeanType::builder::<UserService>("UserService")
//!         .constructor0(|| UserService { db: OnceLock::new() })
//!         .property("db", |svc: &UserService, db: Arc<Database>| {
//!             let _ = svc.db.set(db);
//!         })
//!         .build(),
//! );
//!
//! // Declarative definitions drive the wiring
//! let factory = BeanFactory::with_types(types);
//! factory
//!     .register_bean_definition("db", BeanDefinition::of("Database"))
//!     .unwrap();
//! factory
//!     .register_bean_definition(
//!         "users",
//!         BeanDefinition::of("UserService").with_autowire_mode(AutowireMode::ByName),
//!     )
//!     .unwrap();
//!
//! let users = factory.get_bean_as::<UserService>("users").unwrap();
//! assert_eq!(users.db.get().unwrap().url, "postgres://localhost");
//! ```
//!
//! ## Scopes and Lifecycle
//!
//! ```rust
//! use bean_factory::prelude::*;
//! use std::sync::Arc;
//!
//! struct Job;
//!
//! let types = Arc::new(TypeRegistry::new());
//! types.register(BeanType::builder::<Job>("Job").constructor0(|| Job).build());
//!
//! let factory = BeanFactory::with_types(types);
//!
//! // Singleton: one cached instance per name
//! factory
//!     .register_bean_definition("job", BeanDefinition::of("Job"))
//!     .unwrap();
//!
//! // Prototype: a fresh instance on every lookup, never cached
//! factory
//!     .register_bean_definition(
//!         "adhoc-job",
//!         BeanDefinition::of("Job").with_scope(BeanScope::Prototype),
//!     )
//!     .unwrap();
//!
//! let a = factory.get_bean("job").unwrap();
//! let b = factory.get_bean("job").unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//!
//! let c = factory.get_bean("adhoc-job").unwrap();
//! let d = factory.get_bean("adhoc-job").unwrap();
//! assert!(!Arc::ptr_eq(&c, &d));
//! ```
//!
//! ## Performance
//!
//! - **Lock-free reads**: `DashMap` singleton and metadata caches, no global lock
//! - **AHash**: fast hashing for name-keyed lookups
//! - **Memoized merging**: parent-template chains are flattened once per name
//! - **Per-name creation locks**: concurrent resolution of different beans never contends

mod autowire;
mod container;
mod definition;
mod error;
#[cfg(feature = "logging")]
pub mod logging;
mod registry;
mod singleton;
mod types;

pub use container::{BeanFactory, FACTORY_BEAN_PREFIX};
pub use definition::{AutowireMode, BeanDefinition, BeanScope};
pub use error::{BeanError, BoxedCause, Result};
pub use types::{
    downcast_instance, instance_of, BeanInstance, BeanType, BeanTypeBuilder, ConstructorSpec,
    FactoryBean, FactoryCapability, FactoryMethodSpec, ParamSpec, PropertySpec, TypeRegistry,
    TypeResolver,
};

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AutowireMode, BeanDefinition, BeanError, BeanFactory, BeanInstance, BeanScope, BeanType,
        FactoryBean, Result, TypeRegistry, TypeResolver,
    };
    pub use std::sync::Arc;
}
