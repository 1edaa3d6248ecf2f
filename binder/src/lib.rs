//! # Fibre Binder
//!
//! A type-keyed binding resolution engine for Rust.
//!
//! Fibre Binder maps types (plus an optional id and condition) to values,
//! deferred constructions or factories, and resolves them on request. Any
//! number of independent containers can coexist, and an object can be routed
//! into all of them for injection.
//!
//! ## Core Concepts
//!
//! - **Binding**: a record mapping a type to zero or more values under a
//!   constraint (`Single`, `Multiple` or `Pool`).
//! - **Binder**: stores bindings in an arena and answers queries on them.
//! - **Container**: a thread-safe binder plus a construction capability,
//!   with hooks, extensions and a command pool.
//! - **Conditions**: bindings can be restricted to a parent type or a parent
//!   instance, so the same type resolves differently per call site.
//! - **Routing**: [`inject`] walks a [`ContainerRegistry`] and injects an
//!   object into every container that does not already hold it.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_binder::{implements, Container, Id, InjectionContext};
//!
//! trait Foo: Send + Sync {
//!   fn name(&self) -> &'static str;
//! }
//!
//! #[derive(Default)]
//! struct FooImpl;
//!
//! impl Foo for FooImpl {
//!   fn name(&self) -> &'static str {
//!     "foo"
//!   }
//! }
//!
//! implements!(FooImpl => dyn Foo);
//!
//! let container = Container::new();
//! container.factories().unwrap().register_default::<FooImpl>();
//!
//! container.bind::<dyn Foo>().to::<FooImpl>().unwrap().as_id("x");
//!
//! let x = Id::from("x");
//! let foo = container
//!   .resolve::<dyn Foo>(Some(&x), &InjectionContext::new())
//!   .unwrap();
//! assert_eq!(foo.name(), "foo");
//!
//! container.unbind::<dyn Foo>(Some(&x));
//! assert!(container.get_binding::<dyn Foo>(Some(&x)).is_none());
//! ```

mod binder;
mod binding;
mod builder;
mod construct;
mod container;
mod core;
mod error;
mod extension;
mod factory;
mod global;
mod hooks;
mod macros;
mod pool;
mod routing;

pub use binder::{Binder, BindingGroup, BindingMut};
pub use binding::{Binding, BindingIndex, BindingType, Condition, ConstraintType, Deferred, Slot};
pub use builder::{ContainerBuilder, ContainerConfig, DuplicatePolicy, PoolConfig};
pub use construct::{Construct, FactoryRegistry, InstanceFactory, Upcast};
pub use container::{BindingBuilder, Container, ContainerRef, GroupBuilder};
pub use crate::core::{Id, InjectionContext, TypeKey, Value};
pub use error::{BoxError, ConstructionError, Error, Result};
pub use extension::ContainerExtension;
pub use factory::BindingFactory;
pub use global::global_registry;
pub use hooks::{HookHandle, HookPoint};
pub use pool::CommandPool;
pub use routing::{inject, inject_into, ContainerRegistry, Injectable};
