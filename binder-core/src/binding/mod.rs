//! Bindings
//!
//! A binding ties a value-producing function to a callback that runs when
//! that value changes. This module defines the pieces a binding is made of;
//! the [`schedule`](crate::schedule) module decides when they run.
//!
//! # Anatomy
//!
//! - An [`Evaluator`] produces the current value.
//! - An [`Updater`] receives the value whenever a change is detected.
//! - An optional [`EqualityComparer`] overrides `PartialEq` for change detection.
//! - An optional [`RemovalPredicate`] lets a binding retire itself.
//!
//! Each of these is a capability trait with a blanket impl for closures, so
//! most callers just pass closures. Named types implementing the traits work
//! too, which is handy for comparers shared between many bindings.

mod id;
mod capability;
mod record;

pub use id::BindingId;
pub use capability::{by_pointer, EqualityComparer, Evaluator, RemovalPredicate, Updater};
pub use record::{Binding, BindingRecord, Observation, Reconcile};
