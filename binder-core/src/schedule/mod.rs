//! Frame Scheduling
//!
//! This module drives bindings. A [`Binder`] owns a [`Registry`] of binding
//! records and a [`FrameSource`] that calls it back once per rendering tick.
//! Each tick runs one reconciliation pass over the registry.
//!
//! # Lifecycle
//!
//! The scheduler is idle until the first binding is registered. At that
//! point it requests a frame, and every frame callback requests the next one
//! after its pass completes, whether or not any bindings remain. An empty
//! pass costs a lock and a snapshot of zero ids.
//!
//! The pending frame callback only holds a weak reference to the binder, so
//! the loop winds down at the next tick once every [`Binder`] handle has
//! been dropped. Bindings live inside the binder, so a callback that keeps a
//! strong [`Binder`] clone keeps the loop alive forever. Callbacks that need
//! to bind or unbind should capture a [`WeakBinder`] from
//! [`Binder::downgrade`] instead.
//!
//! # Mutation During a Pass
//!
//! Update callbacks may bind and unbind freely, including unbinding
//! themselves. Each pass snapshots the ids to visit before it starts:
//!
//! - Bindings registered mid-pass are not in the snapshot and first fire on
//!   the next tick.
//! - Bindings unregistered mid-pass are looked up again right before they
//!   are visited, so they are skipped if they are already gone. A record
//!   unbound from another thread while it is being evaluated does not fire
//!   its update either.
//!
//! No registry lock is held while caller code runs.

mod registry;
mod frame;
mod binder;

pub use registry::Registry;
pub use frame::{FrameCallback, FrameSource, ManualFrames, TokioFrames};
pub use binder::{Binder, BinderBuilder, WeakBinder};
