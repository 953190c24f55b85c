//! Binder Core
//!
//! A frame-driven data-binding scheduler. Callers bind a value-producing
//! function to an update callback; once per rendering frame the binder
//! re-evaluates every binding and fires the callbacks whose values changed.
//!
//! This is deliberately not a dependency-tracking reactive system. There
//! are no signals, no computed values and no transactions: every binding is
//! polled each frame and compared against its last observed value.
//!
//! # Architecture
//!
//! - `binding`: binding descriptions, records and the capability traits for
//!   their callbacks
//! - `schedule`: the registry, frame sources and the [`Binder`] that runs
//!   reconciliation passes
//! - `config`, `error`, `stats`: ambient configuration, error types and
//!   counters
//! - `global`: an optional process-wide binder
//!
//! # Example
//!
//! ```rust,ignore
//! use binder_core::{Binder, ManualFrames};
//!
//! let frames = ManualFrames::new();
//! let binder = Binder::new(frames.clone());
//!
//! let count = Arc::new(AtomicI32::new(0));
//! let source = count.clone();
//! binder.bind(move || source.load(Ordering::SeqCst), |c: &i32| println!("count: {c}"));
//!
//! frames.advance();  // Prints: "count: 0"
//! frames.advance();  // Nothing changed, nothing printed
//!
//! count.store(5, Ordering::SeqCst);
//! frames.advance();  // Prints: "count: 5"
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod global;
pub mod schedule;
pub mod stats;

pub use binding::{by_pointer, Binding, BindingId};
pub use config::{BinderConfig, FailurePolicy};
pub use error::{BinderError, BindingError, ErrorReporter, Phase, Result, TracingReporter};
pub use schedule::{Binder, BinderBuilder, FrameSource, ManualFrames, TokioFrames, WeakBinder};
pub use stats::{BinderStats, PassStats};
