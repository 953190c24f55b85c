//! Binder
//!
//! The [`Binder`] is the coordinator: it owns the registry, issues frame
//! requests, and runs one reconciliation pass per frame.
//!
//! # Failure Isolation
//!
//! Every binding is reconciled inside its own `catch_unwind` boundary. A
//! panic in any of its callbacks is turned into a [`BindingError`], handed
//! to the configured [`ErrorReporter`], and the pass moves on to the next
//! binding. The frame loop reschedules itself after every pass regardless
//! of what happened inside it.
//!
//! What happens to the failing binding afterwards is decided by
//! [`FailurePolicy`].

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace, trace_span};

use super::frame::{FrameSource, TokioFrames};
use super::registry::Registry;
use crate::binding::{Binding, BindingId, Evaluator, Observation, Updater};
use crate::config::{BinderConfig, FailurePolicy};
use crate::error::{BinderError, BindingError, ErrorReporter, Phase, Result, TracingReporter};
use crate::stats::{BinderStats, PassStats, StatsCounter};

/// Frame-driven data-binding scheduler.
///
/// Cloning a `Binder` yields another handle to the same scheduler. Callbacks
/// registered with a binder should hold a [`WeakBinder`] rather than a clone,
/// or the binder can never be dropped.
///
/// # Example
///
/// ```rust,ignore
/// let frames = ManualFrames::new();
/// let binder = Binder::new(frames.clone());
///
/// let title = Arc::new(Mutex::new(String::from("hello")));
/// let source = title.clone();
/// binder.bind(move || source.lock().clone(), |t: &String| println!("title: {t}"));
///
/// frames.advance();  // Prints: "title: hello"
/// *title.lock() = "goodbye".into();
/// frames.advance();  // Prints: "title: goodbye"
/// ```
#[derive(Clone)]
pub struct Binder {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Mutex<Registry>,
    frames: Arc<dyn FrameSource>,
    reporter: Arc<dyn ErrorReporter>,
    config: BinderConfig,

    /// Set once the frame loop has been started.
    running: AtomicBool,

    /// Set while a pass is in flight. Passes never nest.
    in_pass: AtomicBool,

    stats: StatsCounter,
}

/// Builder for a [`Binder`] with non-default parts.
pub struct BinderBuilder {
    frames: Arc<dyn FrameSource>,
    reporter: Arc<dyn ErrorReporter>,
    config: BinderConfig,
}

impl BinderBuilder {
    /// Use the given configuration.
    pub fn config(mut self, config: BinderConfig) -> Self {
        self.config = config;
        self
    }

    /// Send binding failures to `reporter` instead of the tracing log.
    pub fn reporter<R>(mut self, reporter: R) -> Self
    where
        R: ErrorReporter + 'static,
    {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Build the binder. No frame is requested until the first binding.
    pub fn build(self) -> Binder {
        Binder {
            inner: Arc::new(Inner {
                registry: Mutex::new(Registry::new()),
                frames: self.frames,
                reporter: self.reporter,
                config: self.config,
                running: AtomicBool::new(false),
                in_pass: AtomicBool::new(false),
                stats: StatsCounter::default(),
            }),
        }
    }
}

impl Binder {
    /// Create a binder with the default configuration.
    pub fn new(frames: Arc<dyn FrameSource>) -> Self {
        Self::builder(frames).build()
    }

    /// Create a binder with an explicit configuration.
    pub fn with_config(frames: Arc<dyn FrameSource>, config: BinderConfig) -> Self {
        Self::builder(frames).config(config).build()
    }

    /// Create a binder driven by [`TokioFrames`] on the current runtime,
    /// ticking at `config.frame_interval`.
    ///
    /// Returns [`BinderError::NoRuntime`] outside a tokio runtime.
    pub fn on_tokio(config: BinderConfig) -> Result<Self> {
        let frames = TokioFrames::from_config(&config)?;
        Ok(Self::with_config(frames, config))
    }

    /// Start building a binder on the given frame source.
    pub fn builder(frames: Arc<dyn FrameSource>) -> BinderBuilder {
        BinderBuilder {
            frames,
            reporter: Arc::new(TracingReporter),
            config: BinderConfig::default(),
        }
    }

    /// Bind `evaluate` to `on_update`, detecting change with `PartialEq`.
    ///
    /// Neither function runs now. On the next frame `on_update` receives
    /// the first evaluated value unconditionally; after that it fires only
    /// when the value changes.
    pub fn bind<T, E, U>(&self, evaluate: E, on_update: U) -> BindingId
    where
        T: PartialEq + Send + 'static,
        E: Evaluator<T> + 'static,
        U: Updater<T> + 'static,
    {
        self.register(Binding::new(evaluate, on_update))
    }

    /// Register a fully described binding.
    ///
    /// Safe to call from inside a callback during a pass; the new binding is
    /// first reconciled on the following frame.
    pub fn register<T>(&self, binding: Binding<T>) -> BindingId
    where
        T: Send + 'static,
    {
        let id = self.inner.registry.lock().register(binding);
        trace!(binding = %id, "bound");
        self.ensure_running();
        id
    }

    /// Remove a binding. Returns `false` if it was not registered.
    ///
    /// Safe to call from inside a callback during a pass, including the
    /// binding's own update. The binding is not reconciled again, even later
    /// in the current pass.
    pub fn unbind(&self, id: BindingId) -> bool {
        let removed = self.inner.registry.lock().unregister(id);
        if removed {
            trace!(binding = %id, "unbound");
        }
        removed
    }

    /// Run one reconciliation pass now, outside the frame loop.
    ///
    /// Hosts that drive their own render loop can call this instead of
    /// relying on a frame source. Returns [`BinderError::PassInProgress`]
    /// when called from inside a pass.
    pub fn run_pass(&self) -> Result<PassStats> {
        self.inner.run_pass()
    }

    /// Check whether a binding is registered.
    pub fn contains(&self, id: BindingId) -> bool {
        self.inner.registry.lock().contains(id)
    }

    /// Get the number of registered bindings.
    pub fn len(&self) -> usize {
        self.inner.registry.lock().len()
    }

    /// Check whether no bindings are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.registry.lock().is_empty()
    }

    /// Check whether the frame loop has started.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Get the lifetime counters.
    pub fn stats(&self) -> BinderStats {
        self.inner.stats.snapshot()
    }

    /// Get the configuration.
    pub fn config(&self) -> &BinderConfig {
        &self.inner.config
    }

    /// Create a handle that does not keep the binder alive.
    pub fn downgrade(&self) -> WeakBinder {
        WeakBinder {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn ensure_running(&self) {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            debug!("binder frame loop started");
            Inner::schedule(&self.inner);
        }
    }
}

/// Non-owning handle to a [`Binder`], for use inside binding callbacks.
#[derive(Clone)]
pub struct WeakBinder {
    inner: Weak<Inner>,
}

impl WeakBinder {
    /// Get a strong handle, if the binder is still alive.
    pub fn upgrade(&self) -> Option<Binder> {
        self.inner.upgrade().map(|inner| Binder { inner })
    }

    /// [`Binder::unbind`] if the binder is still alive; `false` otherwise.
    pub fn unbind(&self, id: BindingId) -> bool {
        self.upgrade().map_or(false, |binder| binder.unbind(id))
    }
}

impl fmt::Debug for WeakBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakBinder")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("bindings", &self.len())
            .field("running", &self.is_running())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Clears the in-pass flag when the pass ends, even by unwinding.
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Inner {
    /// Request the next frame.
    ///
    /// The callback only holds a weak reference, so dropping the last
    /// `Binder` handle ends the loop.
    fn schedule(this: &Arc<Self>) {
        let weak = Arc::downgrade(this);
        this.frames.request_frame(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.tick();
            }
        }));
    }

    fn tick(self: Arc<Self>) {
        if let Err(err) = self.run_pass() {
            debug!(%err, "frame skipped");
        }
        Self::schedule(&self);
    }

    fn run_pass(&self) -> Result<PassStats> {
        if self
            .in_pass
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BinderError::PassInProgress);
        }
        let _guard = PassGuard(&self.in_pass);

        let span = trace_span!("binder_pass");
        let _enter = span.enter();

        let snapshot = self.registry.lock().snapshot();
        let mut stats = PassStats::default();

        for id in snapshot {
            // Unbound since the snapshot was taken
            let record = self.registry.lock().get(id);
            let Some(record) = record else {
                continue;
            };
            stats.visited += 1;

            let mut phase = Phase::ShouldRemove;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| record.reconcile(&mut phase)));

            match outcome {
                Ok(Observation::Retired) => {
                    if self.registry.lock().unregister(id) {
                        trace!(binding = %id, "retired");
                        stats.removed += 1;
                    }
                }
                Ok(observation) => {
                    if observation.fired() {
                        stats.updated += 1;
                    }
                }
                Err(payload) => {
                    stats.failed += 1;
                    let error = BindingError::from_panic(id, phase, payload);
                    self.report(&error);

                    if self.config.failure_policy == FailurePolicy::Remove
                        && self.registry.lock().unregister(id)
                    {
                        trace!(binding = %id, "removed after failure");
                        stats.removed += 1;
                    }
                }
            }
        }

        self.stats.record(&stats);
        debug!(
            visited = stats.visited,
            updated = stats.updated,
            removed = stats.removed,
            failed = stats.failed,
            "pass complete"
        );

        Ok(stats)
    }

    fn report(&self, error: &BindingError) {
        // A panicking reporter must not take the frame loop down with it.
        if panic::catch_unwind(AssertUnwindSafe(|| self.reporter.report(error))).is_err() {
            debug!(binding = %error.id, "error reporter panicked");
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
