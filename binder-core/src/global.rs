//! Process-wide binder.
//!
//! Convenience wrappers around a single installed [`Binder`]. Libraries that
//! want isolation (and every test) should construct their own binder
//! instead.
//!
//! ```rust,ignore
//! let frames = TokioFrames::new(Duration::from_millis(16))?;
//! global::install(Binder::new(frames))?;
//!
//! let id = global::bind(move || model.lock().title.clone(), render_title)?;
//! ```

use std::sync::OnceLock;

use crate::binding::{Binding, BindingId, Evaluator, Updater};
use crate::error::{BinderError, Result};
use crate::schedule::Binder;

static GLOBAL: OnceLock<Binder> = OnceLock::new();

/// Install the process-wide binder. Only the first call succeeds.
pub fn install(binder: Binder) -> Result<()> {
    GLOBAL
        .set(binder)
        .map_err(|_| BinderError::GlobalAlreadyInstalled)
}

/// Get a handle to the installed binder, if any.
pub fn get() -> Option<Binder> {
    GLOBAL.get().cloned()
}

fn installed() -> Result<&'static Binder> {
    GLOBAL.get().ok_or(BinderError::NoGlobalBinder)
}

/// [`Binder::bind`] on the installed binder.
pub fn bind<T, E, U>(evaluate: E, on_update: U) -> Result<BindingId>
where
    T: PartialEq + Send + 'static,
    E: Evaluator<T> + 'static,
    U: Updater<T> + 'static,
{
    Ok(installed()?.bind(evaluate, on_update))
}

/// [`Binder::register`] on the installed binder.
pub fn register<T>(binding: Binding<T>) -> Result<BindingId>
where
    T: Send + 'static,
{
    Ok(installed()?.register(binding))
}

/// [`Binder::unbind`] on the installed binder.
pub fn unbind(id: BindingId) -> Result<bool> {
    Ok(installed()?.unbind(id))
}
