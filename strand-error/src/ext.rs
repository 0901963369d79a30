use crate::{ErrString, StrandResult};

/// Attach a lazily built context message to the error of a [`StrandResult`].
pub trait ContextExt<T> {
    /// Wrap the error, if any, with the message returned by `f`. `f` only runs on failure.
    fn with_context<F, M>(self, f: F) -> StrandResult<T>
    where
        F: FnOnce() -> M,
        M: Into<ErrString>;
}

impl<T> ContextExt<T> for StrandResult<T> {
    fn with_context<F, M>(self, f: F) -> StrandResult<T>
    where
        F: FnOnce() -> M,
        M: Into<ErrString>,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
