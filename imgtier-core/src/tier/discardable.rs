//! Reference-counted payloads that can be purged while nobody reads them.
//!
//! A reader checks content out with [`Discardable::begin_access`] (or the
//! scoped [`DiscardableContent::access`]) and checks it back in with
//! [`Discardable::end_access`]. The reclamation path calls
//! [`Discardable::discard_if_possible`] at arbitrary times; it only drops the
//! payload while the access count is zero. Once discarded, an instance stays
//! discarded.

use std::{fmt, ops::Deref};

use parking_lot::Mutex;

/// Check-out / check-in protocol for content the owner may reclaim.
pub trait Discardable {
    /// Returns `false` if the payload is already gone; otherwise bumps the
    /// access count and returns `true`.
    fn begin_access(&self) -> bool;

    /// Drops one access. A no-op at zero.
    fn end_access(&self);

    /// Drops the payload if no access is outstanding.
    fn discard_if_possible(&self);

    /// True once the payload has been dropped.
    fn is_discarded(&self) -> bool;
}

struct ContentState<T> {
    payload: Option<T>,
    access_count: usize,
}

/// Mutex-guarded payload slot plus access counter.
pub struct DiscardableContent<T> {
    state: Mutex<ContentState<T>>,
}

impl<T> DiscardableContent<T> {
    /// Live content with no outstanding access.
    pub fn new(payload: T) -> Self {
        Self {
            state: Mutex::new(ContentState {
                payload: Some(payload),
                access_count: 0,
            }),
        }
    }

    /// Outstanding accesses.
    pub fn access_count(&self) -> usize {
        self.state.lock().access_count
    }

    /// Run `f` on the payload without checking it out.
    ///
    /// The lock is held for the duration of `f`, so the payload cannot be
    /// discarded underneath it.
    pub fn with_payload<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.state.lock().payload.as_ref().map(f)
    }
}

impl<T: Clone> DiscardableContent<T> {
    /// Scoped check-out. `None` means the content was discarded; the guard
    /// ends the access when dropped, on every exit path.
    pub fn access(&self) -> Option<ContentAccess<'_, T>> {
        let mut state = self.state.lock();
        let payload = state.payload.clone()?;
        state.access_count += 1;
        Some(ContentAccess {
            content: self,
            payload,
        })
    }
}

impl<T> Discardable for DiscardableContent<T> {
    fn begin_access(&self) -> bool {
        let mut state = self.state.lock();
        if state.payload.is_none() {
            return false;
        }
        state.access_count += 1;
        true
    }

    fn end_access(&self) {
        let mut state = self.state.lock();
        state.access_count = state.access_count.saturating_sub(1);
    }

    fn discard_if_possible(&self) {
        let dropped = {
            let mut state = self.state.lock();
            if state.access_count == 0 {
                state.payload.take()
            } else {
                None
            }
        };
        // Payload destructor runs outside the lock.
        drop(dropped);
    }

    fn is_discarded(&self) -> bool {
        self.state.lock().payload.is_none()
    }
}

impl<T> fmt::Debug for DiscardableContent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DiscardableContent")
            .field("discarded", &state.payload.is_none())
            .field("access_count", &state.access_count)
            .finish()
    }
}

/// An outstanding access to a [`DiscardableContent`].
pub struct ContentAccess<'a, T> {
    content: &'a DiscardableContent<T>,
    payload: T,
}

impl<T> ContentAccess<'_, T> {
    /// The checked-out payload.
    pub fn payload(&self) -> &T {
        &self.payload
    }
}

impl<T: Clone> ContentAccess<'_, T> {
    /// Clone the payload out and end the access.
    pub fn into_payload(self) -> T {
        self.payload.clone()
    }
}

impl<T> Deref for ContentAccess<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.payload
    }
}

impl<T> Drop for ContentAccess<'_, T> {
    fn drop(&mut self) {
        self.content.end_access();
    }
}

impl<T> fmt::Debug for ContentAccess<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentAccess")
            .field("content", self.content)
            .finish_non_exhaustive()
    }
}
