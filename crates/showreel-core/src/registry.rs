//! Active-video registry
//!
//! Page-wide record of which interactive player is currently audible. Setting
//! a new active source is the only way another player gets silenced: every
//! interactive player watches the registry and pauses itself when the entry
//! stops naming its own source.

use std::future::{poll_fn, Future};
use std::pin::pin;
use std::sync::Arc;
use std::task::Poll;
use tokio::sync::{watch, Notify};
use tracing::debug;

/// Shared, observable "currently active source" value
#[derive(Clone, Debug)]
pub struct ActiveVideoRegistry {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl ActiveVideoRegistry {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the active entry. `None` leaves no player active.
    pub fn set_active(&self, source: Option<&str>) {
        let previous = self.tx.send_replace(source.map(str::to_owned));
        debug!(from = ?previous, to = ?source, "Active video changed");
    }

    /// Current active source
    pub fn active(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    pub fn is_active(&self, source: &str) -> bool {
        self.tx.borrow().as_deref() == Some(source)
    }

    /// Clear the entry only if `source` holds it. Returns true when cleared.
    pub fn clear(&self, source: &str) -> bool {
        let cleared = self.tx.send_if_modified(|active| {
            if active.as_deref() == Some(source) {
                *active = None;
                true
            } else {
                false
            }
        });
        if cleared {
            debug!(source, "Active video cleared");
        }
        cleared
    }

    /// Observe changes, for players and for parent components
    pub fn subscribe(&self) -> RegistryWatch {
        RegistryWatch {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for ActiveVideoRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of the registry
#[derive(Debug)]
pub struct RegistryWatch {
    rx: watch::Receiver<Option<String>>,
}

impl RegistryWatch {
    /// Returns the new entry if it changed since the last call
    pub fn take_change(&mut self) -> Option<Option<String>> {
        match self.rx.has_changed() {
            Ok(true) => Some(self.rx.borrow_and_update().clone()),
            _ => None,
        }
    }

    /// Wait for the next change and return the new entry.
    /// Returns `None` once every registry handle has been dropped.
    pub async fn changed(&mut self) -> Option<Option<String>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Like [`changed`](Self::changed), but gives up with `None` as soon as
    /// `closed` is notified. A notification sent while nobody waits is kept
    /// for the next call.
    pub async fn changed_or_closed(&mut self, closed: &Notify) -> Option<Option<String>> {
        let mut closed = pin!(closed.notified());
        let mut change = pin!(self.changed());
        poll_fn(|cx| match closed.as_mut().poll(cx) {
            Poll::Ready(()) => Poll::Ready(None),
            Poll::Pending => change.as_mut().poll(cx),
        })
        .await
    }

    pub fn current(&self) -> Option<String> {
        self.rx.borrow().clone()
    }
}
