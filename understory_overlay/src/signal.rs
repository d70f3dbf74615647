// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dismissal signal: one broadcaster for "a click reached the document".
//!
//! ## Overview
//!
//! The host installs exactly one document-level click listener per signal and calls
//! [`DismissalSignal::notify`] from it once the click has finished bubbling.
//! Clicks that landed inside an overlay's content or backdrop had their propagation stopped
//! on the way up, so they never get here.
//!
//! Every live overlay subscribes on construction and unsubscribes on drop.
//!
//! ## Process-wide registry
//!
//! [`DismissalSignal::global`] (feature `std`) returns the per-thread shared signal, created on
//! first use. UI state in this crate is single-threaded, so "process-wide" means "UI thread".
//! Use [`DismissalSignal::new`] for isolated hosts and tests.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;

type Handler = Rc<dyn Fn()>;
type Installer = Box<dyn FnOnce()>;

/// Click-outside broadcaster.
///
/// Cheap to clone; clones share the same subscriber list.
#[derive(Clone, Default)]
pub struct DismissalSignal {
    inner: Rc<RefCell<SignalInner>>,
}

#[derive(Default)]
struct SignalInner {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
    installer: Option<Installer>,
    installed: bool,
}

impl core::fmt::Debug for DismissalSignal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("DismissalSignal")
            .field("subscribers", &inner.handlers.len())
            .field("installed", &inner.installed)
            .finish_non_exhaustive()
    }
}

/// Token returned by [`DismissalSignal::subscribe`].
///
/// Dropping the token does not detach the handler; call [`Subscription::unsubscribe`].
#[must_use = "the handler stays subscribed until `unsubscribe` is called"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    signal: Weak<RefCell<SignalInner>>,
}

impl DismissalSignal {
    /// Create an empty signal with no listener installer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a signal that runs `install` once, when the first handler subscribes.
    ///
    /// Hosts use this to attach their single document-level click listener lazily.
    pub fn with_installer(install: impl FnOnce() + 'static) -> Self {
        let signal = Self::default();
        signal.inner.borrow_mut().installer = Some(Box::new(install));
        signal
    }

    /// The shared signal for the current thread, created on first use.
    #[cfg(feature = "std")]
    pub fn global() -> Self {
        std::thread_local! {
            static GLOBAL: DismissalSignal = DismissalSignal::new();
        }
        GLOBAL.with(Clone::clone)
    }

    /// Register `handler` to run on every [`notify`](Self::notify).
    pub fn subscribe(&self, handler: impl Fn() + 'static) -> Subscription {
        let (id, install) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.handlers.push((id, Rc::new(handler)));
            let install = if inner.installed {
                None
            } else {
                inner.installed = true;
                inner.installer.take()
            };
            (id, install)
        };
        tracing::debug!(subscriber = id, "dismissal signal: subscribe");
        if let Some(install) = install {
            tracing::debug!("dismissal signal: installing document listener");
            install();
        }
        Subscription {
            id,
            signal: Rc::downgrade(&self.inner),
        }
    }

    /// Invoke every subscribed handler in subscription order.
    ///
    /// Handlers run on a snapshot taken before the first call, with no borrow held, so they may
    /// subscribe or unsubscribe. A handler removed mid-notify still runs for this click.
    /// Returns the number of handlers invoked.
    pub fn notify(&self) -> usize {
        let snapshot: Vec<Handler> = self
            .inner
            .borrow()
            .handlers
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        tracing::trace!(subscribers = snapshot.len(), "dismissal signal: notify");
        for handler in &snapshot {
            handler();
        }
        snapshot.len()
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.inner.borrow().handlers.len()
    }

    /// Returns `true` if nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the document-level listener has been installed (first subscription happened).
    ///
    /// Stays `true` for the signal's lifetime, even after every handler unsubscribed.
    pub fn is_installed(&self) -> bool {
        self.inner.borrow().installed
    }
}

impl Subscription {
    /// Detach the handler. A no-op if the signal is gone.
    pub fn unsubscribe(self) {
        let Some(inner) = self.signal.upgrade() else {
            return;
        };
        inner.borrow_mut().handlers.retain(|(id, _)| *id != self.id);
        tracing::debug!(subscriber = self.id, "dismissal signal: unsubscribe");
    }
}
