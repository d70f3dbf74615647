// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parent/child registry links.
//!
//! ## Overview
//!
//! Every overlay owns a list of close hooks, one per overlay nested directly inside its content.
//! A nested overlay finds that list through a [`ParentLink`] handed to it at construction,
//! usually taken from the [`OverlayScope`] of the current build pass.
//!
//! The parent invokes the hooks in two situations:
//! - When it closes itself: every hook runs, then the list is drained.
//! - When a click lands in its content: every hook runs and the list is kept.
//!
//! Registration is not deduplicated. Each registration is one hook invocation per cascade.
//! A child that unmounts removes its own hook with [`ParentLink::unregister`].

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::OverlayId;

pub(crate) type CloseHook = Rc<dyn Fn()>;

/// The close hooks registered with one overlay.
#[derive(Default)]
pub(crate) struct ChildHooks {
    hooks: RefCell<Vec<CloseHook>>,
}

impl ChildHooks {
    pub(crate) fn len(&self) -> usize {
        self.hooks.borrow().len()
    }

    fn push(&self, hook: CloseHook) {
        self.hooks.borrow_mut().push(hook);
    }

    fn snapshot(&self) -> Vec<CloseHook> {
        self.hooks.borrow().clone()
    }

    /// Invoke every hook in registration order, keeping them registered.
    pub(crate) fn notify(&self) -> usize {
        let hooks = self.snapshot();
        for hook in &hooks {
            hook();
        }
        hooks.len()
    }

    /// Invoke every hook in registration order, then remove that batch.
    ///
    /// Hooks registered while the batch runs survive, and hooks removed while it runs stay removed.
    pub(crate) fn drain(&self) -> usize {
        let hooks = self.snapshot();
        for hook in &hooks {
            hook();
        }
        self.hooks
            .borrow_mut()
            .retain(|h| !hooks.iter().any(|done| same_hook(h, done)));
        hooks.len()
    }

    fn remove(&self, hook: &CloseHook) -> bool {
        let mut list = self.hooks.borrow_mut();
        let before = list.len();
        list.retain(|h| !same_hook(h, hook));
        list.len() != before
    }

    pub(crate) fn clear(&self) {
        self.hooks.borrow_mut().clear();
    }
}

fn same_hook(a: &CloseHook, b: &CloseHook) -> bool {
    core::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Registration channel to an enclosing overlay.
///
/// Obtain one from [`Overlay::link`](crate::overlay::Overlay::link). The link holds the parent
/// weakly; once the parent is dropped, registering through it does nothing.
#[derive(Clone)]
pub struct ParentLink {
    owner: OverlayId,
    hooks: Weak<ChildHooks>,
}

impl core::fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ParentLink")
            .field("owner", &self.owner)
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl ParentLink {
    pub(crate) fn new(owner: OverlayId, hooks: &Rc<ChildHooks>) -> Self {
        Self {
            owner,
            hooks: Rc::downgrade(hooks),
        }
    }

    /// The overlay that owns the hook list.
    pub fn owner(&self) -> OverlayId {
        self.owner
    }

    /// Returns `true` while the owning overlay is alive.
    pub fn is_attached(&self) -> bool {
        self.hooks.strong_count() > 0
    }

    /// Append `hook` to the parent's close hooks.
    ///
    /// Returns `None` (and registers nothing) if the parent is gone.
    pub fn register(&self, hook: impl Fn() + 'static) -> Option<Registration> {
        let hooks = self.hooks.upgrade()?;
        let hook: CloseHook = Rc::new(hook);
        let registration = Registration {
            hook: Rc::downgrade(&hook),
        };
        hooks.push(hook);
        tracing::trace!(parent = self.owner.0, "close hook registered");
        Some(registration)
    }

    /// Remove the hook behind `registration` from the parent's close hooks.
    ///
    /// Returns `false` if the hook was already drained or the parent is gone.
    pub fn unregister(&self, registration: Registration) -> bool {
        let (Some(hooks), Some(hook)) = (self.hooks.upgrade(), registration.hook.upgrade()) else {
            return false;
        };
        let removed = hooks.remove(&hook);
        if removed {
            tracing::trace!(parent = self.owner.0, "close hook removed");
        }
        removed
    }
}

/// Receipt for one [`ParentLink::register`] call.
///
/// Becomes inactive once the parent drained the hook in a close cascade (or was dropped).
pub struct Registration {
    hook: Weak<dyn Fn()>,
}

impl core::fmt::Debug for Registration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registration")
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl Registration {
    /// Returns `true` while the hook is still in the parent's list.
    pub fn is_pending(&self) -> bool {
        self.hook.strong_count() > 0
    }
}

/// Explicit stack of parent links for a UI build pass.
///
/// Push an overlay's [`link`](crate::overlay::Overlay::link) before building its content and pop
/// it afterwards; overlays built in between find their parent through [`current`](Self::current).
#[derive(Clone, Debug, Default)]
pub struct OverlayScope {
    stack: Vec<ParentLink>,
}

impl OverlayScope {
    /// Create an empty (top-level) scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the content of the overlay behind `link`.
    pub fn push(&mut self, link: ParentLink) {
        self.stack.push(link);
    }

    /// Leave the innermost overlay content.
    pub fn pop(&mut self) -> Option<ParentLink> {
        self.stack.pop()
    }

    /// The nearest enclosing overlay, if any.
    pub fn current(&self) -> Option<&ParentLink> {
        self.stack.last()
    }

    /// Nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Run `f` with `link` pushed, popping it afterwards.
    pub fn within<R>(&mut self, link: ParentLink, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push(link);
        let out = f(self);
        self.pop();
        out
    }
}
