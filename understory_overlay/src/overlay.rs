// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay instances: close guard, cascading close, click handlers.
//!
//! ## Lifecycle
//!
//! 1) Construct with [`Overlay::new`] (or [`Overlay::new_in_scope`]) when the owning subtree
//!    mounts. The overlay subscribes to the host's dismissal signal, joins its layer stack, and
//!    registers a close hook with its parent, if it has one.
//! 2) Feed it the consumer's state: [`Overlay::set_visible`], [`Overlay::set_target`].
//! 3) It reports close requests through [`Overlay::set_on_visible_change`]; always with `false`.
//! 4) Drop it when the subtree unmounts. Dropping requests a close once, then detaches.
//!
//! ## Phases
//!
//! | Phase | visible + anchor | guard |
//! |---|---|---|
//! | [`Closed`](OverlayPhase::Closed) | not active | – |
//! | [`Opening`](OverlayPhase::Opening) | active | not armed yet |
//! | [`Open`](OverlayPhase::Open) | active | armed |
//! | [`Closing`](OverlayPhase::Closing) | active | close requested, consumer has not applied it |
//!
//! The guard arms one [`TickQueue`](crate::tick::TickQueue) turn after `visible` becomes `true`.
//! Close requests before that are ignored, so the click that opened an overlay cannot close it.
//! After a successful request the guard stays disarmed until the next turn; a consumer that keeps
//! the overlay visible gets it back in [`Open`](OverlayPhase::Open) then.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::RefCell;

use crate::OverlayId;
use crate::dispatch::{ClickEvent, LayerFlags, LayerTarget};
use crate::host::OverlayHost;
use crate::link::{ChildHooks, OverlayScope, ParentLink, Registration};
use crate::render::{Anchor, MountRequest, OverlayProps, Renderer};
use crate::signal::Subscription;
use crate::tick::TickQueue;

type VisibleCallback = Box<dyn FnMut(bool)>;

/// Observable state of an [`Overlay`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum OverlayPhase {
    /// Not visible, or visible without a mounted anchor.
    Closed,
    /// Visible; close requests are ignored until the next turn.
    Opening,
    /// Visible; close requests are honored.
    Open,
    /// A close request was emitted and the consumer has not hidden the overlay yet.
    Closing,
}

struct State<A> {
    visible: bool,
    target: Option<A>,
    may_close: bool,
    close_requested: bool,
    // Bumped on every open so a deferred arm from an earlier open is ignored.
    epoch: u32,
    props: OverlayProps,
}

impl<A: Anchor> State<A> {
    fn is_active(&self) -> bool {
        self.visible && self.target.as_ref().is_some_and(Anchor::is_mounted)
    }
}

struct Shared<A> {
    id: OverlayId,
    this: Weak<Self>,
    ticks: TickQueue,
    state: RefCell<State<A>>,
    children: Rc<ChildHooks>,
    on_change: RefCell<Option<VisibleCallback>>,
}

impl<A: Anchor + 'static> Shared<A> {
    fn request_close(&self) -> bool {
        let epoch = {
            let mut state = self.state.borrow_mut();
            if !state.is_active() {
                tracing::trace!(overlay = self.id.0, "close ignored: not open");
                return false;
            }
            if !state.may_close {
                tracing::trace!(overlay = self.id.0, "close ignored: guard not armed");
                return false;
            }
            state.may_close = false;
            state.close_requested = true;
            state.epoch
        };
        // Re-arms only if the consumer keeps the overlay visible through this turn.
        self.arm_next_tick(epoch);
        let children = self.children.drain();
        tracing::debug!(overlay = self.id.0, children, "close requested");
        self.emit(false);
        true
    }

    fn close_children(&self) -> usize {
        let n = self.children.notify();
        if n > 0 {
            tracing::debug!(overlay = self.id.0, children = n, "closing child overlays");
        }
        n
    }

    fn emit(&self, visible: bool) {
        // Run the callback with no borrow held; it may call back into this overlay.
        let callback = self.on_change.borrow_mut().take();
        if let Some(mut callback) = callback {
            callback(visible);
            let mut slot = self.on_change.borrow_mut();
            if slot.is_none() {
                *slot = Some(callback);
            }
        }
    }

    fn arm_next_tick(&self, epoch: u32) {
        let this = self.this.clone();
        self.ticks.defer(move || {
            if let Some(shared) = this.upgrade() {
                shared.arm(epoch);
            }
        });
    }

    fn arm(&self, epoch: u32) {
        let mut state = self.state.borrow_mut();
        if state.visible && state.epoch == epoch {
            state.may_close = true;
            state.close_requested = false;
            tracing::trace!(overlay = self.id.0, "close guard armed");
        }
    }
}

impl<A: Anchor + 'static> LayerTarget for Shared<A> {
    fn flags(&self) -> LayerFlags {
        let state = self.state.borrow();
        let mut flags = LayerFlags::empty();
        if state.is_active() {
            flags |= LayerFlags::CONTENT;
            if !state.props.no_background {
                flags |= LayerFlags::BACKDROP;
            }
        }
        flags
    }

    fn content_click(&self, event: &mut ClickEvent) {
        event.stop_propagation();
        self.close_children();
    }

    fn background_click(&self, event: &mut ClickEvent) {
        event.stop_propagation();
        self.request_close();
    }
}

/// One running popover.
///
/// `A` is the anchor handle type; see [`Anchor`].
pub struct Overlay<A: Anchor + 'static> {
    shared: Rc<Shared<A>>,
    host: OverlayHost,
    parent: Option<ParentLink>,
    registration: Option<Registration>,
    subscription: Option<Subscription>,
}

impl<A: Anchor + 'static> core::fmt::Debug for Overlay<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Overlay")
            .field("id", &self.shared.id)
            .field("phase", &self.phase())
            .field("children", &self.child_count())
            .field("parent", &self.parent.as_ref().map(ParentLink::owner))
            .finish_non_exhaustive()
    }
}

impl<A: Anchor + 'static> Overlay<A> {
    /// Create a hidden overlay on `host`, nested inside the overlay behind `parent`, if any.
    pub fn new(host: &OverlayHost, parent: Option<&ParentLink>, props: OverlayProps) -> Self {
        let id = host.allocate_id();
        let shared = Rc::new_cyclic(|this| Shared {
            id,
            this: this.clone(),
            ticks: host.ticks().clone(),
            state: RefCell::new(State {
                visible: false,
                target: None,
                may_close: false,
                close_requested: false,
                epoch: 0,
                props,
            }),
            children: Rc::new(ChildHooks::default()),
            on_change: RefCell::new(None),
        });

        let subscription = {
            let weak = Rc::downgrade(&shared);
            host.signal().subscribe(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.request_close();
                }
            })
        };
        let target: Rc<dyn LayerTarget> = shared.clone();
        host.attach_layer(id, Rc::downgrade(&target));

        let mut overlay = Self {
            shared,
            host: host.clone(),
            parent: parent.cloned(),
            registration: None,
            subscription: Some(subscription),
        };
        overlay.register_with_parent();
        tracing::debug!(
            overlay = id.0,
            parent = ?parent.map(|p| p.owner().0),
            "overlay created"
        );
        overlay
    }

    /// Create a hidden overlay whose parent is the innermost overlay of `scope`.
    pub fn new_in_scope(host: &OverlayHost, scope: &OverlayScope, props: OverlayProps) -> Self {
        Self::new(host, scope.current(), props)
    }

    /// This overlay's identifier.
    pub fn id(&self) -> OverlayId {
        self.shared.id
    }

    /// Registration channel for overlays nested in this overlay's content.
    pub fn link(&self) -> ParentLink {
        ParentLink::new(self.shared.id, &self.shared.children)
    }

    /// The parent this overlay registered with, if any.
    pub fn parent(&self) -> Option<&ParentLink> {
        self.parent.as_ref()
    }

    /// Set the callback receiving close requests (always `false`).
    pub fn set_on_visible_change(&mut self, callback: impl FnMut(bool) + 'static) {
        *self.shared.on_change.borrow_mut() = Some(Box::new(callback));
    }

    /// Apply the consumer's `visible` value.
    ///
    /// On `false → true` the close guard is disarmed and arms one tick later.
    /// On `true → false` the guard resets immediately; children are not told to close.
    pub fn set_visible(&mut self, visible: bool) {
        let epoch = {
            let mut state = self.shared.state.borrow_mut();
            if state.visible == visible {
                return;
            }
            state.visible = visible;
            state.may_close = false;
            state.close_requested = false;
            if !visible {
                tracing::trace!(overlay = self.shared.id.0, "hidden");
                return;
            }
            state.epoch = state.epoch.wrapping_add(1);
            state.epoch
        };
        tracing::trace!(overlay = self.shared.id.0, "shown, arming next tick");
        self.shared.arm_next_tick(epoch);
        self.register_with_parent();
    }

    /// The consumer's last `visible` value.
    pub fn is_visible(&self) -> bool {
        self.shared.state.borrow().visible
    }

    /// Set (or clear) the anchor element.
    pub fn set_target(&mut self, target: Option<A>) {
        self.shared.state.borrow_mut().target = target;
    }

    /// Replace the configuration.
    pub fn set_props(&mut self, props: OverlayProps) {
        self.shared.state.borrow_mut().props = props;
    }

    /// The current configuration.
    pub fn props(&self) -> OverlayProps {
        self.shared.state.borrow().props.clone()
    }

    /// `visible` and the anchor is mounted.
    pub fn is_active(&self) -> bool {
        self.shared.state.borrow().is_active()
    }

    /// Whether close requests are currently honored.
    pub fn may_close(&self) -> bool {
        self.shared.state.borrow().may_close
    }

    /// Current phase.
    pub fn phase(&self) -> OverlayPhase {
        let state = self.shared.state.borrow();
        if !state.is_active() {
            OverlayPhase::Closed
        } else if state.may_close {
            OverlayPhase::Open
        } else if state.close_requested {
            OverlayPhase::Closing
        } else {
            OverlayPhase::Opening
        }
    }

    /// Number of close hooks registered by nested overlays.
    pub fn child_count(&self) -> usize {
        self.shared.children.len()
    }

    /// Ask the consumer to hide this overlay.
    ///
    /// Does nothing unless the overlay is active and its guard is armed. Otherwise tells every
    /// registered child to close, drains the child hooks, and then calls the visibility callback
    /// with `false`. Returns whether the callback was reached.
    pub fn request_close(&self) -> bool {
        self.shared.request_close()
    }

    /// Dismissal-signal entry point: the same as [`request_close`](Self::request_close).
    pub fn handle_outside_click(&self) -> bool {
        self.shared.request_close()
    }

    /// A click on this overlay's backdrop, outside its content.
    ///
    /// Stops the click, then requests a close.
    pub fn handle_background_click(&self, event: &mut ClickEvent) {
        self.shared.background_click(event);
    }

    /// A click inside this overlay's content.
    ///
    /// Stops the click and tells every registered child to close, keeping this overlay open and
    /// the child hooks registered.
    pub fn handle_content_click(&self, event: &mut ClickEvent) {
        self.shared.content_click(event);
    }

    /// Describe this overlay to the host renderer.
    pub fn render<R: Renderer<A>>(&self, renderer: &mut R) {
        let state = self.shared.state.borrow();
        let active = state.is_active();
        let request = MountRequest {
            overlay: self.shared.id,
            anchor: if active { state.target.as_ref() } else { None },
            content_visible: active,
            backdrop_visible: active && !state.props.no_background,
            transition: &state.props.transition,
        };
        renderer.mount(&request);
    }

    fn register_with_parent(&mut self) {
        let Some(parent) = &self.parent else {
            return;
        };
        if self.registration.as_ref().is_some_and(Registration::is_pending) {
            return;
        }
        let weak = Rc::downgrade(&self.shared);
        self.registration = parent.register(move || {
            if let Some(shared) = weak.upgrade() {
                shared.request_close();
            }
        });
    }
}

impl<A: Anchor + 'static> Drop for Overlay<A> {
    fn drop(&mut self) {
        self.shared.request_close();
        self.shared.children.clear();
        if let (Some(parent), Some(registration)) = (&self.parent, self.registration.take()) {
            parent.unregister(registration);
        }
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.host.detach_layer(self.shared.id);
        tracing::debug!(overlay = self.shared.id.0, "overlay dropped");
    }
}
