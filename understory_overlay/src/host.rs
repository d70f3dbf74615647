// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared environment overlays live in.
//!
//! ## Overview
//!
//! An [`OverlayHost`] bundles:
//! - the [`DismissalSignal`] every overlay subscribes to,
//! - the [`TickQueue`] that arms close guards,
//! - the layer stack used to route clicks to content and background regions,
//! - the id allocator.
//!
//! ## Driving it
//!
//! Per pointer click, after your own widget handlers ran:
//! 1) Call [`OverlayHost::click_at`] (or [`OverlayHost::click`] with a path from your own hit
//!    testing). Overlay regions stop the click; anything else reaches the document and fires the
//!    dismissal signal.
//! 2) Apply the visibility changes your callbacks recorded ([`Overlay::set_visible`](crate::overlay::Overlay::set_visible)).
//! 3) Call [`OverlayHost::run_tick`] once the event loop turn is over.

use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};

use kurbo::{Point, Rect};

use crate::OverlayId;
use crate::dispatch::{ClickEvent, LayerHit, LayerStack, LayerTarget, Region};
use crate::signal::DismissalSignal;
use crate::tick::TickQueue;

/// Shared overlay environment.
///
/// Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct OverlayHost {
    inner: Rc<HostInner>,
}

struct HostInner {
    signal: DismissalSignal,
    ticks: TickQueue,
    layers: RefCell<LayerStack>,
    next_id: Cell<u32>,
}

impl core::fmt::Debug for OverlayHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OverlayHost")
            .field("signal", &self.inner.signal)
            .field("ticks", &self.inner.ticks)
            .field("layers", &self.layer_count())
            .finish_non_exhaustive()
    }
}

impl Default for OverlayHost {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayHost {
    /// Create a host with its own dismissal signal.
    pub fn new() -> Self {
        Self::with_signal(DismissalSignal::new())
    }

    /// Create a host around an existing dismissal signal.
    pub fn with_signal(signal: DismissalSignal) -> Self {
        Self {
            inner: Rc::new(HostInner {
                signal,
                ticks: TickQueue::new(),
                layers: RefCell::new(LayerStack::default()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Create a host on the thread's shared [`DismissalSignal::global`].
    #[cfg(feature = "std")]
    pub fn global() -> Self {
        Self::with_signal(DismissalSignal::global())
    }

    /// The dismissal signal.
    pub fn signal(&self) -> &DismissalSignal {
        &self.inner.signal
    }

    /// The deferral queue.
    pub fn ticks(&self) -> &TickQueue {
        &self.inner.ticks
    }

    /// End the current event loop turn: run every deferred task queued so far.
    pub fn run_tick(&self) -> usize {
        self.inner.ticks.run_turn()
    }

    /// Number of overlays in the layer stack.
    pub fn layer_count(&self) -> usize {
        self.inner.layers.borrow().len()
    }

    /// Report where an overlay's content was laid out, for [`click_at`](Self::click_at).
    ///
    /// `None` clears the bounds. Returns `false` if the overlay is unknown.
    pub fn set_content_bounds(&self, overlay: OverlayId, bounds: Option<Rect>) -> bool {
        self.inner
            .layers
            .borrow_mut()
            .set_content_bounds(overlay, bounds)
    }

    /// Route a click along a root→target `path` of overlay regions.
    ///
    /// The click bubbles from the last hit to the first. If no region stops it, the dismissal
    /// signal fires. Returns `true` if the click reached the document.
    /// Hits on unknown or dropped overlays are skipped.
    pub fn click(&self, path: &[LayerHit]) -> bool {
        let mut event = ClickEvent::new();
        for hit in path.iter().rev() {
            // Upgrade first; handlers may drop overlays and mutate the layer stack.
            let target = self.inner.layers.borrow().target(hit.overlay);
            let Some(target) = target else {
                continue;
            };
            match hit.region {
                Region::Content => target.content_click(&mut event),
                Region::Background => target.background_click(&mut event),
            }
            if event.is_propagation_stopped() {
                tracing::trace!(overlay = hit.overlay.0, region = ?hit.region, "click stopped");
                return false;
            }
        }
        tracing::trace!("click reached document");
        self.inner.signal.notify();
        true
    }

    /// Hit-test `pt` against the layer stack and route the click.
    ///
    /// See [`dispatch`](crate::dispatch) for the resolution rules.
    pub fn click_at(&self, pt: Point) -> bool {
        let path = self.inner.layers.borrow().hit_path(pt);
        self.click(&path)
    }

    pub(crate) fn allocate_id(&self) -> OverlayId {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id.wrapping_add(1));
        OverlayId(id)
    }

    pub(crate) fn attach_layer(&self, id: OverlayId, target: Weak<dyn LayerTarget>) {
        self.inner.layers.borrow_mut().attach(id, target);
    }

    pub(crate) fn detach_layer(&self, id: OverlayId) {
        self.inner.layers.borrow_mut().detach(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::Overlay;
    use crate::render::{AnchorRef, OverlayProps};
    use alloc::vec;
    use alloc::vec::Vec;

    type Log = Rc<RefCell<Vec<(u32, bool)>>>;

    fn shown(host: &OverlayHost, props: OverlayProps, log: &Log) -> Overlay<AnchorRef> {
        let mut o = Overlay::new(host, None, props);
        o.set_target(Some(AnchorRef::mounted()));
        let id = o.id().get();
        let log = log.clone();
        o.set_on_visible_change(move |v| log.borrow_mut().push((id, v)));
        o.set_visible(true);
        o
    }

    #[test]
    fn ids_are_sequential() {
        let host = OverlayHost::new();
        assert_eq!(host.allocate_id(), OverlayId(0));
        assert_eq!(host.allocate_id(), OverlayId(1));
    }

    #[test]
    fn empty_path_reaches_document() {
        let host = OverlayHost::new();
        let log = Log::default();
        let a = shown(&host, OverlayProps::default(), &log);
        host.run_tick();
        assert!(host.click(&[]));
        assert_eq!(*log.borrow(), vec![(a.id().get(), false)]);
    }

    #[test]
    fn content_hit_does_not_reach_document() {
        let host = OverlayHost::new();
        let log = Log::default();
        let a = shown(&host, OverlayProps::default(), &log);
        host.run_tick();
        assert!(!host.click(&[LayerHit::background(a.id()), LayerHit::content(a.id())]));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn click_at_uses_reported_bounds() {
        let host = OverlayHost::new();
        let log = Log::default();
        let a = shown(&host, OverlayProps::default().with_no_background(true), &log);
        assert!(host.set_content_bounds(a.id(), Some(Rect::new(0.0, 0.0, 50.0, 50.0))));
        host.run_tick();
        assert!(!host.click_at(Point::new(10.0, 10.0)));
        assert!(log.borrow().is_empty());
        assert!(host.click_at(Point::new(100.0, 100.0)));
        assert_eq!(*log.borrow(), vec![(a.id().get(), false)]);
    }

    #[test]
    fn backdrop_click_closes_only_its_overlay() {
        let host = OverlayHost::new();
        let log = Log::default();
        let _a = shown(&host, OverlayProps::default(), &log);
        let b = shown(&host, OverlayProps::default(), &log);
        host.run_tick();
        assert!(!host.click_at(Point::new(500.0, 500.0)));
        assert_eq!(*log.borrow(), vec![(b.id().get(), false)]);
    }

    #[cfg(feature = "std")]
    #[test]
    fn global_hosts_share_one_signal() {
        let a = OverlayHost::global();
        let b = OverlayHost::global();
        let log = Log::default();
        let before = b.signal().len();
        let o = shown(&a, OverlayProps::default(), &log);
        assert_eq!(b.signal().len(), before + 1);
        a.run_tick();
        b.click(&[]);
        assert_eq!(*log.borrow(), vec![(o.id().get(), false)]);
        drop(o);
        assert_eq!(b.signal().len(), before);
    }

    #[test]
    fn unknown_hits_are_skipped() {
        let host = OverlayHost::new();
        assert!(host.click(&[LayerHit::content(OverlayId(42))]));
        assert!(!host.set_content_bounds(OverlayId(42), None));
    }
}
