// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Click routing across overlay layers.
//!
//! ## Overview
//!
//! Each mounted overlay is one layer at the document root: a backdrop with the content inside it.
//! Layers stack in mount order, later on top, so a nested overlay sits above its parent.
//!
//! A click resolves to a root→target path of [`LayerHit`]s. The host bubbles it from the target
//! outwards, calling the content or background handler of each hit, and stops as soon as one of
//! them stops propagation. A click nobody stopped reached the document, and the host fires the
//! [`DismissalSignal`](crate::signal::DismissalSignal).
//!
//! Both overlay handlers stop propagation, so a click is attributed to at most one overlay region.
//!
//! ## Hit testing
//!
//! [`OverlayHost::click_at`](crate::host::OverlayHost::click_at) resolves the path from the content
//! bounds reported with [`OverlayHost::set_content_bounds`](crate::host::OverlayHost::set_content_bounds):
//! - The topmost layer whose content is shown and contains the point gets a content hit.
//! - Otherwise the topmost layer with a shown backdrop gets a background hit.
//! - Otherwise the click goes straight to the document.

use alloc::rc::{Rc, Weak};
use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::OverlayId;

bitflags::bitflags! {
    /// What part of a layer currently takes part in hit testing.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LayerFlags: u8 {
        /// Content is shown.
        const CONTENT  = 0b0000_0001;
        /// Backdrop is shown and catches clicks outside the content.
        const BACKDROP = 0b0000_0010;
    }
}

/// The part of an overlay layer a click landed on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Region {
    /// Inside the overlay's content.
    Content,
    /// On the overlay's backdrop, outside its content.
    Background,
}

/// One step of a click path.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct LayerHit {
    /// Overlay owning the region.
    pub overlay: OverlayId,
    /// Region within that overlay.
    pub region: Region,
}

impl LayerHit {
    /// A hit on `overlay`'s content.
    pub const fn content(overlay: OverlayId) -> Self {
        Self {
            overlay,
            region: Region::Content,
        }
    }

    /// A hit on `overlay`'s backdrop.
    pub const fn background(overlay: OverlayId) -> Self {
        Self {
            overlay,
            region: Region::Background,
        }
    }
}

/// A pointer click travelling through overlay layers.
#[derive(Clone, Debug, Default)]
pub struct ClickEvent {
    stopped: bool,
}

impl ClickEvent {
    /// A fresh click that has not been stopped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the click from reaching outer regions and the document.
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    /// Whether a handler stopped this click.
    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped
    }
}

/// Type-erased view of an overlay, as seen by the layer stack.
pub(crate) trait LayerTarget {
    fn flags(&self) -> LayerFlags;
    fn content_click(&self, event: &mut ClickEvent);
    fn background_click(&self, event: &mut ClickEvent);
}

struct Layer {
    id: OverlayId,
    target: Weak<dyn LayerTarget>,
    bounds: Option<Rect>,
}

/// Mounted overlays in stacking order (bottom first).
#[derive(Default)]
pub(crate) struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    pub(crate) fn attach(&mut self, id: OverlayId, target: Weak<dyn LayerTarget>) {
        self.layers.push(Layer {
            id,
            target,
            bounds: None,
        });
    }

    pub(crate) fn detach(&mut self, id: OverlayId) {
        self.layers.retain(|l| l.id != id);
    }

    pub(crate) fn len(&self) -> usize {
        self.layers.len()
    }

    pub(crate) fn set_content_bounds(&mut self, id: OverlayId, bounds: Option<Rect>) -> bool {
        match self.layers.iter_mut().find(|l| l.id == id) {
            Some(layer) => {
                layer.bounds = bounds;
                true
            }
            None => false,
        }
    }

    pub(crate) fn target(&self, id: OverlayId) -> Option<Rc<dyn LayerTarget>> {
        self.layers
            .iter()
            .find(|l| l.id == id)
            .and_then(|l| l.target.upgrade())
    }

    /// Resolve the root→target click path for `pt`, topmost layer first.
    pub(crate) fn hit_path(&self, pt: Point) -> Vec<LayerHit> {
        for layer in self.layers.iter().rev() {
            let Some(target) = layer.target.upgrade() else {
                continue;
            };
            let flags = target.flags();
            if flags.contains(LayerFlags::CONTENT) && layer.bounds.is_some_and(|b| b.contains(pt))
            {
                return vec![LayerHit::background(layer.id), LayerHit::content(layer.id)];
            }
            if flags.contains(LayerFlags::BACKDROP) {
                return vec![LayerHit::background(layer.id)];
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct Fake {
        flags: Cell<LayerFlags>,
    }

    impl LayerTarget for Fake {
        fn flags(&self) -> LayerFlags {
            self.flags.get()
        }
        fn content_click(&self, event: &mut ClickEvent) {
            event.stop_propagation();
        }
        fn background_click(&self, event: &mut ClickEvent) {
            event.stop_propagation();
        }
    }

    fn fake(flags: LayerFlags) -> Rc<Fake> {
        Rc::new(Fake {
            flags: Cell::new(flags),
        })
    }

    fn attach(stack: &mut LayerStack, id: u32, f: &Rc<Fake>, bounds: Rect) {
        let target: Rc<dyn LayerTarget> = f.clone();
        stack.attach(OverlayId(id), Rc::downgrade(&target));
        assert!(stack.set_content_bounds(OverlayId(id), Some(bounds)));
    }

    #[test]
    fn topmost_content_wins() {
        let mut stack = LayerStack::default();
        let a = fake(LayerFlags::CONTENT);
        let b = fake(LayerFlags::CONTENT);
        attach(&mut stack, 1, &a, Rect::new(0.0, 0.0, 100.0, 100.0));
        attach(&mut stack, 2, &b, Rect::new(50.0, 50.0, 150.0, 150.0));
        assert_eq!(
            stack.hit_path(Point::new(60.0, 60.0)),
            vec![
                LayerHit::background(OverlayId(2)),
                LayerHit::content(OverlayId(2))
            ]
        );
        assert_eq!(
            stack.hit_path(Point::new(10.0, 10.0)),
            vec![
                LayerHit::background(OverlayId(1)),
                LayerHit::content(OverlayId(1))
            ]
        );
    }

    #[test]
    fn backdrop_catches_clicks_outside_content() {
        let mut stack = LayerStack::default();
        let a = fake(LayerFlags::CONTENT);
        let b = fake(LayerFlags::CONTENT | LayerFlags::BACKDROP);
        attach(&mut stack, 1, &a, Rect::new(0.0, 0.0, 100.0, 100.0));
        attach(&mut stack, 2, &b, Rect::new(200.0, 200.0, 300.0, 300.0));
        // Inside the lower layer's content, but the upper backdrop covers it.
        assert_eq!(
            stack.hit_path(Point::new(10.0, 10.0)),
            vec![LayerHit::background(OverlayId(2))]
        );
    }

    #[test]
    fn hidden_layers_are_transparent() {
        let mut stack = LayerStack::default();
        let a = fake(LayerFlags::empty());
        attach(&mut stack, 1, &a, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(stack.hit_path(Point::new(10.0, 10.0)).is_empty());
        a.flags.set(LayerFlags::CONTENT);
        assert_eq!(stack.hit_path(Point::new(10.0, 10.0)).len(), 2);
        drop(a);
        assert!(stack.hit_path(Point::new(10.0, 10.0)).is_empty());
    }

    #[test]
    fn detach_and_unknown_ids() {
        let mut stack = LayerStack::default();
        let a = fake(LayerFlags::CONTENT);
        attach(&mut stack, 1, &a, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(stack.len(), 1);
        stack.detach(OverlayId(1));
        assert_eq!(stack.len(), 0);
        assert!(stack.target(OverlayId(1)).is_none());
        assert!(!stack.set_content_bounds(OverlayId(1), None));
    }

    #[test]
    fn click_event_stops() {
        let mut ev = ClickEvent::new();
        assert!(!ev.is_propagation_stopped());
        ev.stop_propagation();
        assert!(ev.is_propagation_stopped());
    }
}
