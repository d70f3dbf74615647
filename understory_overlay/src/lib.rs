// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Overlay: visibility and dismissal coordination for nested popovers.
//!
//! ## Overview
//!
//! An overlay is detached floating content anchored to a trigger element.
//! This crate does not position or draw anything.
//! It decides *when* an overlay should close, and in which order, when overlays nest inside each other's content:
//!
//! - A click outside every overlay closes all of them.
//! - A click inside a parent's content (but not inside a child) closes the open children and keeps the parent.
//! - A click on an overlay's backdrop closes only that overlay.
//! - A parent that closes tells its children to close first, then reports its own close.
//! - The click that opens an overlay can never also close it.
//!
//! ## Pieces
//!
//! - [`DismissalSignal`](crate::signal::DismissalSignal): one document-level click broadcaster, fired after a click has finished bubbling.
//! - [`TickQueue`](crate::tick::TickQueue): a zero-delay deferral queue; one [`run_turn`](crate::tick::TickQueue::run_turn) is one turn of the event loop.
//! - [`Overlay`](crate::overlay::Overlay): one running popover with its close guard and child hooks.
//! - [`ParentLink`](crate::link::ParentLink) and [`OverlayScope`](crate::link::OverlayScope): explicit parent discovery during the build pass.
//! - [`Renderer`](crate::render::Renderer): the consumed mount interface; the host draws.
//! - [`OverlayHost`](crate::host::OverlayHost): the shared environment, including click routing over content and background regions.
//!
//! ## Controlled visibility
//!
//! The consumer owns `visible`.
//! An overlay never flips it; it calls the `on_visible_change` callback with `false` and waits for the consumer to apply it through [`Overlay::set_visible`](crate::overlay::Overlay::set_visible).
//!
//! ## Minimal example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use understory_overlay::host::OverlayHost;
//! use understory_overlay::overlay::Overlay;
//! use understory_overlay::render::{AnchorRef, OverlayProps};
//!
//! let host = OverlayHost::new();
//! let anchor = AnchorRef::mounted();
//! let open = Rc::new(Cell::new(false));
//!
//! let mut popover = Overlay::new(&host, None, OverlayProps::default());
//! popover.set_target(Some(anchor));
//! let state = open.clone();
//! popover.set_on_visible_change(move |v| state.set(v));
//!
//! // The trigger click opens it; the same turn cannot close it.
//! open.set(true);
//! popover.set_visible(true);
//! assert!(!popover.request_close());
//!
//! // One turn later an outside click closes it.
//! host.run_tick();
//! host.click(&[]);
//! assert!(!open.get());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod dispatch;
pub mod host;
pub mod link;
pub mod overlay;
pub mod render;
pub mod signal;
pub mod tick;

/// Identifier of an overlay instance within one [`OverlayHost`](crate::host::OverlayHost).
///
/// Allocated sequentially by the host; never reused while the host lives.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct OverlayId(pub(crate) u32);

impl OverlayId {
    /// Returns the raw index, mainly for logging.
    pub const fn get(self) -> u32 {
        self.0
    }
}
