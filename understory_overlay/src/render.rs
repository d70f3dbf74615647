// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer boundary: what an overlay hands to the host that actually draws it.
//!
//! ## Overview
//!
//! The host mounts overlay content outside the normal layout flow (at the document root) and runs
//! enter/leave transitions keyed off visibility. This crate computes no geometry. Each
//! [`Overlay::render`](crate::overlay::Overlay::render) call produces one [`MountRequest`] and
//! passes it to your [`Renderer`].
//!
//! The content itself belongs to the host; the request only says whether it is shown.

use alloc::rc::Rc;
use alloc::string::String;
use core::cell::Cell;

use crate::OverlayId;

/// A handle to the element an overlay is anchored to.
///
/// An overlay is only active while its anchor resolves to a mounted element.
pub trait Anchor {
    /// Returns `true` while the anchor refers to a real, mounted element.
    fn is_mounted(&self) -> bool;
}

/// Shared mount flag usable as an [`Anchor`] when the host has no richer element handle.
///
/// Starts unmounted with [`AnchorRef::new`], the equivalent of an element reference that has not
/// been bound yet. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct AnchorRef {
    mounted: Rc<Cell<bool>>,
}

impl AnchorRef {
    /// Create an unmounted anchor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an anchor that is already mounted.
    pub fn mounted() -> Self {
        let anchor = Self::default();
        anchor.mount();
        anchor
    }

    /// Mark the element as mounted.
    pub fn mount(&self) {
        self.mounted.set(true);
    }

    /// Mark the element as unmounted.
    pub fn unmount(&self) {
        self.mounted.set(false);
    }
}

impl Anchor for AnchorRef {
    fn is_mounted(&self) -> bool {
        self.mounted.get()
    }
}

impl<T: Anchor + ?Sized> Anchor for Rc<T> {
    fn is_mounted(&self) -> bool {
        (**self).is_mounted()
    }
}

/// Enter/leave transition selection.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Transition {
    /// Show and hide immediately.
    Disabled,
    /// Use a transition the host knows by name.
    Named(String),
    /// Use the host's built-in overlay animation.
    #[default]
    Builtin,
}

/// Per-overlay configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OverlayProps {
    /// Do not show (or hit-test) a backdrop behind the content.
    ///
    /// Without a backdrop, clicks outside the content fall through to whatever is underneath and,
    /// if nothing stops them, reach the [`DismissalSignal`](crate::signal::DismissalSignal).
    pub no_background: bool,
    /// Transition used when the overlay shows or hides.
    pub transition: Transition,
}

impl OverlayProps {
    /// Set [`no_background`](Self::no_background).
    pub fn with_no_background(mut self, no_background: bool) -> Self {
        self.no_background = no_background;
        self
    }

    /// Set [`transition`](Self::transition).
    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = transition;
        self
    }
}

/// What the host should mount for one overlay.
#[derive(Debug)]
pub struct MountRequest<'a, A> {
    /// The overlay being rendered.
    pub overlay: OverlayId,
    /// The anchor to position against; `Some` only while the overlay is active.
    pub anchor: Option<&'a A>,
    /// Whether the content is shown. The host runs the enter/leave transition on changes.
    pub content_visible: bool,
    /// Whether the backdrop is shown and receives clicks.
    pub backdrop_visible: bool,
    /// Transition configuration.
    pub transition: &'a Transition,
}

/// The host side of the renderer boundary.
pub trait Renderer<A> {
    /// Mount (or update) the overlay at the document root according to `request`.
    fn mount(&mut self, request: &MountRequest<'_, A>);
}
