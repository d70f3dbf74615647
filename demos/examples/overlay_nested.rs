// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nested popovers.
//!
//! A button opens a popover whose content holds a second button with its own popover.
//! The example replays a sequence of clicks and prints which popovers are open after each one.
//!
//! Run:
//! - `cargo run -p understory_demos --example overlay_nested`
//! - `RUST_LOG=understory_overlay=trace cargo run -p understory_demos --example overlay_nested`

use std::cell::Cell;
use std::rc::Rc;

use kurbo::{Point, Rect};
use tracing_subscriber::EnvFilter;
use understory_overlay::host::OverlayHost;
use understory_overlay::link::OverlayScope;
use understory_overlay::overlay::Overlay;
use understory_overlay::render::{AnchorRef, MountRequest, OverlayProps, Renderer};

/// Consumer-side state for one popover: the `visible` flag and the trigger's bounds.
struct Popover {
    name: &'static str,
    overlay: Overlay<AnchorRef>,
    open: Rc<Cell<bool>>,
    trigger: Rect,
}

impl Popover {
    fn new(
        host: &OverlayHost,
        scope: &OverlayScope,
        name: &'static str,
        trigger: Rect,
        content: Rect,
    ) -> Self {
        let mut overlay =
            Overlay::new_in_scope(host, scope, OverlayProps::default().with_no_background(true));
        overlay.set_target(Some(AnchorRef::mounted()));
        assert!(host.set_content_bounds(overlay.id(), Some(content)));
        let open = Rc::new(Cell::new(false));
        let state = open.clone();
        overlay.set_on_visible_change(move |v| state.set(v));
        Self {
            name,
            overlay,
            open,
            trigger,
        }
    }
}

/// Prints what the host would mount.
struct Printer;

impl Renderer<AnchorRef> for Printer {
    fn mount(&mut self, request: &MountRequest<'_, AnchorRef>) {
        if request.content_visible {
            println!(
                "    overlay {:>2}: shown  (transition {:?})",
                request.overlay.get(),
                request.transition
            );
        } else {
            println!("    overlay {:>2}: hidden", request.overlay.get());
        }
    }
}

fn click(host: &OverlayHost, popovers: &mut [Popover], label: &str, pt: Point) {
    println!("click {label} at ({}, {})", pt.x, pt.y);

    // Trigger handlers run first: they are the innermost targets.
    // A trigger only receives the click when its popover layer is not covering it.
    for p in popovers.iter() {
        if p.trigger.contains(pt) {
            p.open.set(!p.open.get());
        }
    }
    let reached_document = host.click_at(pt);
    println!("  reached document: {reached_document}");

    // Re-render with the consumer state, then let the turn end.
    for p in popovers.iter_mut() {
        p.overlay.set_visible(p.open.get());
    }
    host.run_tick();

    for p in popovers.iter() {
        println!("  {:<6} {:?}", p.name, p.overlay.phase());
        p.overlay.render(&mut Printer);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = OverlayHost::new();
    let mut scope = OverlayScope::new();

    let first = Popover::new(
        &host,
        &scope,
        "first",
        Rect::new(10.0, 10.0, 110.0, 40.0),
        Rect::new(10.0, 50.0, 310.0, 250.0),
    );
    let second = scope.within(first.overlay.link(), |scope| {
        Popover::new(
            &host,
            scope,
            "second",
            Rect::new(20.0, 200.0, 170.0, 230.0),
            Rect::new(320.0, 200.0, 620.0, 400.0),
        )
    });
    let mut popovers = [first, second];

    click(&host, &mut popovers, "first trigger", Point::new(50.0, 20.0));
    click(&host, &mut popovers, "second trigger", Point::new(50.0, 210.0));
    click(&host, &mut popovers, "second content", Point::new(400.0, 300.0));
    click(&host, &mut popovers, "first content", Point::new(100.0, 100.0));
    click(&host, &mut popovers, "second trigger", Point::new(50.0, 210.0));
    click(&host, &mut popovers, "outside", Point::new(900.0, 900.0));
}
