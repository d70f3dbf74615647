// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backdrops versus click-outside.
//!
//! Two unrelated popovers are open: a tooltip without a backdrop and a dialog with one.
//! A click on the dialog's backdrop closes only the dialog. Once it is gone, a click on empty
//! space reaches the document and closes the tooltip through the dismissal signal.
//!
//! Run:
//! - `cargo run -p understory_demos --example overlay_backdrop`

use std::cell::Cell;
use std::rc::Rc;

use kurbo::{Point, Rect};
use tracing_subscriber::EnvFilter;
use understory_overlay::host::OverlayHost;
use understory_overlay::overlay::Overlay;
use understory_overlay::render::{AnchorRef, OverlayProps, Transition};
use understory_overlay::signal::DismissalSignal;

struct Popover {
    name: &'static str,
    overlay: Overlay<AnchorRef>,
    open: Rc<Cell<bool>>,
}

fn popover(host: &OverlayHost, name: &'static str, props: OverlayProps, content: Rect) -> Popover {
    let mut overlay = Overlay::new(host, None, props);
    overlay.set_target(Some(AnchorRef::mounted()));
    assert!(host.set_content_bounds(overlay.id(), Some(content)));
    let open = Rc::new(Cell::new(true));
    let state = open.clone();
    overlay.set_on_visible_change(move |v| state.set(v));
    overlay.set_visible(true);
    Popover {
        name,
        overlay,
        open,
    }
}

fn click(host: &OverlayHost, popovers: &mut [Popover], pt: Point) {
    let reached_document = host.click_at(pt);
    for p in popovers.iter_mut() {
        p.overlay.set_visible(p.open.get());
    }
    host.run_tick();
    println!("click at ({}, {}): reached document = {reached_document}", pt.x, pt.y);
    for p in popovers.iter() {
        println!("  {:<8} {:?}", p.name, p.overlay.phase());
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // The host attaches its one document listener lazily.
    let signal = DismissalSignal::with_installer(|| println!("document click listener installed"));
    let host = OverlayHost::with_signal(signal);

    let tooltip = popover(
        &host,
        "tooltip",
        OverlayProps::default()
            .with_no_background(true)
            .with_transition(Transition::Disabled),
        Rect::new(0.0, 0.0, 100.0, 40.0),
    );
    let dialog = popover(
        &host,
        "dialog",
        OverlayProps::default().with_transition(Transition::Named("fade".into())),
        Rect::new(200.0, 200.0, 400.0, 400.0),
    );
    let mut popovers = [tooltip, dialog];
    host.run_tick();

    // Inside the dialog: nothing closes.
    click(&host, &mut popovers, Point::new(300.0, 300.0));
    // On the dialog's backdrop, above the tooltip: only the dialog closes.
    click(&host, &mut popovers, Point::new(10.0, 10.0));
    // Inside the tooltip, now uncovered: nothing closes.
    click(&host, &mut popovers, Point::new(10.0, 10.0));
    // Empty space: the click reaches the document.
    click(&host, &mut popovers, Point::new(600.0, 600.0));
}
