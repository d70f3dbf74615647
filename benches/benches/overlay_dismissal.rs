// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::rc::Rc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_overlay::dispatch::LayerHit;
use understory_overlay::host::OverlayHost;
use understory_overlay::overlay::Overlay;
use understory_overlay::render::{AnchorRef, OverlayProps};

struct Scene {
    host: OverlayHost,
    overlays: Vec<Overlay<AnchorRef>>,
    emitted: Rc<Cell<usize>>,
}

/// `depth` overlays, each nested in the previous one, all open and armed.
fn nested_chain(depth: usize) -> Scene {
    let host = OverlayHost::new();
    let emitted = Rc::new(Cell::new(0));
    let mut overlays: Vec<Overlay<AnchorRef>> = Vec::with_capacity(depth);
    for _ in 0..depth {
        let parent = overlays.last().map(Overlay::link);
        let mut o = Overlay::new(&host, parent.as_ref(), OverlayProps::default());
        o.set_target(Some(AnchorRef::mounted()));
        let emitted = emitted.clone();
        o.set_on_visible_change(move |_| emitted.set(emitted.get() + 1));
        o.set_visible(true);
        overlays.push(o);
    }
    host.run_tick();
    Scene {
        host,
        overlays,
        emitted,
    }
}

/// `n` unrelated top-level overlays, all open and armed.
fn siblings(n: usize) -> Scene {
    let host = OverlayHost::new();
    let emitted = Rc::new(Cell::new(0));
    let mut overlays = Vec::with_capacity(n);
    for _ in 0..n {
        let mut o = Overlay::new(&host, None, OverlayProps::default());
        o.set_target(Some(AnchorRef::mounted()));
        let emitted = emitted.clone();
        o.set_on_visible_change(move |_| emitted.set(emitted.get() + 1));
        o.set_visible(true);
        overlays.push(o);
    }
    host.run_tick();
    Scene {
        host,
        overlays,
        emitted,
    }
}

fn bench_cascade(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay_cascade");
    for &depth in &[4usize, 32, 256] {
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_function(format!("root_request_close_depth{}", depth), |b| {
            b.iter_batched(
                || nested_chain(depth),
                |scene| {
                    black_box(scene.overlays[0].request_close());
                    black_box(scene.emitted.get());
                    scene
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("root_content_click_depth{}", depth), |b| {
            b.iter_batched(
                || nested_chain(depth),
                |scene| {
                    let root = scene.overlays[0].id();
                    black_box(scene.host.click(&[LayerHit::content(root)]));
                    scene
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_outside_click(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay_outside_click");
    for &n in &[16usize, 256, 4096] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("siblings_n{}", n), |b| {
            b.iter_batched(
                || siblings(n),
                |scene| {
                    black_box(scene.host.click(&[]));
                    scene
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("guarded_siblings_n{}", n), |b| {
            // Close already requested this turn: every handler runs and ignores the click.
            let scene = siblings(n);
            for o in &scene.overlays {
                let _ = o.request_close();
            }
            b.iter(|| black_box(scene.host.click(&[])));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cascade, bench_outside_click);
criterion_main!(benches);
