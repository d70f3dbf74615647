// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Zero-delay deferral queue.
//!
//! A [`TickQueue`] stands in for "run this after the current event loop turn yields".
//! The host drives it: after handling each input event (and any state updates that event
//! caused), call [`TickQueue::run_turn`] once.
//!
//! Overlays use it for the close guard: the guard arms one turn after `visible` becomes `true`,
//! so the click that opened an overlay cannot also dismiss it.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

type Task = Box<dyn FnOnce()>;

/// Shared queue of deferred tasks.
///
/// Cheap to clone; clones share the same queue.
#[derive(Clone, Default)]
pub struct TickQueue {
    tasks: Rc<RefCell<Vec<Task>>>,
}

impl core::fmt::Debug for TickQueue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TickQueue")
            .field("pending", &self.pending())
            .finish()
    }
}

impl TickQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer `task` to the next turn.
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push(Box::new(task));
    }

    /// Run every task that was queued before this call, in FIFO order.
    ///
    /// Tasks deferred while the turn runs wait for the next turn.
    /// Returns the number of tasks run.
    pub fn run_turn(&self) -> usize {
        let batch = core::mem::take(&mut *self.tasks.borrow_mut());
        let n = batch.len();
        for task in batch {
            task();
        }
        n
    }

    /// Number of tasks waiting for the next turn.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Returns `true` if nothing is waiting.
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn tasks_run_fifo_on_next_turn() {
        let q = TickQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            q.defer(move || log.borrow_mut().push(i));
        }
        assert!(log.borrow().is_empty());
        assert_eq!(q.run_turn(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(q.is_idle());
    }

    #[test]
    fn tasks_deferred_during_a_turn_wait_for_the_next() {
        let q = TickQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let q2 = q.clone();
            let log = log.clone();
            q.defer(move || {
                log.borrow_mut().push("outer");
                let log = log.clone();
                q2.defer(move || log.borrow_mut().push("inner"));
            });
        }
        assert_eq!(q.run_turn(), 1);
        assert_eq!(*log.borrow(), vec!["outer"]);
        assert_eq!(q.pending(), 1);
        assert_eq!(q.run_turn(), 1);
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
    }
}
