//! # Bounded LIFO Store
//!
//! A capacity-limited stack with an O(1) size counter.
//!
//! ## Invariants
//!
//! - The counter changes only inside the same critical section as the
//!   container, so no observer sees a count without its element.
//! - `len() <= capacity()` at every observation point. Pushes beyond
//!   capacity wait; nothing is overwritten or dropped.
//! - Every successful push wakes all blocked poppers and every successful
//!   pop wakes all blocked pushers. Woken waiters race for the store; a loser
//!   gets its message back and blocks again.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::message::Message;

/// Capacity-limited LIFO stack shared by all connection handlers.
#[derive(Debug)]
pub struct LifoStore {
    /// Messages, top of stack at the back.
    stack: Mutex<VecDeque<Message>>,
    /// Tracked size; the only value used for capacity decisions.
    size: AtomicUsize,
    capacity: usize,
    not_full: Condvar,
    not_empty: Condvar,
}

impl LifoStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            stack: Mutex::new(VecDeque::with_capacity(capacity)),
            size: AtomicUsize::new(0),
            capacity,
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of messages held, read from the counter.
    pub fn len(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Push without blocking. A full store hands the message back.
    pub fn try_push(&self, message: Message) -> Result<(), Message> {
        let mut stack = self.stack.lock();
        self.push_locked(&mut stack, message)
    }

    /// Pop the most recently pushed message without blocking.
    pub fn try_pop(&self) -> Option<Message> {
        let mut stack = self.stack.lock();
        self.pop_locked(&mut stack)
    }

    /// Push, waiting at most `wait` for room if the store is full.
    ///
    /// `interrupted` is evaluated under the store lock before each attempt;
    /// once it returns true the message is handed back without touching the
    /// store. Anything that flips the condition must call
    /// [`wake_all`](Self::wake_all) afterwards so a parked waiter observes it.
    pub fn push_within<F>(
        &self,
        message: Message,
        wait: Duration,
        interrupted: F,
    ) -> Result<(), Message>
    where
        F: Fn() -> bool,
    {
        let mut stack = self.stack.lock();
        if interrupted() {
            return Err(message);
        }
        let message = match self.push_locked(&mut stack, message) {
            Ok(()) => return Ok(()),
            Err(message) => message,
        };
        self.not_full.wait_for(&mut stack, wait);
        if interrupted() {
            return Err(message);
        }
        self.push_locked(&mut stack, message)
    }

    /// Pop, waiting at most `wait` for a message if the store is empty.
    ///
    /// See [`push_within`](Self::push_within) for the `interrupted` contract.
    pub fn pop_within<F>(&self, wait: Duration, interrupted: F) -> Option<Message>
    where
        F: Fn() -> bool,
    {
        let mut stack = self.stack.lock();
        if interrupted() {
            return None;
        }
        if let Some(message) = self.pop_locked(&mut stack) {
            return Some(message);
        }
        self.not_empty.wait_for(&mut stack, wait);
        if interrupted() {
            return None;
        }
        self.pop_locked(&mut stack)
    }

    /// Wake every blocked pusher and popper so they re-check their
    /// interruption flags.
    pub fn wake_all(&self) {
        let _stack = self.stack.lock();
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    fn push_locked(
        &self,
        stack: &mut MutexGuard<'_, VecDeque<Message>>,
        message: Message,
    ) -> Result<(), Message> {
        if self.size.load(Ordering::Acquire) >= self.capacity {
            return Err(message);
        }
        stack.push_back(message);
        self.size.fetch_add(1, Ordering::AcqRel);
        self.not_empty.notify_all();
        Ok(())
    }

    fn pop_locked(&self, stack: &mut MutexGuard<'_, VecDeque<Message>>) -> Option<Message> {
        if self.size.load(Ordering::Acquire) == 0 {
            return None;
        }
        let message = stack.pop_back()?;
        self.size.fetch_sub(1, Ordering::AcqRel);
        self.not_full.notify_all();
        Some(message)
    }
}
