// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
A lock the owning thread may acquire again.

A `Lox` holds its lock for the full duration of every log call, and formatting a log argument
may itself log through the same `Lox`. A plain mutex would deadlock on that nested call, so
ownership is tracked per thread together with an acquisition depth.

The lock only hands out shared references. Mutation goes through a `RefCell` inside, and
callers must not keep a `RefCell` borrow alive across code that can re-enter.
*/

use crate::thread::ThreadIdent;
use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::sync::{Condvar, Mutex, PoisonError};

#[derive(Debug, Default)]
struct Ownership {
    owner: Option<u64>,
    depth: usize,
}

pub(crate) struct ReentrantLock<T> {
    data: UnsafeCell<T>,
    ownership: Mutex<Ownership>,
    released: Condvar,
}

// Only the owning thread ever gets a reference to `data`, and it never gets a `&mut`.
unsafe impl<T: Send> Send for ReentrantLock<T> {}
unsafe impl<T: Send> Sync for ReentrantLock<T> {}

impl<T> ReentrantLock<T> {
    pub(crate) fn new(data: T) -> Self {
        ReentrantLock {
            data: UnsafeCell::new(data),
            ownership: Mutex::new(Ownership::default()),
            released: Condvar::new(),
        }
    }

    /// Blocks until the calling thread owns the lock.
    pub(crate) fn lock(&self) -> ReentrantGuard<'_, T> {
        let me = ThreadIdent::current_id();
        let mut ownership = self
            .ownership
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            match ownership.owner {
                None => {
                    ownership.owner = Some(me);
                    ownership.depth = 1;
                    break;
                }
                Some(owner) if owner == me => {
                    ownership.depth += 1;
                    break;
                }
                Some(_) => {
                    ownership = self
                        .released
                        .wait(ownership)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
        let depth = ownership.depth;
        ReentrantGuard {
            lock: self,
            depth,
            _not_send: PhantomData,
        }
    }

    fn unlock(&self) {
        let mut ownership = self
            .ownership
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        ownership.depth -= 1;
        if ownership.depth == 0 {
            ownership.owner = None;
            drop(ownership);
            self.released.notify_one();
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ReentrantLock<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ownership = self
            .ownership
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ReentrantLock")
            .field("owner", &ownership.owner)
            .field("depth", &ownership.depth)
            .finish_non_exhaustive()
    }
}

pub(crate) struct ReentrantGuard<'a, T> {
    lock: &'a ReentrantLock<T>,
    depth: usize,
    // the guard must be dropped on the thread that acquired it
    _not_send: PhantomData<*const ()>,
}

impl<T> ReentrantGuard<'_, T> {
    /// How many times the owning thread holds the lock, this guard included.
    #[cfg(any(debug_assertions, test))]
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }
}

impl<T> std::ops::Deref for ReentrantGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: we own the lock, and only shared references are handed out
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for ReentrantGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::ReentrantLock;
    use std::cell::Cell;
    use std::sync::Arc;

    #[test]
    fn same_thread_reenters() {
        let lock = ReentrantLock::new(Cell::new(0));
        let outer = lock.lock();
        outer.set(1);
        {
            let inner = lock.lock();
            assert_eq!(inner.depth(), 2);
            inner.set(inner.get() + 1);
        }
        assert_eq!(outer.get(), 2);
        assert_eq!(outer.depth(), 1);
    }

    #[test]
    fn other_threads_wait() {
        let lock = Arc::new(ReentrantLock::new(std::sync::Mutex::new(Vec::new())));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let lock = lock.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let guard = lock.lock();
                        // nested acquisition while another thread may be waiting
                        let again = lock.lock();
                        again.lock().unwrap().push((t, i));
                        drop(again);
                        guard.lock().unwrap().push((t, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let guard = lock.lock();
        let entries = guard.lock().unwrap();
        assert_eq!(entries.len(), 400);
        // both pushes of one iteration are adjacent: nobody interleaved while the lock was held
        for pair in entries.chunks(2) {
            assert_eq!(pair[0], pair[1]);
        }
    }
}
