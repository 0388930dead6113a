// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread identity as seen by log statements.
//!
//! `std::thread::ThreadId` has no stable numeric form, but meta-information (`%tI`) and the
//! thread-related scopes need one. Each thread draws a process-unique number the first time
//! it logs.

use std::cell::OnceCell;
use std::sync::atomic::{AtomicU64, Ordering};

static THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT: OnceCell<ThreadIdent> = const { OnceCell::new() };
}

/// Numeric id and name of a thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadIdent {
    pub id: u64,
    pub name: String,
}

impl ThreadIdent {
    /// Identity of the calling thread.
    pub fn current() -> ThreadIdent {
        CURRENT.with(|cell| {
            cell.get_or_init(|| {
                let id = THREAD_ID.fetch_add(1, Ordering::Relaxed);
                let name = match std::thread::current().name() {
                    Some(name) => name.to_string(),
                    None => format!("THREAD-{}", id),
                };
                ThreadIdent { id, name }
            })
            .clone()
        })
    }

    /// Numeric id of the calling thread.
    pub fn current_id() -> u64 {
        CURRENT.with(|cell| {
            if let Some(ident) = cell.get() {
                return ident.id;
            }
            Self::current().id
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ThreadIdent;

    #[test]
    fn ids_are_stable_per_thread_and_unique_across_threads() {
        let here = ThreadIdent::current();
        assert_eq!(here, ThreadIdent::current());
        assert_eq!(here.id, ThreadIdent::current_id());

        let there = std::thread::Builder::new()
            .name("worker".to_string())
            .spawn(ThreadIdent::current)
            .unwrap()
            .join()
            .unwrap();
        assert_ne!(here.id, there.id);
        assert_eq!(there.name, "worker");
    }
}
