//! The ambient "current transaction" slot.
//!
//! Each thread has one slot naming the transaction whose body is running.
//! Engine logic never reads it; transactions are always passed explicitly.
//! The slot exists for diagnostics and for layers above the engine that
//! want to know whether they run inside a transaction.
//!
//! [`enter`] installs an id and returns a guard that puts the previous value
//! back when dropped, on every exit path including unwinding.

use crate::types::TransactionId;
use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static CURRENT: Cell<Option<TransactionId>> = const { Cell::new(None) };
}

/// Returns the transaction whose body is running on this thread, if any.
#[must_use]
pub fn current() -> Option<TransactionId> {
    CURRENT.with(Cell::get)
}

/// Installs `id` as the current transaction until the guard is dropped.
#[must_use = "the previous transaction is restored when the scope is dropped"]
pub fn enter(id: TransactionId) -> AmbientScope {
    let previous = CURRENT.with(|slot| slot.replace(Some(id)));
    AmbientScope {
        previous,
        _thread_bound: PhantomData,
    }
}

/// Guard returned by [`enter`].
#[derive(Debug)]
pub struct AmbientScope {
    previous: Option<TransactionId>,
    // The slot is per thread, so the guard must be dropped where it was made.
    _thread_bound: PhantomData<*const ()>,
}

impl AmbientScope {
    /// The transaction that was current before this scope.
    #[must_use]
    pub fn previous(&self) -> Option<TransactionId> {
        self.previous
    }
}

impl Drop for AmbientScope {
    fn drop(&mut self) {
        CURRENT.with(|slot| slot.set(self.previous));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_nest_and_restore() {
        assert_eq!(current(), None);
        {
            let outer = enter(TransactionId(1));
            assert_eq!(outer.previous(), None);
            assert_eq!(current(), Some(TransactionId(1)));
            {
                let inner = enter(TransactionId(2));
                assert_eq!(inner.previous(), Some(TransactionId(1)));
                assert_eq!(current(), Some(TransactionId(2)));
            }
            assert_eq!(current(), Some(TransactionId(1)));
        }
        assert_eq!(current(), None);
    }

    #[test]
    fn restored_after_panic() {
        let result = std::panic::catch_unwind(|| {
            let _scope = enter(TransactionId(7));
            panic!("body failed");
        });
        assert!(result.is_err());
        assert_eq!(current(), None);
    }

    #[test]
    fn slots_are_per_thread() {
        let _scope = enter(TransactionId(3));
        let seen = std::thread::spawn(current).join().unwrap();
        assert_eq!(seen, None);
        assert_eq!(current(), Some(TransactionId(3)));
    }
}
