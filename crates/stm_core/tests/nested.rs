//! Integration tests for transactions nested inside transactions.

use std::collections::BTreeMap;
use std::thread;
use stm_core::{ambient, Config, CoreError, HandleStatus, Stm};

#[test]
fn child_commit_is_visible_to_parent_only() {
    let stm = Stm::new();
    let root = stm.init_root(&1u32).unwrap();

    let mut parent = stm.begin();
    parent
        .transact(|child| {
            assert_eq!(*child.get(root)?, 1);
            child.set(root, 2)
        })
        .unwrap();

    assert_eq!(*parent.get(root).unwrap(), 2);
    assert_eq!(stm.load(root).unwrap(), 1);

    parent.commit().unwrap();
    assert_eq!(stm.load(root).unwrap(), 2);
}

#[test]
fn child_abort_leaves_parent_overlay() {
    let stm = Stm::new();
    let root = stm.init_root(&1u32).unwrap();

    let mut parent = stm.begin();
    parent.set(root, 5).unwrap();
    let writes = parent.write_set();

    let result: Result<(), CoreError> = parent.transact(|child| {
        child.set(root, 6)?;
        Err(CoreError::transaction_aborted("child gives up"))
    });
    assert!(result.is_err());
    assert_eq!(parent.write_set(), writes);
    assert_eq!(*parent.get(root).unwrap(), 5);
}

#[test]
fn child_sees_parent_in_place_edits() {
    let stm = Stm::new();
    let root = stm.init_root(&BTreeMap::<String, u32>::new()).unwrap();

    let mut parent = stm.begin();
    parent.get_mut(root).unwrap().insert("a".into(), 1);

    let seen = parent
        .transact(|child| Ok(child.get(root)?.get("a").copied()))
        .unwrap();
    assert_eq!(seen, Some(1));
    assert_eq!(parent.handle_status(root), HandleStatus::Clean);
}

#[test]
fn without_flush_child_sees_committed_value() {
    let stm = Stm::with_config(Config::new().flush_before_nested(false));
    let root = stm.init_root(&BTreeMap::<String, u32>::new()).unwrap();

    let mut parent = stm.begin();
    parent.get_mut(root).unwrap().insert("a".into(), 1);

    let seen = parent
        .transact(|child| Ok(child.get(root)?.len()))
        .unwrap();
    assert_eq!(seen, 0);
    assert_eq!(parent.handle_status(root), HandleStatus::Dirty);
}

#[test]
fn child_write_evicts_parent_handle() {
    let stm = Stm::new();
    let root = stm.init_root(&10u32).unwrap();

    let mut parent = stm.begin();
    assert_eq!(*parent.get(root).unwrap(), 10);
    parent.transact(|child| child.set(root, 11)).unwrap();

    assert_eq!(parent.handle_status(root), HandleStatus::Unbound);
    assert_eq!(*parent.get(root).unwrap(), 11);
    parent.commit().unwrap();
    assert_eq!(stm.load(root).unwrap(), 11);
}

#[test]
fn sibling_children_conflict() {
    let stm = Stm::new();
    let root = stm.init_root(&0u32).unwrap();
    let parent = stm.begin();

    let mut first = parent.begin().unwrap();
    let mut second = parent.begin().unwrap();
    first.get(root).unwrap();
    second.get(root).unwrap();
    first.set(root, 1).unwrap();
    second.set(root, 2).unwrap();

    first.commit().unwrap();
    let err = second.commit().unwrap_err();
    assert_eq!(err.conflict_pointer(), Some(root.id()));
}

#[test]
fn threads_share_one_parent() {
    const THREADS: u64 = 4;
    const INCREMENTS: u64 = 200;

    let stm = Stm::new();
    let counter = stm.init_root(&0u64).unwrap();
    let parent = stm.begin();

    let conflicts: u64 = thread::scope(|scope| {
        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    let mut conflicts = 0;
                    for _ in 0..INCREMENTS {
                        loop {
                            match parent.transact(|child| {
                                *child.get_mut(counter)? += 1;
                                Ok(())
                            }) {
                                Ok(()) => break,
                                Err(err) if err.is_conflict() => conflicts += 1,
                                Err(err) => panic!("unexpected error: {err}"),
                            }
                        }
                    }
                    conflicts
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).sum()
    });

    parent.commit().unwrap();
    assert_eq!(stm.load(counter).unwrap(), THREADS * INCREMENTS);
    assert_eq!(stm.stats().conflicts, conflicts);
}

#[test]
fn pointer_allocated_in_child_survives_parent_commit() {
    let stm = Stm::new();
    let parent = stm.begin();

    let fresh = parent
        .transact(|child| {
            let p = child.new_pointer::<String>()?;
            child.set(p, "nested".to_string())?;
            Ok(p)
        })
        .unwrap();

    assert!(stm.pointers().get(fresh.id()).unwrap().is_unset());
    parent.commit().unwrap();
    assert_eq!(stm.load(fresh).unwrap(), "nested");
}

#[test]
fn ambient_slot_tracks_innermost_body() {
    let stm = Stm::new();
    stm.transact(|outer| {
        let outer_id = outer.id();
        assert_eq!(ambient::current(), Some(outer_id));
        outer.transact(|inner| {
            assert_eq!(ambient::current(), Some(inner.id()));
            assert_ne!(inner.id(), outer_id);
            Ok(())
        })?;
        assert_eq!(ambient::current(), Some(outer_id));
        Ok(())
    })
    .unwrap();
    assert_eq!(ambient::current(), None);
}
