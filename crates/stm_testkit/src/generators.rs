//! Property-based test generators using proptest.
//!
//! Besides plain data strategies, this module generates small transaction
//! scripts over a fixed set of counter slots. [`run_script`] executes one
//! against an engine and [`ScriptModel`] predicts the outcome, so a property
//! test can compare the two.

use proptest::prelude::*;
use std::collections::BTreeMap;
use stm_codec::Value;
use stm_core::{CoreError, CoreResult, Ptr, Stm};

/// Strategy for raw blob payloads.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

/// Strategy for short lowercase keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,8}").expect("Invalid regex")
}

/// Strategy for string-keyed integer maps.
pub fn string_map_strategy() -> impl Strategy<Value = BTreeMap<String, i64>> {
    prop::collection::btree_map(key_strategy(), any::<i64>(), 0..16)
}

/// Strategy for codec values a few levels deep.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
        key_strategy().prop_map(Value::Text),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((key_strategy().prop_map(Value::Text), inner), 0..4)
                .prop_map(Value::map),
        ]
    })
}

/// One step of a transaction script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxnOp {
    /// Overwrite a slot.
    Set {
        /// Slot index.
        slot: usize,
        /// New value.
        value: i64,
    },
    /// Add to a slot in place.
    Add {
        /// Slot index.
        slot: usize,
        /// Amount added.
        delta: i64,
    },
    /// Read a slot.
    Read {
        /// Slot index.
        slot: usize,
    },
}

/// A transaction: its steps and whether the body fails at the end.
#[derive(Debug, Clone)]
pub struct TxnScript {
    /// Steps run in order.
    pub ops: Vec<TxnOp>,
    /// Fail the body after the last step.
    pub abort: bool,
}

/// Strategy for a single step over `slots` slots.
pub fn txn_op_strategy(slots: usize) -> impl Strategy<Value = TxnOp> {
    prop_oneof![
        (0..slots, -1000i64..1000).prop_map(|(slot, value)| TxnOp::Set { slot, value }),
        (0..slots, -10i64..10).prop_map(|(slot, delta)| TxnOp::Add { slot, delta }),
        (0..slots).prop_map(|slot| TxnOp::Read { slot }),
    ]
}

/// Strategy for a sequence of transactions over `slots` slots.
pub fn script_strategy(slots: usize) -> impl Strategy<Value = Vec<TxnScript>> {
    let txn = (prop::collection::vec(txn_op_strategy(slots), 1..8), prop::bool::weighted(0.25))
        .prop_map(|(ops, abort)| TxnScript { ops, abort });
    prop::collection::vec(txn, 1..12)
}

/// Expected slot values after running scripts sequentially.
#[derive(Debug, Clone)]
pub struct ScriptModel {
    slots: Vec<i64>,
}

impl ScriptModel {
    /// A model with `slots` zeroed slots.
    pub fn new(slots: usize) -> Self {
        Self {
            slots: vec![0; slots],
        }
    }

    /// Applies one transaction, all or nothing.
    pub fn apply(&mut self, script: &TxnScript) {
        if script.abort {
            return;
        }
        for op in &script.ops {
            match *op {
                TxnOp::Set { slot, value } => self.slots[slot] = value,
                TxnOp::Add { slot, delta } => {
                    self.slots[slot] = self.slots[slot].wrapping_add(delta);
                }
                TxnOp::Read { .. } => {}
            }
        }
    }

    /// Current expected values.
    pub fn slots(&self) -> &[i64] {
        &self.slots
    }
}

/// Allocates `count` zeroed slots in the root.
pub fn create_slots(stm: &Stm, count: usize) -> CoreResult<Vec<Ptr<i64>>> {
    (0..count)
        .map(|_| {
            let ptr = stm.new_pointer::<i64>();
            stm.store(ptr, &0)?;
            Ok(ptr)
        })
        .collect()
}

/// Runs `script` as one transaction. Aborting scripts return
/// [`CoreError::TransactionAborted`].
pub fn run_script(stm: &Stm, slots: &[Ptr<i64>], script: &TxnScript) -> CoreResult<()> {
    stm.transact(|txn| {
        for op in &script.ops {
            match *op {
                TxnOp::Set { slot, value } => txn.set(slots[slot], value)?,
                TxnOp::Add { slot, delta } => {
                    txn.update(slots[slot], |v| *v = v.wrapping_add(delta))?;
                }
                TxnOp::Read { slot } => {
                    txn.get(slots[slot])?;
                }
            }
        }
        if script.abort {
            return Err(CoreError::transaction_aborted("scripted abort"));
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stm_codec::{from_cbor, to_canonical_cbor};

    const SLOTS: usize = 4;

    proptest! {
        #[test]
        fn engine_matches_model(scripts in script_strategy(SLOTS)) {
            let stm = Stm::new();
            let slots = create_slots(&stm, SLOTS).unwrap();
            let mut model = ScriptModel::new(SLOTS);

            for script in &scripts {
                let result = run_script(&stm, &slots, script);
                prop_assert_eq!(result.is_err(), script.abort);
                model.apply(script);
            }

            let actual: Vec<i64> = slots.iter().map(|&p| stm.load(p).unwrap()).collect();
            prop_assert_eq!(&actual[..], model.slots());
        }

        #[test]
        fn generated_values_encode(value in value_strategy()) {
            let bytes = to_canonical_cbor(&value);
            prop_assert_eq!(from_cbor(&bytes).unwrap(), value);
        }

        #[test]
        fn string_maps_are_storable(map in string_map_strategy()) {
            let stm = Stm::new();
            let root = stm.init_root(&map).unwrap();
            prop_assert_eq!(stm.load(root).unwrap(), map);
        }
    }
}
