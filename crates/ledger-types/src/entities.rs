//! # Domain Entities
//!
//! Core data structures shared by the crypto kernel, the manager, and the
//! user client.
//!
//! Reference: spec §3 (Data Model), §6 (External Interfaces).

use crate::constants::{BALANCE_BYTES, LEAF_CAPACITY};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// A 32-byte keccak-256 digest.
pub type Hash = [u8; 32];

/// An x-only secp256k1 public key (even-y convention, §4.2).
pub type PublicKey = [u8; 32];

/// A 32-byte secp256k1 private scalar.
pub type PrivateKey = [u8; 32];

/// An on-chain payout recipient address (20 bytes, Ethereum-style).
pub type Address = [u8; 20];

/// A shared secret derived from ECDH (the compressed point serialization).
pub type SharedSecret = [u8; 33];

/// One encrypted balance slot within a leaf.
pub type EncryptedBalance = [u8; BALANCE_BYTES];

/// A fixed-layout leaf record holding `LEAF_CAPACITY` per-user slots.
///
/// Reference: spec §3 "Leaf", §6 "Leaf packing on the wire".
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    /// Six 4-byte ciphertexts, one per occupant slot.
    #[serde_as(as = "[Bytes; 6]")]
    pub encrypted_balances: [EncryptedBalance; 6],
    /// Leaf index (global user index / `LEAF_CAPACITY`).
    pub idx: u32,
    /// Monotonically increasing per-leaf update counter.
    pub nonce: u32,
}

impl Leaf {
    /// The leaf's capacity, matching `LEAF_CAPACITY`.
    pub const CAPACITY: usize = LEAF_CAPACITY as usize;

    /// An all-zero leaf at the given index, used as the "does not exist yet"
    /// sentinel record (spec §4.5 step 2: "all-zero record if the leaf does
    /// not yet exist").
    #[must_use]
    pub fn empty(idx: u32) -> Self {
        Self {
            encrypted_balances: [[0u8; BALANCE_BYTES]; 6],
            idx,
            nonce: 0,
        }
    }

    /// Pack this leaf into its 32-byte wire representation.
    ///
    /// Layout: 6 × 4-byte ciphertexts ∥ 4-byte `idx` (BE) ∥ 4-byte `nonce` (BE).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (slot, chunk) in self
            .encrypted_balances
            .iter()
            .zip(out.chunks_exact_mut(BALANCE_BYTES).take(6))
        {
            chunk.copy_from_slice(slot);
        }
        out[24..28].copy_from_slice(&self.idx.to_be_bytes());
        out[28..32].copy_from_slice(&self.nonce.to_be_bytes());
        out
    }

    /// Unpack a leaf from its 32-byte wire representation.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        let mut encrypted_balances = [[0u8; BALANCE_BYTES]; 6];
        for (slot, chunk) in encrypted_balances
            .iter_mut()
            .zip(bytes.chunks_exact(BALANCE_BYTES).take(6))
        {
            slot.copy_from_slice(chunk);
        }
        let idx = u32::from_be_bytes(bytes[24..28].try_into().expect("4 bytes"));
        let nonce = u32::from_be_bytes(bytes[28..32].try_into().expect("4 bytes"));
        Self {
            encrypted_balances,
            idx,
            nonce,
        }
    }

    /// The global user index occupying `slot` within this leaf.
    #[must_use]
    pub fn global_index(&self, slot: usize) -> u32 {
        self.idx * LEAF_CAPACITY + slot as u32
    }
}

/// Given a global user index, the leaf index it belongs to.
#[must_use]
pub fn leaf_index_of(user_index: u32) -> u32 {
    user_index / LEAF_CAPACITY
}

/// Given a global user index, its slot within its leaf.
#[must_use]
pub fn slot_of(user_index: u32) -> usize {
    (user_index % LEAF_CAPACITY) as usize
}

/// A deposit intent as published by a depositing client.
///
/// Reference: spec §3 "DepositIntent".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositIntent {
    /// Ephemeral public key (x-only).
    pub rand: PublicKey,
    /// Blinded, zero-padded username (32 bytes).
    pub user: [u8; 32],
}

/// On-chain counters, read-only input to the manager.
///
/// Reference: spec §3 "Counters".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Total operations submitted to the contract.
    pub op_count: u64,
    /// Operations already absorbed into state.
    pub processed_ops: u64,
    /// Total non-sentinel registered users.
    pub user_count: u32,
    /// Last block height scanned for deposit events.
    pub last_processed_block: u64,
    /// Accumulated sub-cent remainders kept by the operator.
    pub dust: u64,
}

/// Per-user index/leaf lookup result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Global user index (0 ⇔ not registered).
    pub user_index: u32,
    /// The leaf this user currently occupies.
    pub leaf: Option<Leaf>,
}

/// A raw `OpDeposit` event as emitted by the ledger contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEvent {
    /// Monotonic operation index assigned by the contract.
    pub idx: u64,
    /// The depositor's on-chain address.
    pub from: Address,
    /// The deposit intent's ephemeral public key.
    pub rand_key: PublicKey,
    /// The deposit intent's blinded username.
    pub to_user: [u8; 32],
    /// The deposited amount, in full on-chain token decimals.
    pub amount: U256,
    /// Block height the event was emitted at.
    pub block_number: u64,
    /// Set by the indexer when the event's block was reorged out.
    pub removed: bool,
}

/// A `LeafChange` event as emitted by the ledger contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafChangeEvent {
    /// The leaf index that changed.
    pub leaf_idx: u32,
    /// The new packed leaf.
    pub leaf: Leaf,
    /// Block height the event was emitted at.
    pub block_number: u64,
    /// Transaction hash carrying this leaf update.
    pub tx_hash: Hash,
}

/// An on-chain payout instruction.
///
/// Reference: spec §3 "UpdateBatch", §4.6.3.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Recipient on-chain address.
    pub to_who: Address,
    /// Amount in full on-chain token decimals.
    pub amount: U256,
}

/// The manager's output: a sealed, ready-to-submit state transition.
///
/// Reference: spec §3 "UpdateBatch".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBatch {
    /// First operation index this batch consumes (must equal current `processed_ops`).
    pub op_start: u64,
    /// Number of operations this batch consumes.
    pub op_count: u64,
    /// Block height from which the next batch should resume scanning.
    pub next_block: u64,
    /// Re-encrypted leaves, in shuffled order (§4.6.5).
    pub updates: Vec<Leaf>,
    /// Newly registered users' public keys, in assignment order.
    pub new_users: Vec<PublicKey>,
    /// Payouts to submit, in caller-controlled order.
    pub payouts: Vec<Payout>,
    /// The transcript hash binding this batch (§4.5).
    pub transcript: Hash,
}

/// The kind of operation a `SkippedOp` refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    /// A deposit could not be credited.
    Deposit,
    /// An internal transfer could not be applied.
    Transfer,
    /// A payout could not be honored.
    Payout,
}

/// A record of an operation the manager chose not to apply.
///
/// Reference: spec §3 "Skipped operation record".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedOp {
    /// Which kind of operation this was.
    pub kind: OpKind,
    /// Human-readable reason, stable enough for log/metric grouping.
    pub reason: String,
    /// Free-form structured context (usernames, amounts) for diagnostics.
    pub details: String,
}

/// A proposed internal transfer, in internal cents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Sender username.
    pub from: String,
    /// Recipient username.
    pub to: String,
    /// Amount in internal cents.
    pub amount: u32,
}

/// A proposed withdrawal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRequest {
    /// Username to debit. Empty string ⇒ auto-refund (§4.6.3).
    pub username: String,
    /// On-chain destination address.
    pub to_address: Address,
    /// Amount in full on-chain token decimals.
    pub amount_full_decimals: U256,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_round_trips_through_bytes() {
        let mut leaf = Leaf::empty(7);
        leaf.encrypted_balances[2] = [0xAA, 0xBB, 0xCC, 0xDD];
        leaf.nonce = 3;

        let bytes = leaf.to_bytes();
        let restored = Leaf::from_bytes(&bytes);

        assert_eq!(leaf, restored);
    }

    #[test]
    fn leaf_index_and_slot_arithmetic() {
        assert_eq!(leaf_index_of(0), 0);
        assert_eq!(slot_of(0), 0);
        assert_eq!(leaf_index_of(7), 1);
        assert_eq!(slot_of(7), 1);
        assert_eq!(leaf_index_of(11), 1);
        assert_eq!(slot_of(11), 5);
    }

    #[test]
    fn global_index_round_trips_leaf_index_and_slot() {
        let leaf = Leaf::empty(4);
        assert_eq!(leaf.global_index(3), 27);
        assert_eq!(leaf_index_of(27), 4);
        assert_eq!(slot_of(27), 3);
    }
}
