//! Canonical, fixed-width tuple encoding matching the on-chain ABI's
//! ordering rules: every field is serialized at its declared width with no
//! length prefixes beyond what the type itself carries.

use ledger_types::{Address, Leaf};
use primitive_types::U256;

pub(crate) struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub(crate) fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub(crate) fn push_u64(mut self, value: u64) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub(crate) fn push_u32(mut self, value: u32) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub(crate) fn push_u256(mut self, value: U256) -> Self {
        let mut be = [0u8; 32];
        value.to_big_endian(&mut be);
        self.buf.extend_from_slice(&be);
        self
    }

    pub(crate) fn push_u256_from_usize(self, value: usize) -> Self {
        self.push_u256(U256::from(value as u64))
    }

    pub(crate) fn push_bytes32(mut self, value: &[u8; 32]) -> Self {
        self.buf.extend_from_slice(value);
        self
    }

    pub(crate) fn push_address(mut self, value: &Address) -> Self {
        self.buf.extend_from_slice(value);
        self
    }

    pub(crate) fn push_leaf(self, leaf: &Leaf) -> Self {
        self.push_bytes32(&leaf.to_bytes())
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_is_eight_big_endian_bytes() {
        let bytes = Encoder::new().push_u64(0x0102_0304_0506_0708).finish();
        assert_eq!(bytes, hex::decode("0102030405060708").unwrap());
    }

    #[test]
    fn u256_is_thirty_two_big_endian_bytes() {
        let bytes = Encoder::new().push_u256(U256::from(1u64)).finish();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[31], 1);
        assert!(bytes[..31].iter().all(|&b| b == 0));
    }

    #[test]
    fn leaf_encoding_matches_wire_bytes() {
        let leaf = Leaf::empty(3);
        let bytes = Encoder::new().push_leaf(&leaf).finish();
        assert_eq!(bytes, leaf.to_bytes());
    }
}
