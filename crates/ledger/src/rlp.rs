//! Recursive-length-prefix encoding, as used for transaction envelopes.
//!
//! Encode-only: the client never needs to parse RLP.

fn length_prefix(len: usize, short_base: u8, long_base: u8, out: &mut Vec<u8>) {
    if len <= 55 {
        out.push(short_base + len as u8);
    } else {
        let be = (len as u64).to_be_bytes();
        let skip = be.iter().take_while(|b| **b == 0).count();
        out.push(long_base + (be.len() - skip) as u8);
        out.extend_from_slice(&be[skip..]);
    }
}

/// Encode a byte string.
pub fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    if bytes.len() == 1 && bytes[0] < 0x80 {
        out.push(bytes[0]);
    } else {
        length_prefix(bytes.len(), 0x80, 0xb7, out);
        out.extend_from_slice(bytes);
    }
}

/// Encode an unsigned integer as its minimal big-endian byte string.
pub fn encode_uint(value: u128, out: &mut Vec<u8>) {
    let be = value.to_be_bytes();
    let skip = be.iter().take_while(|b| **b == 0).count();
    encode_bytes(&be[skip..], out);
}

/// Builder for a flat RLP list.
#[derive(Debug, Default, Clone)]
pub struct RlpList {
    payload: Vec<u8>,
}

impl RlpList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        encode_bytes(bytes, &mut self.payload);
        self
    }

    /// Big-endian scalar with leading zero bytes stripped.
    pub fn scalar(&mut self, be: &[u8]) -> &mut Self {
        let skip = be.iter().take_while(|b| **b == 0).count();
        encode_bytes(&be[skip..], &mut self.payload);
        self
    }

    pub fn uint(&mut self, value: u128) -> &mut Self {
        encode_uint(value, &mut self.payload);
        self
    }

    pub fn finish(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload.len() + 9);
        length_prefix(self.payload.len(), 0xc0, 0xf7, &mut out);
        out.extend_from_slice(&self.payload);
        out
    }
}
