//! Contract ABI codec for the subset of types the registry uses.
//!
//! Values are laid out in 32-byte words: static types in place, `string` as
//! an offset into the tail followed by its length and padded bytes. Unsigned
//! integers are limited to 128 bits; anything wider is rejected on decode.

use thiserror::Error;

use realty_core::{Address, LedgerError, keccak256};

const WORD: usize = 32;

/// `Error(string)`, emitted by `require(cond, "reason")`.
const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
/// `Panic(uint256)`, emitted by compiler-inserted checks.
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Panic code for an out-of-bounds array access.
pub const PANIC_ARRAY_OUT_OF_BOUNDS: u128 = 0x32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("abi: unexpected end of data at byte {0}")]
    Truncated(usize),

    #[error("abi: {0}")]
    Malformed(String),
}

impl From<AbiError> for LedgerError {
    fn from(value: AbiError) -> Self {
        LedgerError::read(value.to_string())
    }
}

/// A value to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Uint(u128),
    Address(Address),
    Bool(bool),
    String(String),
}

/// First four bytes of the keccak-256 of a canonical function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Selector followed by the encoded arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend(encode(args));
    out
}

fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Encode a tuple of tokens.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = WORD * tokens.len();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Uint(v) => head.extend_from_slice(&uint_word(*v)),
            Token::Bool(b) => head.extend_from_slice(&uint_word(u128::from(*b))),
            Token::Address(a) => {
                let mut word = [0u8; WORD];
                word[12..].copy_from_slice(a.as_bytes());
                head.extend_from_slice(&word);
            }
            Token::String(s) => {
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
                tail.extend_from_slice(&uint_word(s.len() as u128));
                tail.extend_from_slice(s.as_bytes());
                let rem = s.len() % WORD;
                if rem != 0 {
                    tail.resize(tail.len() + WORD - rem, 0);
                }
            }
        }
    }

    head.extend(tail);
    head
}

/// Sequential reader over an encoded tuple.
#[derive(Debug, Clone)]
pub struct Words<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> Words<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    fn word_at(&self, offset: usize) -> Result<&'a [u8], AbiError> {
        let end = offset.checked_add(WORD).ok_or(AbiError::Truncated(offset))?;
        self.data.get(offset..end).ok_or(AbiError::Truncated(offset))
    }

    fn next_word(&mut self) -> Result<&'a [u8], AbiError> {
        let word = self.word_at(self.cursor)?;
        self.cursor += WORD;
        Ok(word)
    }

    fn word_to_u128(word: &[u8]) -> Result<u128, AbiError> {
        if word[..16].iter().any(|b| *b != 0) {
            return Err(AbiError::Malformed("uint256 value exceeds 128 bits".into()));
        }
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&word[16..]);
        Ok(u128::from_be_bytes(buf))
    }

    pub fn uint(&mut self) -> Result<u128, AbiError> {
        let word = self.next_word()?;
        Self::word_to_u128(word)
    }

    pub fn uint64(&mut self) -> Result<u64, AbiError> {
        let v = self.uint()?;
        u64::try_from(v).map_err(|_| AbiError::Malformed(format!("index {v} exceeds 64 bits")))
    }

    pub fn address(&mut self) -> Result<Address, AbiError> {
        let word = self.next_word()?;
        if word[..12].iter().any(|b| *b != 0) {
            return Err(AbiError::Malformed("address word has dirty high bytes".into()));
        }
        Address::from_slice(&word[12..]).map_err(|e| AbiError::Malformed(e.to_string()))
    }

    pub fn boolean(&mut self) -> Result<bool, AbiError> {
        match self.uint()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(AbiError::Malformed(format!("invalid bool value {other}"))),
        }
    }

    pub fn string(&mut self) -> Result<String, AbiError> {
        let offset = Self::offset(self.uint()?)?;
        let len = Self::offset(Self::word_to_u128(self.word_at(offset)?)?)?;
        let start = offset + WORD;
        let end = start.checked_add(len).ok_or(AbiError::Truncated(start))?;
        let bytes = self.data.get(start..end).ok_or(AbiError::Truncated(start))?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| AbiError::Malformed("string is not valid utf-8".into()))
    }

    fn offset(v: u128) -> Result<usize, AbiError> {
        usize::try_from(v).map_err(|_| AbiError::Malformed(format!("offset {v} out of range")))
    }
}

/// Split call data into selector and argument words.
pub fn split_call(data: &[u8]) -> Result<([u8; 4], Words<'_>), AbiError> {
    if data.len() < 4 {
        return Err(AbiError::Truncated(data.len()));
    }
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&data[..4]);
    Ok((sel, Words::new(&data[4..])))
}

/// Decoded revert payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revert {
    Reason(String),
    Panic(u128),
}

pub fn decode_revert(data: &[u8]) -> Option<Revert> {
    let (sel, mut words) = split_call(data).ok()?;
    match sel {
        ERROR_SELECTOR => words.string().ok().map(Revert::Reason),
        PANIC_SELECTOR => words.uint().ok().map(Revert::Panic),
        _ => None,
    }
}

pub fn encode_revert(revert: &Revert) -> Vec<u8> {
    let (sel, token) = match revert {
        Revert::Reason(reason) => (ERROR_SELECTOR, Token::String(reason.clone())),
        Revert::Panic(code) => (PANIC_SELECTOR, Token::Uint(*code)),
    };
    let mut out = sel.to_vec();
    out.extend(encode(&[token]));
    out
}
