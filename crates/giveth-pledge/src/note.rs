use std::fmt;

use giveth_types::{Amount, PledgeId};
use serde::Serialize;

use crate::error::{PledgeError, PledgeResult};

/// Width of the amount field in hex digits (192 bits).
pub const AMOUNT_HEX_DIGITS: usize = 48;

/// Width of the pledge id field in hex digits (64 bits).
pub const PLEDGE_ID_HEX_DIGITS: usize = 16;

const AMOUNT_BYTES: usize = AMOUNT_HEX_DIGITS / 2;
const NOTE_BYTES: usize = AMOUNT_BYTES + PLEDGE_ID_HEX_DIGITS / 2;

/// One `(amount, pledgeId)` slot of a multi-transfer call.
///
/// Packed as a 32-byte big-endian word: the high 24 bytes carry the
/// amount, the low 8 bytes the pledge id. Rendered as `0x` followed by
/// 64 lower-case hex digits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PledgeNote {
    pub amount: Amount,
    pub pledge_id: PledgeId,
}

impl PledgeNote {
    pub fn new(amount: Amount, pledge_id: PledgeId) -> Self {
        Self { amount, pledge_id }
    }

    pub fn to_bytes(&self) -> PledgeResult<[u8; NOTE_BYTES]> {
        let amount = self.amount.to_be_bytes();
        if amount.len() > AMOUNT_BYTES {
            return Err(PledgeError::AmountOverflow {
                amount: self.amount.to_string(),
                bits: (AMOUNT_BYTES * 8) as u32,
            });
        }

        let mut word = [0u8; NOTE_BYTES];
        word[AMOUNT_BYTES - amount.len()..AMOUNT_BYTES].copy_from_slice(&amount);
        word[AMOUNT_BYTES..].copy_from_slice(&self.pledge_id.0.to_be_bytes());
        Ok(word)
    }

    pub fn from_bytes(word: &[u8; NOTE_BYTES]) -> Self {
        let mut id = [0u8; NOTE_BYTES - AMOUNT_BYTES];
        id.copy_from_slice(&word[AMOUNT_BYTES..]);
        Self {
            amount: Amount::from_be_bytes(&word[..AMOUNT_BYTES]),
            pledge_id: PledgeId(u64::from_be_bytes(id)),
        }
    }

    pub fn encode(&self) -> PledgeResult<String> {
        Ok(format!("0x{}", hex::encode(self.to_bytes()?)))
    }

    /// Parse a packed note; the `0x` prefix is optional and case is ignored.
    pub fn decode(note: &str) -> PledgeResult<Self> {
        let malformed = |reason: String| PledgeError::MalformedNote {
            note: note.to_string(),
            reason,
        };

        let body = note
            .strip_prefix("0x")
            .or_else(|| note.strip_prefix("0X"))
            .unwrap_or(note);
        if body.len() != NOTE_BYTES * 2 {
            return Err(malformed(format!(
                "expected {} hex digits, found {}",
                NOTE_BYTES * 2,
                body.len()
            )));
        }

        let mut word = [0u8; NOTE_BYTES];
        hex::decode_to_slice(body, &mut word).map_err(|e| malformed(e.to_string()))?;
        Ok(Self::from_bytes(&word))
    }
}

impl fmt::Display for PledgeNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from pledge {}", self.amount, self.pledge_id)
    }
}
