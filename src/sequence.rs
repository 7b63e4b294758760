//! Payment identifier generation
//!
//! ULID-based: globally unique and time-ordered without coordination. A
//! process-wide monotonic generator keeps ids strictly increasing even
//! within one millisecond, so no two concurrent calls return the same
//! value and later settlements always sort after earlier ones.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use ulid::Generator;

static GENERATOR: Lazy<Mutex<Generator>> = Lazy::new(|| Mutex::new(Generator::new()));

/// Identifier of one settlement attempt (one payment or one reversal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaymentId(ulid::Ulid);

impl PaymentId {
    /// Generate a new unique, time-ordered PaymentId.
    pub fn new() -> Self {
        let mut generator = GENERATOR.lock().expect("payment id generator poisoned");
        loop {
            // generate() only fails when the random component overflows
            // within a single millisecond; waiting out the tick resolves it.
            match generator.generate() {
                Ok(id) => return Self(id),
                Err(_) => std::thread::sleep(std::time::Duration::from_millis(1)),
            }
        }
    }

    /// Millisecond timestamp embedded in the id.
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PaymentId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_ids_unique() {
        let a = PaymentId::new();
        let b = PaymentId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_payment_id_roundtrip() {
        let id = PaymentId::new();
        let parsed: PaymentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_payment_ids_strictly_increasing() {
        let ids: Vec<PaymentId> = (0..1000).map(|_| PaymentId::new()).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }
}
