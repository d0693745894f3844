use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Held,
    Refunded,
    Captured,
}

/// How a held stake is released once the goal outcome is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Refund,
    Capture,
}

impl Settlement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Settlement::Refund => "refund",
            Settlement::Capture => "capture",
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Held => "HELD",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Captured => "CAPTURED",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "HELD" => Some(PaymentStatus::Held),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            "CAPTURED" => Some(PaymentStatus::Captured),
            _ => None,
        }
    }

    /// Only a held payment can be settled, and only once.
    pub fn settle(self, settlement: Settlement) -> Option<PaymentStatus> {
        match (self, settlement) {
            (PaymentStatus::Held, Settlement::Refund) => Some(PaymentStatus::Refunded),
            (PaymentStatus::Held, Settlement::Capture) => Some(PaymentStatus::Captured),
            (PaymentStatus::Refunded | PaymentStatus::Captured, _) => None,
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_payment_settles_one_way() {
        assert_eq!(
            PaymentStatus::Held.settle(Settlement::Refund),
            Some(PaymentStatus::Refunded)
        );
        assert_eq!(
            PaymentStatus::Held.settle(Settlement::Capture),
            Some(PaymentStatus::Captured)
        );
    }

    #[test]
    fn settled_payments_never_move_again() {
        for settled in [PaymentStatus::Refunded, PaymentStatus::Captured] {
            assert_eq!(settled.settle(Settlement::Refund), None);
            assert_eq!(settled.settle(Settlement::Capture), None);
        }
    }
}
