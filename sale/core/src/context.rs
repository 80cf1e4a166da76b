// Copyright (c) 2024 The Botho Foundation

//! Per-call context and outgoing transfers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{address::Address, Amount};

/// What the hosting environment knows about a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Identity making the call
    pub caller: Address,

    /// Native value attached to the call
    pub value: Amount,

    /// Ledger time of the call
    pub timestamp: DateTime<Utc>,
}

impl CallContext {
    /// A call with no attached value.
    pub fn new(caller: Address, timestamp: DateTime<Utc>) -> Self {
        Self {
            caller,
            value: 0,
            timestamp,
        }
    }

    /// A call stamped with the current wall-clock time.
    pub fn now(caller: Address) -> Self {
        Self::new(caller, Utc::now())
    }

    /// Attach native value to the call.
    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}

/// Native value leaving the pool; the host settles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub to: Address,
    pub amount: Amount,
}
