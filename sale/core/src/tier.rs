// Copyright (c) 2024 The Botho Foundation

//! Access tiers.

use serde::{Deserialize, Serialize};

/// The access tier an item was issued through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Public sale, no proof required
    Open,
    /// Follower allow-list
    Follower,
    /// Member allow-list
    Member,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Open => write!(f, "open"),
            Tier::Follower => write!(f, "follower"),
            Tier::Member => write!(f, "member"),
        }
    }
}
