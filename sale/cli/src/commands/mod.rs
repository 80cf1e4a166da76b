// Copyright (c) 2024 The Botho Foundation

//! CLI commands

pub mod allowlist;
pub mod check_config;
pub mod replay;

use std::path::Path;

use anyhow::{bail, Context, Result};
use gen30_sale_core::{Address, MembershipTree};

/// Read an address list: one address per line, `#` starts a comment.
pub fn read_addresses(path: &Path) -> Result<Vec<Address>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read address list {}", path.display()))?;

    let mut addresses = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let address = line
            .parse()
            .with_context(|| format!("{}:{}: bad address {:?}", path.display(), number + 1, line))?;
        addresses.push(address);
    }

    if addresses.is_empty() {
        bail!("Address list {} is empty", path.display());
    }
    Ok(addresses)
}

/// Build the membership tree over an address list file.
pub fn load_tree(path: &Path) -> Result<MembershipTree> {
    let addresses = read_addresses(path)?;
    let tree = MembershipTree::new(addresses)?;
    tracing::debug!("Loaded {} allow-list entries from {}", tree.len(), path.display());
    Ok(tree)
}
