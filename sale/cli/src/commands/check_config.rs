// Copyright (c) 2024 The Botho Foundation

//! Configuration check command

use std::path::Path;

use anyhow::{bail, Context, Result};
use gen30_sale_core::{config::BPS, membership::format_hash, Hash32, SaleConfig};
use tracing::info;

use super::load_tree;

/// Run the check-config command
pub fn run(config_path: &Path, members: Option<&Path>, followers: Option<&Path>) -> Result<()> {
    let config = SaleConfig::from_file(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    if let Some(path) = members {
        check_root("member", &config.allowlist.member_root, path)?;
    }
    if let Some(path) = followers {
        check_root("follower", &config.allowlist.follower_root, path)?;
    }

    print_summary(&config);
    Ok(())
}

/// Fail unless the list at `path` hashes to `configured`.
pub fn check_root(label: &str, configured: &Hash32, path: &Path) -> Result<()> {
    let tree = load_tree(path)?;
    if tree.root() != *configured {
        bail!(
            "{} root mismatch: config has {}, {} gives {}",
            label,
            format_hash(configured),
            path.display(),
            format_hash(&tree.root())
        );
    }
    info!("{} root matches {} ({} entries)", label, path.display(), tree.len());
    Ok(())
}

fn print_summary(config: &SaleConfig) {
    let caps = &config.caps;
    let claims = &config.claims;

    println!();
    println!("Sale configuration OK");
    println!();
    println!("  Admin:          {}", config.sale.admin);
    println!("  Recipient:      {}", config.sale.recipient);
    println!("  Price:          {}", config.sale.price);
    println!("  Royalty:        {} bps", config.sale.royalty_bps);
    println!("  Member root:    {}", format_hash(&config.allowlist.member_root));
    println!("  Follower root:  {}", format_hash(&config.allowlist.follower_root));
    println!();
    println!("  Items:          0..{}", caps.total_capacity);
    println!("  User cap:       {}", caps.user_cap);
    println!("  Follower cap:   {}", caps.follower_cap);
    println!("  Member cap:     {}", caps.member_cap);
    println!("  Wallet cap:     {}", caps.wallet_cap);
    println!();
    println!(
        "  Holder share:   {}.{:02}%",
        claims.holder_share_bps * 100 / BPS,
        claims.holder_share_bps % 100
    );
    println!("  Cooldown:       {}s", claims.withdraw_cooldown_secs);
    if let Some(floor) = claims.withdraw_not_before {
        println!("  Not before:     {}", floor.to_rfc3339());
    }
}
