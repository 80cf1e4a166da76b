// Copyright (c) 2024 The Botho Foundation

//! Allow-list root and proof commands

use std::path::Path;

use anyhow::{anyhow, Result};
use gen30_sale_core::{membership::format_hash, Address, MembershipProof, MembershipTree};
use serde::Serialize;

use super::load_tree;

/// What `proof` prints.
#[derive(Debug, Serialize)]
pub struct ProofOutput {
    pub address: Address,
    pub root: String,
    pub proof: MembershipProof,
}

/// Run the root command
pub fn root(list: &Path) -> Result<()> {
    let tree = load_tree(list)?;
    println!("{}", format_hash(&tree.root()));
    Ok(())
}

/// Run the proof command
pub fn proof(list: &Path, address: &str) -> Result<()> {
    let tree = load_tree(list)?;
    let address: Address = address.parse()?;
    let output = build_proof(&tree, address)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn build_proof(tree: &MembershipTree, address: Address) -> Result<ProofOutput> {
    let proof = tree
        .proof(&address)
        .ok_or_else(|| anyhow!("{} is not on the list", address))?;
    Ok(ProofOutput {
        address,
        root: format_hash(&tree.root()),
        proof,
    })
}
