use std::process::Command;

use anyhow::{Context, Result};

/// Workspace members in dependency order.
const CRATES: &[&str] =
    &["almanac-common", "almanac-domain", "almanac-core", "almanac-infra", "almanac-cli"];

/// Check that each crate compiles with only its own dependency features.
pub fn check_each_crate() -> Result<()> {
    println!("Checking {} workspace crates in isolation...", CRATES.len());

    for (index, name) in CRATES.iter().enumerate() {
        println!("\n[{}/{}] cargo check -p {name} --all-targets", index + 1, CRATES.len());

        let status = Command::new("cargo")
            .args(["check", "-p", name, "--all-targets"])
            .status()
            .with_context(|| format!("Failed to run cargo check for '{name}'"))?;

        if !status.success() {
            anyhow::bail!("Crate '{name}' failed to compile");
        }

        println!("✅ {name} compiled successfully");
    }

    println!("\n✅ All {} crates compile on their own!", CRATES.len());

    Ok(())
}
