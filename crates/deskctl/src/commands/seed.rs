use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

use deskgrid_core::{Employee, Workspace};

use super::Context;

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    employees: Vec<Employee>,
    #[serde(default)]
    workspaces: Vec<Workspace>,
}

pub fn seed(ctx: &Context, file: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let seed: SeedFile = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", file.display()))?;

    ctx.store.import(&seed.employees, &seed.workspaces)?;
    println!(
        "✓ Seeded {} employees and {} workspaces",
        seed.employees.len(),
        seed.workspaces.len()
    );
    Ok(())
}
