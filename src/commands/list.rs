//! `convoy list`: tabular overview of every discovered artifact with its
//! ledger state.

use std::path::Path;

use anyhow::Result;

use convoy::lockfile::LockLedger;
use convoy::ui::Printer;

use super::Workspace;

pub fn cmd_list(root: &Path, json: bool, printer: &Printer) -> Result<()> {
    let workspace = Workspace::load(root)?;
    let ledger = LockLedger::load(root)?;

    if json {
        let rows: Vec<serde_json::Value> = workspace
            .artifacts
            .iter()
            .map(|d| {
                let entry = ledger.artifacts.get(&d.artifact.name);
                serde_json::json!({
                    "name": d.artifact.name,
                    "kind": if d.artifact.is_lib { "library" } else { "artifact" },
                    "target": d.artifact.target,
                    "language": d.language,
                    "path": d.path.strip_prefix(root).unwrap_or(&d.path),
                    "version": entry.map(|e| e.version.as_str()),
                    "pinned": entry.map(|e| e.pinned).unwrap_or(false),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    printer.banner(&format!("{} artifacts", workspace.config.name));
    printer.blank();

    for d in &workspace.artifacts {
        let artifact = &d.artifact;
        let entry = ledger.artifacts.get(&artifact.name);

        let state = match entry {
            Some(e) if e.pinned => format!("{} (pinned)", e.version),
            Some(e) => e.version.clone(),
            None => "never deployed".to_string(),
        };

        if artifact.is_lib {
            printer.detail(&format!("{:<24} library  {:<10} {state}", artifact.name, d.language));
        } else {
            printer.detail(&format!(
                "{:<24} {:<8} {:<10} {state}",
                artifact.name, artifact.target, d.language
            ));
        }
    }

    printer.summary(&format!("{} artifact(s)", workspace.artifacts.len()));
    Ok(())
}
