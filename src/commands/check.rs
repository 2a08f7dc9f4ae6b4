//! `convoy check`: static workspace validation without touching git or
//! running any steps.
//!
//! Errors: unknown target references, unresolved dependencies, dependency
//! cycles. Warnings: artifacts with no detectable language. Duplicate
//! names already abort during scanning.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{bail, Result};

use convoy::error::ConvoyError;
use convoy::models::{DiscoveredArtifact, UNKNOWN_LANGUAGE};
use convoy::ui::Printer;

use super::Workspace;

pub fn cmd_check(root: &Path, json: bool, printer: &Printer) -> Result<()> {
    let workspace = Workspace::load(root)?;

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let names: HashSet<&str> = workspace
        .artifacts
        .iter()
        .map(|d| d.artifact.name.as_str())
        .collect();

    for d in &workspace.artifacts {
        let artifact = &d.artifact;

        if !artifact.is_lib
            && !artifact.target.is_empty()
            && workspace.config.target(&artifact.target).is_none()
        {
            errors.push(
                ConvoyError::UnknownTarget {
                    artifact: artifact.name.clone(),
                    target: artifact.target.clone(),
                }
                .to_string(),
            );
        }

        for dep in &artifact.depends_on {
            if !names.contains(dep.as_str()) {
                errors.push(
                    ConvoyError::UnresolvedDependency {
                        artifact: artifact.name.clone(),
                        dependency: dep.clone(),
                    }
                    .to_string(),
                );
            }
        }

        if d.language == UNKNOWN_LANGUAGE {
            warnings.push(format!(
                "artifact '{}' has no detectable language; it will not be validated",
                artifact.name
            ));
        }
    }

    for cycle in find_cycles(&workspace.artifacts) {
        errors.push(format!("dependency cycle: {}", cycle.join(" -> ")));
    }

    if json {
        let report = serde_json::json!({
            "artifacts": workspace.artifacts.len(),
            "errors": errors,
            "warnings": warnings,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        printer.banner("convoy check");
        for warning in &warnings {
            printer.warning(warning);
        }
        for error in &errors {
            printer.failure(error);
        }
        if errors.is_empty() {
            printer.summary(&format!(
                "{} artifact(s) checked, no errors.",
                workspace.artifacts.len()
            ));
        }
    }

    if !errors.is_empty() {
        bail!("check found {} error(s)", errors.len());
    }
    Ok(())
}

/// DFS over `depends_on` edges; each cycle is reported once, from its
/// first-discovered member
fn find_cycles(artifacts: &[DiscoveredArtifact]) -> Vec<Vec<String>> {
    let edges: HashMap<&str, &[String]> = artifacts
        .iter()
        .map(|d| (d.artifact.name.as_str(), d.artifact.depends_on.as_slice()))
        .collect();

    let mut cycles = Vec::new();
    let mut done: HashSet<String> = HashSet::new();

    for d in artifacts {
        let mut stack: Vec<String> = Vec::new();
        let mut on_stack: HashSet<String> = HashSet::new();
        visit(
            &d.artifact.name,
            &edges,
            &mut stack,
            &mut on_stack,
            &mut done,
            &mut cycles,
        );
    }

    cycles
}

fn visit(
    name: &str,
    edges: &HashMap<&str, &[String]>,
    stack: &mut Vec<String>,
    on_stack: &mut HashSet<String>,
    done: &mut HashSet<String>,
    cycles: &mut Vec<Vec<String>>,
) {
    if done.contains(name) {
        return;
    }
    if on_stack.contains(name) {
        let start = stack.iter().position(|n| n == name).unwrap_or(0);
        let mut cycle: Vec<String> = stack[start..].to_vec();
        cycle.push(name.to_string());
        cycles.push(cycle);
        return;
    }

    stack.push(name.to_string());
    on_stack.insert(name.to_string());

    if let Some(deps) = edges.get(name) {
        for dep in deps.iter() {
            visit(dep, edges, stack, on_stack, done, cycles);
        }
    }

    stack.pop();
    on_stack.remove(name);
    done.insert(name.to_string());
}
