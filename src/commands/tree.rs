//! `convoy tree`: render the dependency graph as an indented tree.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Result;

use convoy::ui::Printer;

use super::Workspace;

pub fn cmd_tree(root: &Path, printer: &Printer) -> Result<()> {
    let workspace = Workspace::load(root)?;

    let deps: HashMap<&str, &[String]> = workspace
        .artifacts
        .iter()
        .map(|d| (d.artifact.name.as_str(), d.artifact.depends_on.as_slice()))
        .collect();

    // Roots are artifacts nothing depends on
    let depended_on: HashSet<&str> = workspace
        .artifacts
        .iter()
        .flat_map(|d| d.artifact.depends_on.iter().map(String::as_str))
        .collect();

    printer.banner(&format!("{} dependency tree", workspace.config.name));
    printer.blank();

    for d in &workspace.artifacts {
        if depended_on.contains(d.artifact.name.as_str()) {
            continue;
        }
        let mut on_path = HashSet::new();
        print_node(&d.artifact.name, 0, &deps, &mut on_path, printer);
    }

    Ok(())
}

fn print_node(
    name: &str,
    depth: usize,
    deps: &HashMap<&str, &[String]>,
    on_path: &mut HashSet<String>,
    printer: &Printer,
) {
    let indent = "  ".repeat(depth);

    if on_path.contains(name) {
        printer.warning(&format!("{indent}{name} (cycle)"));
        return;
    }

    if depth == 0 {
        printer.detail(name);
    } else {
        printer.detail(&format!("{indent}└─ {name}"));
    }

    let Some(children) = deps.get(name) else {
        return;
    };

    on_path.insert(name.to_string());
    for child in children.iter() {
        print_node(child, depth + 1, deps, on_path, printer);
    }
    on_path.remove(name);
}
