//! `convoy init`: scaffold a workspace config in the current directory.

use std::fs;
use std::path::Path;

use anyhow::{bail, Result};

use convoy::config::CONFIG_FILE;
use convoy::ui::Printer;

const CONFIG_TEMPLATE: &str = r#"name: {NAME}

# Built-in presets; define your own languages/targets below to override.
use:
  languages: [rust, go, node, python]
  targets: [docker]

# languages:
#   - name: rust
#     detection:
#       files: [Cargo.toml]
#     steps:
#       - name: Test
#         run: cargo test

# targets:
#   - name: docker
#     defaults:
#       REGISTRY: registry.example.com
#     steps:
#       - name: Build
#         run: docker build -t $REGISTRY/$NAME:$VERSION .
#       - name: Push
#         run: docker push $REGISTRY/$NAME:$VERSION
"#;

const ARTIFACT_TEMPLATE: &str = r#"# Drop a convoy.artifact.yml next to each deployable unit:
#
#   name: user-api
#   target: docker
#   depends_on: [shared-lib]
#
# and a convoy.lib.yml next to each shared library:
#
#   name: shared-lib
"#;

pub fn cmd_init(root: &Path, force: bool, printer: &Printer) -> Result<()> {
    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() && !force {
        bail!("{CONFIG_FILE} already exists (use --force to overwrite)");
    }

    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workspace".to_string());

    fs::write(&config_path, CONFIG_TEMPLATE.replace("{NAME}", &name))?;

    printer.banner("convoy init");
    printer.success(&format!("wrote {CONFIG_FILE}"));
    for line in ARTIFACT_TEMPLATE.lines() {
        printer.dimmed(line.trim_start_matches("# ").trim_start_matches('#'));
    }
    printer.summary("Run 'convoy plan' once artifacts are described.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use convoy::config::Config;
    use tempfile::tempdir;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempdir().unwrap();
        cmd_init(dir.path(), false, &Printer::plain()).unwrap();

        let config = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert!(config.language("rust").is_some());
        assert!(config.target("docker").is_some());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "name: existing\n").unwrap();

        assert!(cmd_init(dir.path(), false, &Printer::plain()).is_err());
        // Untouched
        let data = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(data, "name: existing\n");
    }

    #[test]
    fn test_init_force_overwrites() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "name: existing\n").unwrap();

        cmd_init(dir.path(), true, &Printer::plain()).unwrap();
        let config = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_ne!(config.name, "existing");
    }
}
