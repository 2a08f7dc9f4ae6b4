//! Built-in language and target presets
//!
//! A workspace config can import these by name via its `use:` section
//! instead of spelling out common stacks by hand. Local definitions with
//! the same name always win over a preset.

use std::collections::BTreeMap;

use crate::models::{Detection, Language, Step, Target};

fn step(name: &str, run: &str) -> Step {
    Step {
        name: name.to_string(),
        run: run.to_string(),
    }
}

/// Look up a built-in language preset by name
pub fn builtin_language(name: &str) -> Option<Language> {
    let language = match name {
        "rust" => Language {
            name: name.to_string(),
            detection: Detection {
                files: vec!["Cargo.toml".to_string()],
                pattern: None,
            },
            steps: vec![
                step("Lint", "cargo clippy -- -D warnings"),
                step("Test", "cargo test"),
                step("Build", "cargo build --release"),
            ],
        },
        "go" => Language {
            name: name.to_string(),
            detection: Detection {
                files: vec!["go.mod".to_string()],
                pattern: None,
            },
            steps: vec![
                step("Vet", "go vet ./..."),
                step("Test", "go test ./..."),
                step("Build", "go build ./..."),
            ],
        },
        "node" => Language {
            name: name.to_string(),
            detection: Detection {
                files: vec!["package.json".to_string()],
                pattern: None,
            },
            steps: vec![
                step("Install", "npm ci"),
                step("Lint", "npm run lint --if-present"),
                step("Test", "npm test --if-present"),
                step("Build", "npm run build --if-present"),
            ],
        },
        "python" => Language {
            name: name.to_string(),
            detection: Detection {
                files: vec!["pyproject.toml".to_string(), "requirements.txt".to_string()],
                pattern: Some("*.py".to_string()),
            },
            steps: vec![
                step("Install", "pip install -r requirements.txt"),
                step("Test", "python -m pytest"),
            ],
        },
        _ => return None,
    };

    Some(language)
}

/// Look up a built-in target preset by name
pub fn builtin_target(name: &str) -> Option<Target> {
    let target = match name {
        "docker" => Target {
            name: name.to_string(),
            defaults: defaults(&[("REGISTRY", "docker.io")]),
            steps: vec![
                step("Build image", "docker build -t $REGISTRY/$NAME:$VERSION ."),
                step("Push image", "docker push $REGISTRY/$NAME:$VERSION"),
            ],
        },
        "cloudrun" => Target {
            name: name.to_string(),
            defaults: defaults(&[("REGION", "europe-west1"), ("MEMORY", "512Mi")]),
            steps: vec![
                step("Build", "docker build -t gcr.io/$PROJECT/$NAME:$VERSION ."),
                step("Push", "docker push gcr.io/$PROJECT/$NAME:$VERSION"),
                step(
                    "Deploy",
                    "gcloud run deploy $NAME --image gcr.io/$PROJECT/$NAME:$VERSION --region $REGION --memory $MEMORY",
                ),
            ],
        },
        "lambda" => Target {
            name: name.to_string(),
            defaults: defaults(&[("REGION", "eu-central-1")]),
            steps: vec![
                step("Package", "zip -r function.zip ."),
                step(
                    "Deploy",
                    "aws lambda update-function-code --function-name $NAME --zip-file fileb://function.zip --region $REGION",
                ),
            ],
        },
        "s3" => Target {
            name: name.to_string(),
            defaults: defaults(&[("REGION", "eu-central-1")]),
            steps: vec![step("Sync", "aws s3 sync ./dist s3://$BUCKET --delete")],
        },
        _ => return None,
    };

    Some(target)
}

fn defaults(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
