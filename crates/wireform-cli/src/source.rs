//! # Schema and Input Loading
//!
//! Arguments and helpers shared by every subcommand.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Args;
use serde_json::Value;

use wireform_schema::{EngineConfig, SchemaDef, SchemaSet};

/// Which schema to load, and with what engine configuration.
#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// YAML schema descriptor (one schema or a `schemas:` list).
    #[arg(long, short = 's')]
    pub schema: PathBuf,

    /// Schema to use when the document holds several. Defaults to the last.
    #[arg(long)]
    pub name: Option<String>,

    /// YAML engine configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl SchemaArgs {
    /// Load the engine configuration, or the default one.
    pub fn engine_config(&self) -> anyhow::Result<Arc<EngineConfig>> {
        let config = match &self.config {
            Some(path) => EngineConfig::from_path(path)
                .with_context(|| format!("loading engine configuration {}", path.display()))?,
            None => EngineConfig::default(),
        };
        Ok(Arc::new(config))
    }

    /// Build every schema of the document, in order.
    pub fn load_all(&self) -> anyhow::Result<Vec<Arc<SchemaDef>>> {
        let set = SchemaSet::from_path(&self.schema)
            .with_context(|| format!("reading schema {}", self.schema.display()))?;
        let built = set
            .build(self.engine_config()?)
            .with_context(|| format!("building schema {}", self.schema.display()))?;
        tracing::debug!(
            path = %self.schema.display(),
            schemas = built.len(),
            "schema document loaded"
        );
        Ok(built.into_values().collect())
    }

    /// Build the document and pick the selected schema.
    pub fn load(&self) -> anyhow::Result<Arc<SchemaDef>> {
        let mut all = self.load_all()?;
        match &self.name {
            Some(name) => all
                .into_iter()
                .find(|def| def.name() == name.as_str())
                .ok_or_else(|| anyhow!("schema `{name}` not found in {}", self.schema.display())),
            None => all
                .pop()
                .ok_or_else(|| anyhow!("{} declares no schemas", self.schema.display())),
        }
    }
}

/// Read a JSON document from `path`, or standard input for `-`.
pub fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading standard input")?;
        text
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("parsing JSON from {}", path.display()))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Write;

    use tempfile::NamedTempFile;

    pub const DOCUMENT: &str = r#"
schemas:
  - name: Address
    fields:
      - { name: city, type: char, required: true }
  - name: User
    fields:
      - { name: name, type: char, required: true, max_length: 8 }
      - { name: age, type: integer, min_value: 0 }
      - { name: home, type: nested, schema: Address }
"#;

    pub fn file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }
}
