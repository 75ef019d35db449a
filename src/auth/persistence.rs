use std::path::{Path, PathBuf};

use anyhow::Context;

/// Destination for the admin key set after each mutation.
pub trait KeyPersistence: Send + Sync {
    fn persist(&self, keys: &[String]) -> anyhow::Result<()>;
}

/// Rewrites `admin.api_keys` in a TOML config file, leaving other sections intact.
#[derive(Debug, Clone)]
pub struct TomlKeyFile {
    path: PathBuf,
}

impl TomlKeyFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyPersistence for TomlKeyFile {
    fn persist(&self, keys: &[String]) -> anyhow::Result<()> {
        let mut document: toml::Table = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw
                .parse::<toml::Table>()
                .with_context(|| format!("parsing {}", self.path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };

        let admin = document
            .entry("admin")
            .or_insert(toml::Value::Table(toml::Table::new()));
        let admin = admin
            .as_table_mut()
            .with_context(|| format!("`admin` in {} is not a table", self.path.display()))?;
        admin.insert("api_keys".into(), toml::Value::String(keys.join(",")));

        let rendered = toml::to_string_pretty(&document)?;
        std::fs::write(&self.path, rendered)
            .with_context(|| format!("writing {}", self.path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = TomlKeyFile::new(dir.path().join("config.toml"));

        file.persist(&["admin_a".into(), "admin_b".into()]).unwrap();

        let written: toml::Table = std::fs::read_to_string(file.path()).unwrap().parse().unwrap();
        assert_eq!(written["admin"]["api_keys"].as_str(), Some("admin_a,admin_b"));
    }

    #[test]
    fn test_persist_keeps_other_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 7000\n\n[admin]\napi_keys = \"old\"\n").unwrap();

        TomlKeyFile::new(&path).persist(&["admin_new".into()]).unwrap();

        let written: toml::Table = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        assert_eq!(written["server"]["port"].as_integer(), Some(7000));
        assert_eq!(written["admin"]["api_keys"].as_str(), Some("admin_new"));
    }

    #[test]
    fn test_persist_rejects_non_table_admin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "admin = 3\n").unwrap();

        assert!(TomlKeyFile::new(&path).persist(&[]).is_err());
    }
}
