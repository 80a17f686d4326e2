//! YAML-backed configuration store (`~/.stompy/config.yaml`).
//!
//! Scalar settings are read with `STOMPY_<KEY>` environment overrides applied
//! on top of the file; overrides are never written back. The `auth` section
//! holds the persisted OAuth token record.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::dirs::{AppDirs, CONFIG_FILE_NAME, ensure_private_dir};

/// Default API base URL
pub const DEFAULT_API_URL: &str = "https://api.stompy.ai/api/v1";

/// Default output format
pub const DEFAULT_OUTPUT_FORMAT: &str = "table";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "STOMPY_";

/// Environment variable naming the active project
pub const PROJECT_ENV_VAR: &str = "STOMPY_PROJECT";

/// Errors raised by the config store.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHome,

    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("writing config: {0}")]
    Write(#[from] std::io::Error),

    #[error("serializing config: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("{key} cannot be set: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error(
        "no project specified. Set a default with:\n  stompy project use <name>\n\nOr pass -p <name> to any command. Run 'stompy project list' to see available projects"
    )]
    NoProject,
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Persisted OAuth token record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// RFC 3339 timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_expiry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl AuthSection {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
            && self.refresh_token.is_none()
            && self.token_expiry.is_none()
            && self.email.is_none()
            && self.user_id.is_none()
    }

    fn field(&self, name: &str) -> Option<&Option<String>> {
        match name {
            "access_token" => Some(&self.access_token),
            "refresh_token" => Some(&self.refresh_token),
            "token_expiry" => Some(&self.token_expiry),
            "email" => Some(&self.email),
            "user_id" => Some(&self.user_id),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "access_token" => Some(&mut self.access_token),
            "refresh_token" => Some(&mut self.refresh_token),
            "token_expiry" => Some(&mut self.token_expiry),
            "email" => Some(&mut self.email),
            "user_id" => Some(&mut self.user_id),
            _ => None,
        }
    }
}

/// On-disk shape of `config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    #[serde(default, skip_serializing_if = "AuthSection::is_empty")]
    pub auth: AuthSection,
    /// Keys the CLI does not interpret but preserves.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ConfigFile {
    fn top_level(&self, key: &str) -> Option<&Option<String>> {
        match key {
            "api_url" => Some(&self.api_url),
            "api_key" => Some(&self.api_key),
            "default_project" => Some(&self.default_project),
            "output_format" => Some(&self.output_format),
            _ => None,
        }
    }

    fn top_level_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            "api_url" => Some(&mut self.api_url),
            "api_key" => Some(&mut self.api_key),
            "default_project" => Some(&mut self.default_project),
            "output_format" => Some(&mut self.output_format),
            _ => None,
        }
    }
}

/// Loaded configuration bound to its directory.
#[derive(Debug, Clone)]
pub struct Config {
    dir: PathBuf,
    file: ConfigFile,
}

impl Config {
    /// Load from the default location (`~/.stompy` or `STOMPY_HOME`).
    pub fn load() -> ConfigResult<Self> {
        let dirs = AppDirs::new().ok_or(ConfigError::NoHome)?;
        Self::load_from(dirs.config_dir)
    }

    /// Load from an explicit config directory. A missing file yields defaults.
    pub fn load_from(dir: impl Into<PathBuf>) -> ConfigResult<Self> {
        let dir = dir.into();
        let path = dir.join(CONFIG_FILE_NAME);

        let file = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            if raw.trim().is_empty() {
                ConfigFile::default()
            } else {
                serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: path.clone(),
                    source,
                })?
            }
        } else {
            ConfigFile::default()
        };

        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(Self { dir, file })
    }

    /// Write the config file, creating the directory (0700) and restricting
    /// the file to the owner (0600).
    ///
    /// The new contents go to a 0600 sibling first and are renamed over the
    /// file, so readers see either the old or the new config in full.
    pub fn save(&self) -> ConfigResult<()> {
        ensure_private_dir(&self.dir)?;
        let yaml = serde_yaml::to_string(&self.file)?;
        write_private(&self.config_path(), yaml.as_bytes())?;
        Ok(())
    }

    pub fn config_dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    /// Raw file contents, without environment overrides.
    pub fn file(&self) -> &ConfigFile {
        &self.file
    }

    pub fn api_url(&self) -> String {
        self.get_value("api_url")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn api_key(&self) -> Option<String> {
        self.get_value("api_key")
    }

    pub fn default_project(&self) -> Option<String> {
        self.get_value("default_project")
    }

    pub fn output_format(&self) -> String {
        self.get_value("output_format")
            .unwrap_or_else(|| DEFAULT_OUTPUT_FORMAT.to_string())
    }

    pub fn auth(&self) -> &AuthSection {
        &self.file.auth
    }

    pub fn access_token(&self) -> Option<&str> {
        self.file.auth.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.file.auth.refresh_token.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.file.auth.email.as_deref()
    }

    /// Stored token expiry; an unparseable value reads as absent.
    pub fn token_expiry(&self) -> Option<DateTime<Utc>> {
        let raw = self.file.auth.token_expiry.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Effective value for a (possibly dotted) key.
    ///
    /// `STOMPY_<KEY>` wins over the file; `api_url` and `output_format` fall
    /// back to their defaults. Empty values read as unset.
    pub fn get_value(&self, key: &str) -> Option<String> {
        if let Ok(v) = std::env::var(env_key(key))
            && !v.is_empty()
        {
            return Some(v);
        }

        let stored = if let Some(field) = self.file.top_level(key) {
            field.clone()
        } else if let Some(name) = key.strip_prefix("auth.")
            && let Some(field) = self.file.auth.field(name)
        {
            field.clone()
        } else {
            lookup_dotted(&self.file.extra, key).and_then(scalar_to_string)
        };

        stored.filter(|v| !v.is_empty()).or_else(|| match key {
            "api_url" => Some(DEFAULT_API_URL.to_string()),
            "output_format" => Some(DEFAULT_OUTPUT_FORMAT.to_string()),
            _ => None,
        })
    }

    /// Set a key in memory without persisting.
    pub fn set(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        if key.is_empty() || key.split('.').any(str::is_empty) {
            return Err(ConfigError::InvalidKey {
                key: key.to_string(),
                reason: "empty key segment".to_string(),
            });
        }

        let value = Some(value.to_string()).filter(|v| !v.is_empty());
        if let Some(field) = self.file.top_level_mut(key) {
            *field = value;
        } else if let Some(name) = key.strip_prefix("auth.") {
            let field = self
                .file
                .auth
                .field_mut(name)
                .ok_or_else(|| ConfigError::InvalidKey {
                    key: key.to_string(),
                    reason: "unknown auth field".to_string(),
                })?;
            *field = value;
        } else if key == "auth" {
            return Err(ConfigError::InvalidKey {
                key: key.to_string(),
                reason: "auth is a section".to_string(),
            });
        } else {
            insert_dotted(
                &mut self.file.extra,
                key,
                Value::String(value.unwrap_or_default()),
            );
        }
        Ok(())
    }

    /// Set a key and persist the file.
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        self.set(key, value)?;
        self.save()
    }

    /// All effective settings as sorted, flattened `key -> value` pairs.
    pub fn settings(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for key in ["api_url", "api_key", "default_project", "output_format"] {
            if let Some(v) = self.get_value(key) {
                out.insert(key.to_string(), v);
            }
        }
        for name in [
            "access_token",
            "refresh_token",
            "token_expiry",
            "email",
            "user_id",
        ] {
            if let Some(Some(v)) = self.file.auth.field(name)
                && !v.is_empty()
            {
                out.insert(format!("auth.{name}"), v.clone());
            }
        }
        for (k, v) in &self.file.extra {
            flatten_into(&mut out, k.clone(), v);
        }
        out
    }

    /// Persist a fresh token record, superseding any previous one.
    pub fn save_tokens(
        &mut self,
        access_token: &str,
        refresh_token: Option<&str>,
        expiry: DateTime<Utc>,
        email: Option<&str>,
        user_id: Option<&str>,
    ) -> ConfigResult<()> {
        let non_empty = |s: Option<&str>| s.filter(|v| !v.is_empty()).map(str::to_string);
        self.file.auth = AuthSection {
            access_token: non_empty(Some(access_token)),
            refresh_token: non_empty(refresh_token),
            token_expiry: Some(expiry.to_rfc3339_opts(SecondsFormat::Secs, true)),
            email: non_empty(email),
            user_id: non_empty(user_id),
        };
        self.save()
    }

    /// Remove the stored token record and persist.
    pub fn clear_tokens(&mut self) -> ConfigResult<()> {
        self.file.auth = AuthSection::default();
        self.save()
    }

    /// Active project: explicit flag, then `STOMPY_PROJECT`, then `default_project`.
    pub fn resolve_project(&self, flag: Option<&str>) -> ConfigResult<String> {
        if let Some(p) = flag.filter(|p| !p.is_empty()) {
            return Ok(p.to_string());
        }
        if let Ok(p) = std::env::var(PROJECT_ENV_VAR)
            && !p.is_empty()
        {
            return Ok(p);
        }
        self.default_project().ok_or(ConfigError::NoProject)
    }
}

fn env_key(key: &str) -> String {
    format!("{ENV_PREFIX}{}", key.to_uppercase().replace('.', "_"))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Replace `path` with `data` via an owner-only temp file and a rename.
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let tmp = temp_sibling(path);
    // Left over from an interrupted save; its mode cannot be trusted
    let _ = std::fs::remove_file(&tmp);

    let result = (|| {
        let mut file = private_options().open(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp, path)
    })();
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

#[cfg(unix)]
fn private_options() -> std::fs::OpenOptions {
    use std::os::unix::fs::OpenOptionsExt;
    let mut opts = std::fs::OpenOptions::new();
    opts.write(true).create_new(true).mode(0o600);
    opts
}

#[cfg(not(unix))]
fn private_options() -> std::fs::OpenOptions {
    let mut opts = std::fs::OpenOptions::new();
    opts.write(true).create_new(true);
    opts
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lookup_dotted<'a>(map: &'a BTreeMap<String, Value>, key: &str) -> Option<&'a Value> {
    let mut parts = key.split('.');
    let mut current = map.get(parts.next()?)?;
    for part in parts {
        current = current.as_mapping()?.get(part)?;
    }
    Some(current)
}

fn insert_dotted(map: &mut BTreeMap<String, Value>, key: &str, value: Value) {
    let parts: Vec<&str> = key.split('.').collect();
    match parts.as_slice() {
        [] => {}
        [single] => {
            map.insert((*single).to_string(), value);
        }
        [first, rest @ ..] => {
            let child = map
                .entry((*first).to_string())
                .or_insert_with(|| Value::Mapping(Mapping::new()));
            if !child.is_mapping() {
                *child = Value::Mapping(Mapping::new());
            }
            if let Value::Mapping(m) = child {
                insert_path(m, rest, value);
            }
        }
    }
}

fn insert_path(map: &mut Mapping, parts: &[&str], value: Value) {
    match parts {
        [] => {}
        [last] => {
            map.insert(Value::String((*last).to_string()), value);
        }
        [first, rest @ ..] => {
            let key = Value::String((*first).to_string());
            let needs_mapping = !map.get(&key).is_some_and(Value::is_mapping);
            if needs_mapping {
                map.insert(key.clone(), Value::Mapping(Mapping::new()));
            }
            if let Some(Value::Mapping(child)) = map.get_mut(&key) {
                insert_path(child, rest, value);
            }
        }
    }
}

fn flatten_into(out: &mut BTreeMap<String, String>, prefix: String, value: &Value) {
    match value {
        Value::Mapping(m) => {
            for (k, v) in m {
                if let Some(k) = scalar_to_string(k) {
                    flatten_into(out, format!("{prefix}.{k}"), v);
                }
            }
        }
        other => {
            if let Some(s) = scalar_to_string(other) {
                out.insert(prefix, s);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        // SAFETY: callers are #[serial]
        unsafe {
            for var in [
                "STOMPY_API_URL",
                "STOMPY_API_KEY",
                "STOMPY_DEFAULT_PROJECT",
                "STOMPY_OUTPUT_FORMAT",
                PROJECT_ENV_VAR,
            ] {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_defaults_when_file_missing() {
        clear_env();
        let tmp = TempDir::new().unwrap();
        let cfg = Config::load_from(tmp.path()).unwrap();

        assert_eq!(cfg.api_url(), DEFAULT_API_URL);
        assert_eq!(cfg.output_format(), DEFAULT_OUTPUT_FORMAT);
        assert_eq!(cfg.api_key(), None);
        assert_eq!(cfg.access_token(), None);
    }

    #[test]
    #[serial]
    fn test_save_and_reload() {
        clear_env();
        let tmp = TempDir::new().unwrap();
        let mut cfg = Config::load_from(tmp.path().join(".stompy")).unwrap();
        cfg.set("api_key", "test-key-123").unwrap();
        cfg.set("default_project", "my-project").unwrap();
        cfg.save().unwrap();

        assert!(cfg.config_path().exists());

        let reloaded = Config::load_from(tmp.path().join(".stompy")).unwrap();
        assert_eq!(reloaded.api_key().as_deref(), Some("test-key-123"));
        assert_eq!(reloaded.default_project().as_deref(), Some("my-project"));
    }

    #[test]
    #[serial]
    fn test_set_value_persists_unknown_dotted_key() {
        clear_env();
        let tmp = TempDir::new().unwrap();
        let mut cfg = Config::load_from(tmp.path()).unwrap();
        cfg.set_value("editor.theme", "dark").unwrap();

        let reloaded = Config::load_from(tmp.path()).unwrap();
        assert_eq!(reloaded.get_value("editor.theme").as_deref(), Some("dark"));
        assert_eq!(reloaded.get_value("editor.missing"), None);
    }

    #[test]
    #[serial]
    fn test_env_override_wins_and_is_not_saved() {
        clear_env();
        let tmp = TempDir::new().unwrap();
        let mut cfg = Config::load_from(tmp.path()).unwrap();
        cfg.set_value("api_url", "https://file.example/api/v1").unwrap();

        // SAFETY: test is #[serial]
        unsafe {
            std::env::set_var("STOMPY_API_URL", "https://env.example/api/v1");
        }
        assert_eq!(cfg.api_url(), "https://env.example/api/v1");
        cfg.save().unwrap();
        clear_env();

        let reloaded = Config::load_from(tmp.path()).unwrap();
        assert_eq!(reloaded.api_url(), "https://file.example/api/v1");
    }

    #[test]
    #[serial]
    fn test_save_and_clear_tokens() {
        clear_env();
        let tmp = TempDir::new().unwrap();
        let mut cfg = Config::load_from(tmp.path()).unwrap();
        let expiry = DateTime::parse_from_rfc3339("2030-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        cfg.save_tokens("access", Some("refresh"), expiry, Some("a@b.c"), None)
            .unwrap();

        let reloaded = Config::load_from(tmp.path()).unwrap();
        assert_eq!(reloaded.access_token(), Some("access"));
        assert_eq!(reloaded.refresh_token(), Some("refresh"));
        assert_eq!(reloaded.email(), Some("a@b.c"));
        assert_eq!(reloaded.token_expiry(), Some(expiry));

        let mut reloaded = reloaded;
        reloaded.clear_tokens().unwrap();
        let cleared = Config::load_from(tmp.path()).unwrap();
        assert!(cleared.auth().is_empty());
        let raw = std::fs::read_to_string(cleared.config_path()).unwrap();
        assert!(!raw.contains("auth"));
    }

    #[test]
    #[serial]
    fn test_resolve_project_precedence() {
        clear_env();
        let tmp = TempDir::new().unwrap();
        let mut cfg = Config::load_from(tmp.path()).unwrap();

        assert!(matches!(
            cfg.resolve_project(None),
            Err(ConfigError::NoProject)
        ));

        cfg.set("default_project", "from-config").unwrap();
        assert_eq!(cfg.resolve_project(None).unwrap(), "from-config");

        // SAFETY: test is #[serial]
        unsafe {
            std::env::set_var(PROJECT_ENV_VAR, "from-env");
        }
        assert_eq!(cfg.resolve_project(None).unwrap(), "from-env");
        assert_eq!(cfg.resolve_project(Some("from-flag")).unwrap(), "from-flag");
        clear_env();
    }

    #[test]
    fn test_no_project_message_mentions_project_use() {
        let msg = ConfigError::NoProject.to_string();
        assert!(msg.contains("stompy project use <name>"));
        assert!(msg.contains("-p <name>"));
    }

    #[test]
    #[serial]
    fn test_settings_are_flattened_and_sorted() {
        clear_env();
        let tmp = TempDir::new().unwrap();
        let mut cfg = Config::load_from(tmp.path()).unwrap();
        cfg.set("api_key", "k").unwrap();
        cfg.set("ui.colors.enabled", "true").unwrap();
        cfg.set("auth.email", "me@example.com").unwrap();

        let keys: Vec<String> = cfg.settings().into_keys().collect();
        assert_eq!(
            keys,
            vec![
                "api_key".to_string(),
                "api_url".to_string(),
                "auth.email".to_string(),
                "output_format".to_string(),
                "ui.colors.enabled".to_string(),
            ]
        );
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = Config::load_from(tmp.path()).unwrap();
        assert!(cfg.set("", "x").is_err());
        assert!(cfg.set("a..b", "x").is_err());
        assert!(cfg.set("auth", "x").is_err());
        assert!(cfg.set("auth.password", "x").is_err());
    }

    #[test]
    fn test_empty_file_loads_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "\n").unwrap();
        let cfg = Config::load_from(tmp.path()).unwrap();
        assert_eq!(cfg.file(), &ConfigFile::default());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "api_url: [unclosed").unwrap();
        let err = Config::load_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_unparseable_expiry_reads_as_none() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = Config::load_from(tmp.path()).unwrap();
        cfg.set("auth.token_expiry", "yesterday").unwrap();
        assert_eq!(cfg.token_expiry(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let mut cfg = Config::load_from(tmp.path().join("home")).unwrap();
        cfg.set_value("api_key", "secret").unwrap();

        let file_mode = std::fs::metadata(cfg.config_path())
            .unwrap()
            .permissions()
            .mode();
        let dir_mode = std::fs::metadata(cfg.config_dir())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(file_mode & 0o777, 0o600);
        assert_eq!(dir_mode & 0o777, 0o700);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_replaces_world_readable_file() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("home");
        let mut cfg = Config::load_from(dir.clone()).unwrap();
        cfg.save().unwrap();

        let path = cfg.config_path();
        let stale = temp_sibling(&path);
        std::fs::write(&stale, "half-written").unwrap();
        for p in [&path, &stale] {
            std::fs::set_permissions(p, std::fs::Permissions::from_mode(0o644)).unwrap();
        }

        cfg.set_value("api_key", "secret").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!stale.exists());
        let reloaded = Config::load_from(dir).unwrap();
        assert_eq!(reloaded.file().api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "api_key: old\n").unwrap();
        // A directory in the temp file's place makes the write fail
        std::fs::create_dir_all(temp_sibling(&path).join("blocker")).unwrap();

        assert!(write_private(&path, b"api_key: new\n").is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "api_key: old\n");
    }
}
