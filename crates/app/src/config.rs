use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossword_core::model::ProfileId;
use serde::Deserialize;
use services::SessionConfig;

pub const CONFIG_ENV: &str = "CROSSWORD_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "crossword.toml";

/// Resolved runtime settings of the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_url: String,
    pub cache_path: PathBuf,
    /// Unset means "use the id remembered in the local cache".
    pub profile_id: Option<ProfileId>,
    pub username: Option<String>,
    pub log_filter: String,
    pub session: SessionConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_url: "sqlite://./data/crossword.sqlite3".into(),
            cache_path: PathBuf::from("./data/cache.json"),
            profile_id: None,
            username: None,
            log_filter: "info".into(),
            session: SessionConfig::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    db_url: Option<String>,
    cache_path: Option<PathBuf>,
    profile_id: Option<String>,
    username: Option<String>,
    log_filter: Option<String>,
    session: FileSession,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSession {
    display_tick_ms: Option<u64>,
    persist_tick_secs: Option<u64>,
    guess_debounce_ms: Option<u64>,
}

/// Values given on the command line; they win over every other layer.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub db_url: Option<String>,
    pub cache_path: Option<PathBuf>,
    pub profile_id: Option<ProfileId>,
    pub username: Option<String>,
}

impl Settings {
    /// Defaults, then the TOML file, then `CROSSWORD_*` variables, then flags.
    ///
    /// A missing default file is fine; a missing file that was asked for is not.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    fn resolve(overrides: &Overrides, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();

        let requested = overrides
            .config
            .clone()
            .or_else(|| env(CONFIG_ENV).map(PathBuf::from));
        let path = requested
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        match fs::read_to_string(&path) {
            Ok(raw) => settings
                .apply_file(&raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound && requested.is_none() => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read config file '{}'", path.display()));
            }
        }

        settings.apply_env(&env)?;
        settings.apply_overrides(overrides);
        Ok(settings)
    }

    fn apply_file(&mut self, raw: &str) -> Result<()> {
        let file: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file.db_url {
            self.db_url = v;
        }
        if let Some(v) = file.cache_path {
            self.cache_path = v;
        }
        if let Some(v) = file.profile_id {
            self.profile_id = Some(parse_profile_id(&v, "profile_id")?);
        }
        if let Some(v) = file.username {
            self.username = Some(v);
        }
        if let Some(v) = file.log_filter {
            self.log_filter = v;
        }
        if let Some(ms) = file.session.display_tick_ms {
            self.session.display_tick = positive(Duration::from_millis(ms), "display_tick_ms")?;
        }
        if let Some(secs) = file.session.persist_tick_secs {
            self.session.persist_tick = positive(Duration::from_secs(secs), "persist_tick_secs")?;
        }
        if let Some(ms) = file.session.guess_debounce_ms {
            self.session.guess_debounce = Duration::from_millis(ms);
        }
        Ok(())
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = env("CROSSWORD_DB_URL") {
            self.db_url = v;
        }
        if let Some(v) = env("CROSSWORD_CACHE_PATH") {
            self.cache_path = PathBuf::from(v);
        }
        if let Some(v) = env("CROSSWORD_PROFILE_ID") {
            self.profile_id = Some(parse_profile_id(&v, "CROSSWORD_PROFILE_ID")?);
        }
        if let Some(v) = env("CROSSWORD_USERNAME") {
            self.username = Some(v);
        }
        if let Some(v) = env("CROSSWORD_LOG") {
            self.log_filter = v;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(v) = &overrides.db_url {
            self.db_url.clone_from(v);
        }
        if let Some(v) = &overrides.cache_path {
            self.cache_path.clone_from(v);
        }
        if let Some(v) = overrides.profile_id {
            self.profile_id = Some(v);
        }
        if let Some(v) = &overrides.username {
            self.username = Some(v.clone());
        }
    }
}

fn parse_profile_id(raw: &str, source: &str) -> Result<ProfileId> {
    raw.trim()
        .parse()
        .with_context(|| format!("{source} is not a valid profile id: {raw:?}"))
}

fn positive(value: Duration, key: &str) -> Result<Duration> {
    if value.is_zero() {
        bail!("session.{key} must be greater than zero");
    }
    Ok(value)
}

//
// ─── SQLITE URL ────────────────────────────────────────────────────────────────
//

/// Normalize the database URL and make sure its file can be opened.
pub fn prepare_database_url(raw: &str) -> Result<String> {
    let url = normalize_sqlite_url(raw);
    if let Some(path) = sqlite_path(&url) {
        prepare_sqlite_file(&path)
            .with_context(|| format!("failed to prepare database file '{}'", path.display()))?;
    }
    Ok(url)
}

fn normalize_sqlite_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return Settings::default().db_url;
    }
    if raw.starts_with("sqlite::memory:") || raw.starts_with("sqlite://") {
        return raw.to_string();
    }
    let path = raw.strip_prefix("sqlite:").unwrap_or(raw);
    if path.starts_with("file:") {
        return format!("sqlite:{path}");
    }
    format!("sqlite://{}", path.replace('\\', "/"))
}

fn sqlite_path(url: &str) -> Option<PathBuf> {
    let path = url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() {
        return None;
    }
    Some(PathBuf::from(path))
}

fn prepare_sqlite_file(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn layers_apply_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("crossword.toml");
        fs::write(
            &file,
            r#"
db_url = "sqlite://from-file.db"
username = "file-user"
log_filter = "debug"

[session]
persist_tick_secs = 10
guess_debounce_ms = 500
"#,
        )
        .unwrap();

        let profile = ProfileId::random();
        let env = env_of(&[
            ("CROSSWORD_DB_URL", "sqlite://from-env.db"),
            ("CROSSWORD_PROFILE_ID", &profile.to_string()),
        ]);
        let overrides = Overrides {
            config: Some(file),
            username: Some("flag-user".into()),
            ..Overrides::default()
        };

        let settings = Settings::resolve(&overrides, env).unwrap();
        assert_eq!(settings.db_url, "sqlite://from-env.db");
        assert_eq!(settings.username.as_deref(), Some("flag-user"));
        assert_eq!(settings.profile_id, Some(profile));
        assert_eq!(settings.log_filter, "debug");
        assert_eq!(settings.session.persist_step_secs(), 10);
        assert_eq!(settings.session.guess_debounce, Duration::from_millis(500));
        assert_eq!(settings.session.display_tick, Duration::from_secs(1));
    }

    #[test]
    fn requested_config_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let env = env_of(&[(CONFIG_ENV, missing.to_str().unwrap())]);
        assert!(Settings::resolve(&Overrides::default(), env).is_err());
    }

    #[test]
    fn bad_values_are_rejected() {
        let mut settings = Settings::default();
        assert!(settings.apply_file("unknown_key = 1").is_err());
        assert!(settings.apply_file("[session]\ndisplay_tick_ms = 0").is_err());
        assert!(settings.apply_file("profile_id = \"not-a-uuid\"").is_err());
    }

    #[test]
    fn normalizes_plain_paths_to_sqlite_urls() {
        assert_eq!(normalize_sqlite_url("./data/x.db"), "sqlite://./data/x.db");
        assert_eq!(normalize_sqlite_url("sqlite:dev.sqlite3"), "sqlite://dev.sqlite3");
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:file:memdb?mode=memory&cache=shared"),
            "sqlite:file:memdb?mode=memory&cache=shared"
        );
        assert_eq!(normalize_sqlite_url("  "), Settings::default().db_url);
    }

    #[test]
    fn prepare_creates_parent_dirs_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("crossword.sqlite3");
        let url = prepare_database_url(&format!("sqlite://{}?mode=rwc", db.display())).unwrap();
        assert!(url.starts_with("sqlite://"));
        assert!(db.exists());
    }
}
