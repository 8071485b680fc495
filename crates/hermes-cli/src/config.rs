// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use log::LevelFilter;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_PAGE_SIZE: usize = 100;
const DEFAULT_BUSY_TIMEOUT: &str = "5s";
const DEFAULT_LOG_LEVEL: &str = "info";
const FALLBACK_USER: &str = "citizen";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub session: Session,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
            session: Session::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
    pub busy_timeout: Option<String>,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout: Some(DEFAULT_BUSY_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub page_size: Option<i64>,
    pub allow_new: Option<bool>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            page_size: Some(DEFAULT_PAGE_SIZE as i64),
            allow_new: Some(false),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Session {
    pub user: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub path: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            path: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("HERMES_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set HERMES_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(hermes_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` at the top and keep values under [storage], [ui], [session] and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            hermes_db::validate_db_path(db_path)
                .with_context(|| format!("storage.db_path in {}", path.display()))?;
        }

        if let Some(timeout) = &self.storage.busy_timeout {
            let parsed = parse_duration(timeout)
                .with_context(|| format!("storage.busy_timeout in {}", path.display()))?;
            if parsed.is_zero() {
                bail!(
                    "storage.busy_timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
            if parsed > hermes_db::MAX_BUSY_TIMEOUT {
                bail!(
                    "storage.busy_timeout in {} must be at most {}ms, got {}",
                    path.display(),
                    hermes_db::MAX_BUSY_TIMEOUT.as_millis(),
                    timeout
                );
            }
        }

        if let Some(page_size) = self.ui.page_size
            && page_size <= 0
        {
            bail!(
                "ui.page_size in {} must be positive, got {}",
                path.display(),
                page_size
            );
        }

        if let Some(user) = &self.session.user
            && user.trim().is_empty()
        {
            bail!(
                "session.user in {} must not be blank; remove the key to use $USER",
                path.display()
            );
        }

        if let Some(level) = &self.log.level {
            LevelFilter::from_str(level).map_err(|_| {
                anyhow!(
                    "log.level in {} is {level:?}; use one of off, error, warn, info, debug, trace",
                    path.display()
                )
            })?;
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => hermes_db::default_db_path(),
        }
    }

    pub fn busy_timeout(&self) -> Result<Duration> {
        parse_duration(
            self.storage
                .busy_timeout
                .as_deref()
                .unwrap_or(DEFAULT_BUSY_TIMEOUT),
        )
    }

    pub fn page_size(&self) -> usize {
        self.ui
            .page_size
            .and_then(|size| usize::try_from(size).ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn allow_new(&self) -> bool {
        self.ui.allow_new.unwrap_or(false)
    }

    /// Name stamped on records this session modifies.
    pub fn session_user(&self) -> String {
        if let Some(user) = &self.session.user {
            return user.trim().to_owned();
        }
        env::var("USER")
            .ok()
            .map(|user| user.trim().to_owned())
            .filter(|user| !user.is_empty())
            .unwrap_or_else(|| FALLBACK_USER.to_owned())
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.path {
            return Ok(PathBuf::from(path));
        }

        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].path to a writable file")
        })?;
        let app_dir = data_root.join(hermes_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create data directory {}", app_dir.display()))?;
        Ok(app_dir.join("hermes.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# hermes config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/hermes/hermes.db)\n# db_path = \"/absolute/path/to/hermes.db\"\nbusy_timeout = \"{}\"\n\n[ui]\npage_size = {}\nallow_new = false\n\n[session]\n# Optional. Defaults to $USER\n# user = \"registry-desk\"\n\n[log]\nlevel = \"{}\"\n# path = \"/absolute/path/to/hermes.log\"\n",
            path.display(),
            DEFAULT_BUSY_TIMEOUT,
            DEFAULT_PAGE_SIZE,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("timeout duration {raw:?} is out of range"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
