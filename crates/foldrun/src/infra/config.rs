//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".foldrun/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub annotation: Annotation,
    #[serde(default)]
    pub picker: Picker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Host language id the action is restricted to.
    #[serde(default = "Language::default_id")]
    pub id: String,
}

impl Language {
    fn default_id() -> String {
        "python".into()
    }
}

impl Default for Language {
    fn default() -> Self {
        Self {
            id: Self::default_id(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    comment_prefix: Option<String>,
}

impl Annotation {
    fn default_comment_prefix() -> &'static str {
        "#"
    }

    /// Comment prefix used on the payload's origin line.
    pub fn comment_prefix(&self) -> &str {
        self.comment_prefix
            .as_deref()
            .unwrap_or_else(|| Self::default_comment_prefix())
    }
}

impl Default for Annotation {
    fn default() -> Self {
        Self {
            comment_prefix: Some(Self::default_comment_prefix().to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picker {
    #[serde(default)]
    title: Option<String>,
}

impl Picker {
    fn default_title() -> &'static str {
        "Select console to execute in"
    }

    /// Prompt title shown when several consoles are candidates.
    pub fn title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| Self::default_title().to_owned())
    }
}

impl Default for Picker {
    fn default() -> Self {
        Self {
            title: Some(Self::default_title().to_owned()),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    language: Option<String>,
    picker_title: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            language: env::var("FOLDRUN_LANGUAGE").ok(),
            picker_title: env::var("FOLDRUN_PICKER_TITLE").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(language: &str, picker_title: &str) -> Self {
        Self {
            language: Some(language.to_owned()),
            picker_title: Some(picker_title.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace
    /// config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            language: merge_language(self.language, other.language),
            annotation: merge_annotation(self.annotation, other.annotation),
            picker: merge_picker(self.picker, other.picker),
        }
    }
}

fn merge_language(base: Language, overlay: Language) -> Language {
    Language {
        id: if overlay.id != Language::default_id() {
            overlay.id
        } else {
            base.id
        },
    }
}

fn merge_annotation(mut base: Annotation, overlay: Annotation) -> Annotation {
    if let Some(value) = overlay.comment_prefix {
        base.comment_prefix = Some(value);
    }
    base
}

fn merge_picker(mut base: Picker, overlay: Picker) -> Picker {
    if let Some(value) = overlay.title {
        base.title = Some(value);
    }
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("foldrun/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(language) = env.language {
        config.language.id = language;
    }
    if let Some(title) = env.picker_title {
        config.picker.title = Some(title);
    }
    config
}
