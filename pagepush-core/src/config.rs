//! Configuration management for pagepush
//!
//! Options are resolved per target with the following priority (highest to
//! lowest):
//! 1. CLI flags
//! 2. Environment variables (PAGEPUSH_*)
//! 3. The target's table in `pagepush.toml` (`[targets.<name>]`)
//! 4. Shared `[options]` in `pagepush.toml`
//! 5. Shared `[options]` in the user config (~/.config/pagepush/config.toml)
//! 6. Default values

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::publish::{default_clone_dir, PublishOptions, UserIdentity};
use crate::{Error, Result};

/// Project config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "pagepush.toml";

/// A single pattern or a list of patterns
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    /// Flatten into a list
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Patterns::One(pattern) => vec![pattern],
            Patterns::Many(patterns) => patterns,
        }
    }
}

/// Partially specified publish options
///
/// Every layer (file, environment, CLI) produces one of these; unset fields
/// fall through to the layer below.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    pub src: Option<Patterns>,
    pub base: Option<PathBuf>,
    pub clone: Option<PathBuf>,
    pub dotfiles: Option<bool>,
    pub branch: Option<String>,
    pub remote: Option<String>,
    pub repo: Option<String>,
    pub only: Option<Patterns>,
    pub add: Option<bool>,
    pub push: Option<bool>,
    pub message: Option<String>,
    pub silent: Option<bool>,
    pub user: Option<UserIdentity>,
    pub tag: Option<String>,
    pub git: Option<String>,
    pub depth: Option<u32>,
    pub nojekyll: Option<bool>,
}

impl TargetConfig {
    /// Layer `over` on top of `self`; fields set in `over` win
    pub fn merge(self, over: TargetConfig) -> TargetConfig {
        TargetConfig {
            src: over.src.or(self.src),
            base: over.base.or(self.base),
            clone: over.clone.or(self.clone),
            dotfiles: over.dotfiles.or(self.dotfiles),
            branch: over.branch.or(self.branch),
            remote: over.remote.or(self.remote),
            repo: over.repo.or(self.repo),
            only: over.only.or(self.only),
            add: over.add.or(self.add),
            push: over.push.or(self.push),
            message: over.message.or(self.message),
            silent: over.silent.or(self.silent),
            user: over.user.or(self.user),
            tag: over.tag.or(self.tag),
            git: over.git.or(self.git),
            depth: over.depth.or(self.depth),
            nojekyll: over.nojekyll.or(self.nojekyll),
        }
    }

    /// Resolve into complete options for `target`
    ///
    /// Relative `base` and `clone` paths are resolved against `cwd`.
    pub fn resolve(self, target: &str, cwd: &Path) -> Result<PublishOptions> {
        let src = self
            .src
            .map(Patterns::into_vec)
            .filter(|src| !src.is_empty())
            .ok_or_else(|| Error::Precondition("Required \"src\" property missing.".to_string()))?;

        let base = self.base.map(|b| cwd.join(b)).unwrap_or_else(|| cwd.to_path_buf());
        let mut options = PublishOptions::new(target, src, base);

        options.clone = cwd.join(self.clone.unwrap_or_else(|| default_clone_dir(target)));
        if let Some(dotfiles) = self.dotfiles {
            options.dotfiles = dotfiles;
        }
        if let Some(branch) = self.branch {
            options.branch = branch;
        }
        if let Some(remote) = self.remote {
            options.remote = remote;
        }
        options.repo = self.repo;
        if let Some(only) = self.only {
            options.only = only.into_vec();
        }
        if let Some(add) = self.add {
            options.add = add;
        }
        if let Some(push) = self.push {
            options.push = push;
        }
        if let Some(message) = self.message {
            options.message = message;
        }
        if let Some(silent) = self.silent {
            options.silent = silent;
        }
        options.user = self.user;
        options.tag = self.tag;
        if let Some(git) = self.git {
            options.git = git;
        }
        options.depth = self.depth;
        if let Some(nojekyll) = self.nojekyll {
            options.nojekyll = nojekyll;
        }

        Ok(options)
    }
}

/// Named targets, kept in the order they are declared
///
/// Publishing runs targets in this order, so an additive target declared
/// after a replacing one keeps its files.
#[derive(Debug, Clone, Default)]
pub struct Targets(Vec<(String, TargetConfig)>);

impl Targets {
    /// Look up a target by name
    pub fn get(&self, name: &str) -> Option<&TargetConfig> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, target)| target)
    }

    /// Target names in declaration order
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `over` into these targets
    ///
    /// Targets present in both are merged in place; targets only in `over`
    /// are appended.
    fn layer(self, over: Targets) -> Targets {
        let mut targets = self.0;
        for (name, target) in over.0 {
            match targets.iter_mut().find(|(n, _)| *n == name) {
                Some((_, existing)) => {
                    let base = std::mem::take(existing);
                    *existing = base.merge(target);
                }
                None => targets.push((name, target)),
            }
        }
        Targets(targets)
    }
}

impl<'de> Deserialize<'de> for Targets {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TargetsVisitor;

        impl<'de> Visitor<'de> for TargetsVisitor {
            type Value = Targets;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a table of publish targets")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Targets, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut targets: Vec<(String, TargetConfig)> = Vec::new();
                while let Some((name, target)) = map.next_entry::<String, TargetConfig>()? {
                    if targets.iter().any(|(n, _)| *n == name) {
                        return Err(de::Error::custom(format!("duplicate target `{}`", name)));
                    }
                    targets.push((name, target));
                }
                Ok(Targets(targets))
            }
        }

        deserializer.deserialize_map(TargetsVisitor)
    }
}

impl Serialize for Targets {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, target) in &self.0 {
            map.serialize_entry(name, target)?;
        }
        map.end()
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Options shared by every target
    pub options: TargetConfig,

    /// Named publish targets
    pub targets: Targets,

    /// Environment overrides, applied above every file layer
    #[serde(skip)]
    env: TargetConfig,
}

impl Config {
    /// Load the user config, then the project config on top of it
    ///
    /// An explicit `path` must exist; the default project file and the user
    /// config are optional.
    pub fn load(path: Option<&Path>, cwd: &Path) -> Result<Self> {
        let user = match Self::user_config_path() {
            Some(p) if p.exists() => Self::load_from_file(&p)?,
            _ => Self::default(),
        };

        let project = match path {
            Some(p) => Self::load_from_file(&cwd.join(p))?,
            None => {
                let default_path = cwd.join(CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        Ok(user.layer(project))
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
    }

    /// Parse configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Get the user config file path
    ///
    /// Returns `~/.config/pagepush/config.toml` on Unix
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pagepush").join("config.toml"))
    }

    /// Put `over` on top of this config
    fn layer(self, over: Config) -> Config {
        Config {
            options: self.options.merge(over.options),
            targets: self.targets.layer(over.targets),
            env: self.env.merge(over.env),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - PAGEPUSH_GIT: Git executable
    /// - PAGEPUSH_REPO: Repository URL
    /// - PAGEPUSH_BRANCH: Branch to publish to
    /// - PAGEPUSH_REMOTE: Remote alias
    /// - PAGEPUSH_MESSAGE: Commit message
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env = TargetConfig {
            git: lookup("PAGEPUSH_GIT"),
            repo: lookup("PAGEPUSH_REPO"),
            branch: lookup("PAGEPUSH_BRANCH"),
            remote: lookup("PAGEPUSH_REMOTE"),
            message: lookup("PAGEPUSH_MESSAGE"),
            ..Default::default()
        };
        self.env = self.env.merge(env);
        self
    }

    /// Names of the configured targets, in the order they were declared
    pub fn target_names(&self) -> Vec<String> {
        self.targets.names()
    }

    /// Resolve the options for a target with CLI overrides applied
    ///
    /// A target not present in the config file is built from the shared
    /// options and `cli` alone.
    pub fn resolve(&self, target: &str, cli: &TargetConfig, cwd: &Path) -> Result<PublishOptions> {
        let file_target = self.targets.get(target).cloned().unwrap_or_default();

        self.options
            .clone()
            .merge(file_target)
            .merge(self.env.clone())
            .merge(cli.clone())
            .resolve(target, cwd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cwd() -> PathBuf {
        PathBuf::from("/work")
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[options]
branch = "pages"
user = { name = "My Name", email = "mail@example.com" }

[targets.first]
src = "**/*"
base = "first"

[targets.second]
src = ["**/*", "!*.map"]
base = "second"
add = true
"#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.target_names(), vec!["first", "second"]);

        let first = config.resolve("first", &TargetConfig::default(), &cwd()).unwrap();
        assert_eq!(first.src, vec!["**/*"]);
        assert_eq!(first.base, PathBuf::from("/work/first"));
        assert_eq!(first.branch, "pages");
        assert_eq!(first.clone, PathBuf::from("/work/.pagepush/first"));
        assert!(!first.add);
        assert_eq!(
            first.user,
            Some(UserIdentity {
                name: "My Name".to_string(),
                email: "mail@example.com".to_string(),
            })
        );

        let second = config.resolve("second", &TargetConfig::default(), &cwd()).unwrap();
        assert_eq!(second.src, vec!["**/*", "!*.map"]);
        assert!(second.add);
    }

    #[test]
    fn test_missing_src() {
        let config = Config::parse("[targets.site]\nbase = \"dist\"\n").unwrap();
        let err = config
            .resolve("site", &TargetConfig::default(), &cwd())
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        assert_eq!(err.to_string(), "Required \"src\" property missing.");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::parse("[options]\nbranhc = \"oops\"\n").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_override_priority() {
        let toml = r#"
[options]
message = "from options"
remote = "upstream"

[targets.site]
src = "*"
message = "from target"
branch = "from-target"
"#;
        let config = Config::parse(toml).unwrap().with_overrides_from(|key| match key {
            "PAGEPUSH_BRANCH" => Some("from-env".to_string()),
            "PAGEPUSH_GIT" => Some("/opt/git".to_string()),
            _ => None,
        });
        let cli = TargetConfig {
            git: Some("/cli/git".to_string()),
            push: Some(false),
            ..Default::default()
        };

        let options = config.resolve("site", &cli, &cwd()).unwrap();
        assert_eq!(options.message, "from target");
        assert_eq!(options.remote, "upstream");
        assert_eq!(options.branch, "from-env");
        assert_eq!(options.git, "/cli/git");
        assert!(!options.push);
    }

    #[test]
    fn test_ad_hoc_target_from_cli() {
        let cli = TargetConfig {
            src: Some(Patterns::One("hello.txt".to_string())),
            repo: Some("./repo".to_string()),
            ..Default::default()
        };
        let options = Config::default().resolve("default", &cli, &cwd()).unwrap();
        assert_eq!(options.src, vec!["hello.txt"]);
        assert_eq!(options.base, cwd());
        assert_eq!(options.repo.as_deref(), Some("./repo"));
        assert_eq!(options.clone, PathBuf::from("/work/.pagepush/default"));
    }

    #[test]
    fn test_targets_keep_declaration_order() {
        let toml = r#"
[targets.site]
src = "**/*"
base = "dist"

[targets.extra]
src = "**/*"
base = "extra"
add = true
"#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.target_names(), vec!["site", "extra"]);

        let user = Config::parse("[targets.zeta]\nsrc = \"*\"\n[targets.site]\nsrc = \"*\"\n").unwrap();
        let layered = user.layer(config);
        assert_eq!(layered.target_names(), vec!["zeta", "site", "extra"]);
        let site = layered.resolve("site", &TargetConfig::default(), &cwd()).unwrap();
        assert_eq!(site.src, vec!["**/*"]);
    }

    #[test]
    fn test_duplicate_target_rejected() {
        let err = Config::parse("[targets.site]\nsrc = \"*\"\n[targets.site]\nbase = \"dist\"\n").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_layer_merges_targets() {
        let user = Config::parse("[options]\nmessage = \"user\"\n[targets.site]\nsrc = \"*\"\n").unwrap();
        let project = Config::parse("[options]\nbranch = \"pages\"\n[targets.site]\nbase = \"dist\"\n").unwrap();
        let config = user.layer(project);

        let options = config.resolve("site", &TargetConfig::default(), &cwd()).unwrap();
        assert_eq!(options.message, "user");
        assert_eq!(options.branch, "pages");
        assert_eq!(options.src, vec!["*"]);
        assert_eq!(options.base, PathBuf::from("/work/dist"));
    }
}
