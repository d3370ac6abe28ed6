//! Solver configuration
//!
//! Configuration is layered: built-in defaults, then an optional JSON file,
//! then `SATSOLV_*` environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SolvError};

/// Constraint-relaxation switches of the solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SolverFlags {
    /// Repair installed packages whose dependencies are already broken
    pub fix_system: bool,
    /// Update every installed package to its best candidate
    pub update_system: bool,
    /// Accept lower versions as update candidates
    pub allow_downgrade: bool,
    /// Installed packages may be removed to resolve conflicts
    pub allow_uninstall: bool,
    /// Only same-name packages count as updates, not obsoleting ones
    pub no_update_provide: bool,
    /// Do not install recommended or supplementing packages
    pub ignore_recommended: bool,
    /// Updates may switch between architecture families
    pub allow_arch_change: bool,
}

impl SolverFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fix_system(mut self, value: bool) -> Self {
        self.fix_system = value;
        self
    }

    pub fn update_system(mut self, value: bool) -> Self {
        self.update_system = value;
        self
    }

    pub fn allow_downgrade(mut self, value: bool) -> Self {
        self.allow_downgrade = value;
        self
    }

    pub fn allow_uninstall(mut self, value: bool) -> Self {
        self.allow_uninstall = value;
        self
    }

    pub fn no_update_provide(mut self, value: bool) -> Self {
        self.no_update_provide = value;
        self
    }

    pub fn ignore_recommended(mut self, value: bool) -> Self {
        self.ignore_recommended = value;
        self
    }

    pub fn allow_arch_change(mut self, value: bool) -> Self {
        self.allow_arch_change = value;
        self
    }
}

/// Full solver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SolverConfig {
    pub flags: SolverFlags,

    /// Target architecture of the pool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,

    /// A missing epoch matches any epoch when evaluating relations
    pub promote_epoch: bool,

    /// Maximum number of decisions plus conflicts before the search gives up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u64>,

    /// Wall-clock budget for one solve in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Builds a [`SolverConfig`] from a file and the environment.
#[derive(Debug)]
pub struct ConfigLoader {
    use_environment: bool,
}

impl ConfigLoader {
    pub fn new(use_environment: bool) -> Self {
        Self { use_environment }
    }

    /// Get a raw environment variable, ignoring empty values
    pub fn get_env(&self, var: &str) -> Option<String> {
        if !self.use_environment {
            return None;
        }

        env::var(var).ok().filter(|s| !s.is_empty())
    }

    /// Get a configuration value from the environment.
    /// Converts "foo-bar" to "SATSOLV_FOO_BAR"
    pub fn get_env_config(&self, key: &str) -> Option<String> {
        let env_var = format!("SATSOLV_{}", key.replace('-', "_").to_uppercase());
        self.get_env(&env_var)
    }

    pub fn get_env_bool(&self, key: &str) -> Option<bool> {
        let value = self.get_env_config(key)?;
        match value.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => {
                log::warn!("Ignoring invalid boolean for {}: {}", key, value);
                None
            }
        }
    }

    pub fn get_env_u64(&self, key: &str) -> Option<u64> {
        let value = self.get_env_config(key)?;
        match value.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                log::warn!("Ignoring invalid number for {}: {}", key, value);
                None
            }
        }
    }

    /// Load configuration from a JSON file. A missing file yields the defaults.
    pub fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<SolverConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(SolverConfig::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| SolvError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let config: SolverConfig = serde_json::from_str(&contents)
            .map_err(|e| SolvError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        Ok(config)
    }

    /// Build the effective configuration.
    pub fn load<P: AsRef<Path>>(&self, path: Option<P>) -> Result<SolverConfig> {
        let mut config = match path {
            Some(path) => self.load_config_file(path)?,
            None => SolverConfig::default(),
        };

        self.apply_environment(&mut config);
        Ok(config)
    }

    /// Override configuration values from `SATSOLV_*` variables
    pub fn apply_environment(&self, config: &mut SolverConfig) {
        if !self.use_environment {
            return;
        }

        let flags = &mut config.flags;
        let switches: [(&str, &mut bool); 7] = [
            ("fix-system", &mut flags.fix_system),
            ("update-system", &mut flags.update_system),
            ("allow-downgrade", &mut flags.allow_downgrade),
            ("allow-uninstall", &mut flags.allow_uninstall),
            ("no-update-provide", &mut flags.no_update_provide),
            ("ignore-recommended", &mut flags.ignore_recommended),
            ("allow-arch-change", &mut flags.allow_arch_change),
        ];
        for (key, slot) in switches {
            if let Some(value) = self.get_env_bool(key) {
                *slot = value;
            }
        }

        if let Some(value) = self.get_env_bool("promote-epoch") {
            config.promote_epoch = value;
        }
        if let Some(arch) = self.get_env_config("arch") {
            config.arch = Some(arch);
        }
        if let Some(steps) = self.get_env_u64("max-steps") {
            config.max_steps = Some(steps);
        }
        if let Some(ms) = self.get_env_u64("timeout-ms") {
            config.timeout_ms = Some(ms);
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_default_all_off() {
        let flags = SolverFlags::default();
        assert!(!flags.fix_system);
        assert!(!flags.update_system);
        assert!(!flags.allow_downgrade);
        assert!(!flags.allow_uninstall);
        assert!(!flags.no_update_provide);
        assert!(!flags.ignore_recommended);
        assert!(!flags.allow_arch_change);
    }

    #[test]
    fn test_flags_builder() {
        let flags = SolverFlags::new().allow_uninstall(true).update_system(true);
        assert!(flags.allow_uninstall);
        assert!(flags.update_system);
        assert!(!flags.fix_system);
    }

    #[test]
    fn test_config_kebab_case_json() {
        let json = r#"{
            "flags": { "allow-uninstall": true, "no-update-provide": true },
            "arch": "x86_64",
            "max-steps": 500
        }"#;
        let config: SolverConfig = serde_json::from_str(json).unwrap();
        assert!(config.flags.allow_uninstall);
        assert!(config.flags.no_update_provide);
        assert!(!config.flags.update_system);
        assert_eq!(config.arch.as_deref(), Some("x86_64"));
        assert_eq!(config.max_steps, Some(500));
        assert_eq!(config.timeout_ms, None);
        assert!(!config.promote_epoch);
    }

    #[test]
    fn test_config_timeout() {
        let config = SolverConfig {
            timeout_ms: Some(1500),
            ..Default::default()
        };
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_loader_env_disabled() {
        let loader = ConfigLoader::new(false);
        assert_eq!(loader.get_env_config("arch"), None);
        assert_eq!(loader.get_env_bool("allow-uninstall"), None);
    }

    #[test]
    fn test_loader_missing_file_is_default() {
        let loader = ConfigLoader::new(false);
        let config = loader.load(Some("/nonexistent/satsolv.json")).unwrap();
        assert_eq!(config, SolverConfig::default());
    }
}
