// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{find_in_parent, resolve_config_path};
use anyhow::{bail, Context, Result};
use e2s::build_bfv_params_arc;
use fhe::bfv::BfvParameters;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, sync::Arc, time::Duration};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_NAME: &str = "e2s.config.yaml";
pub const ENV_PREFIX: &str = "E2S_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct E2sConfig {
    /// Ring degree, a power of two
    pub degree: usize,
    pub plaintext_modulus: u64,
    /// Ciphertext moduli, NTT friendly for `degree`
    pub moduli: Vec<u64>,
    pub sigma_smudging: f64,
    pub num_parties: usize,
    pub collection_timeout_secs: u64,
    /// Worker threads for the task pool
    pub threads: usize,
    /// Jobs allowed in flight on the task pool
    pub max_tasks: usize,
}

impl Default for E2sConfig {
    fn default() -> Self {
        Self {
            degree: 8,
            plaintext_modulus: 17,
            moduli: vec![0xffffee001, 0xffffc4001],
            sigma_smudging: 3.2,
            num_parties: 3,
            collection_timeout_secs: 600,
            threads: default_threads(),
            max_tasks: 10,
        }
    }
}

/// Leave one core for the async runtime.
fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

impl E2sConfig {
    /// Load defaults, then the YAML file if there is one, then `E2S_*` environment variables.
    ///
    /// An explicit `config_file` must exist.
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let explicit = config_file.is_some();
        let path = resolve_config_path(
            find_in_parent,
            env::current_dir()?,
            OsDirs::config_dir(),
            DEFAULT_CONFIG_NAME,
            config_file,
        );

        let mut figment = Figment::from(Serialized::defaults(E2sConfig::default()));
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            figment = figment.merge(Yaml::file(&path));
        } else if explicit {
            bail!("Configuration file not found: {}", path.display());
        } else {
            debug!("No configuration file at {}, using defaults", path.display());
        }

        let config: E2sConfig = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .context("Could not parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_parties < 2 {
            bail!("num_parties must be at least 2, got {}", self.num_parties);
        }
        if !self.sigma_smudging.is_finite() || self.sigma_smudging <= 0.0 {
            bail!(
                "sigma_smudging must be a positive number, got {}",
                self.sigma_smudging
            );
        }
        if self.moduli.is_empty() {
            bail!("at least one ciphertext modulus is required");
        }
        if self.threads == 0 || self.max_tasks == 0 {
            bail!("threads and max_tasks must be non-zero");
        }
        Ok(())
    }

    pub fn bfv_params(&self) -> Result<Arc<BfvParameters>> {
        build_bfv_params_arc(self.degree, self.plaintext_modulus, &self.moduli)
            .context("Invalid BFV parameters in configuration")
    }

    pub fn collection_timeout(&self) -> Duration {
        Duration::from_secs(self.collection_timeout_secs)
    }
}

pub struct OsDirs;
impl OsDirs {
    /// `<os config dir>/e2s`, or the working directory on platforms without one.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("e2s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn isolate_config_dir(jail: &mut Jail) {
        let home = jail.directory().to_string_lossy().to_string();
        jail.set_env("HOME", &home);
        jail.set_env("XDG_CONFIG_HOME", format!("{}/.config", home));
    }

    #[test]
    fn test_defaults() {
        Jail::expect_with(|jail| {
            isolate_config_dir(jail);
            let config = E2sConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.degree, 8);
            assert_eq!(config.plaintext_modulus, 17);
            assert_eq!(config.moduli, vec![0xffffee001, 0xffffc4001]);
            assert_eq!(config.num_parties, 3);
            assert_eq!(config.collection_timeout(), Duration::from_secs(600));
            assert!(config.threads >= 1);
            Ok(())
        });
    }

    #[test]
    fn test_yaml_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_NAME,
                r#"
degree: 16
plaintext_modulus: 257
num_parties: 4
sigma_smudging: 4.5
"#,
            )?;
            isolate_config_dir(jail);
            jail.set_env("E2S_NUM_PARTIES", "7");

            let config = E2sConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.degree, 16);
            assert_eq!(config.plaintext_modulus, 257);
            assert_eq!(config.sigma_smudging, 4.5);
            // env wins over yaml
            assert_eq!(config.num_parties, 7);
            // untouched keys keep their defaults
            assert_eq!(config.max_tasks, 10);

            let params = config.bfv_params().map_err(|e| e.to_string())?;
            assert_eq!(params.degree(), 16);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_must_exist() {
        Jail::expect_with(|_| {
            assert!(E2sConfig::load(Some(PathBuf::from("missing.yaml"))).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_validation() {
        let mut config = E2sConfig::default();
        assert!(config.validate().is_ok());

        config.num_parties = 1;
        assert!(config.validate().is_err());

        config = E2sConfig::default();
        config.sigma_smudging = 0.0;
        assert!(config.validate().is_err());

        config = E2sConfig::default();
        config.moduli.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_yaml_value_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_NAME, "num_parties: 1\n")?;
            assert!(E2sConfig::load(None).is_err());
            Ok(())
        });
    }
}
