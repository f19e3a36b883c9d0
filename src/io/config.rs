use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::metad::MetadParams;
use crate::systems::DoubleWellParams;

fn default_log_stride() -> u64 {
    1
}

fn default_log_fn() -> String {
    "metad_log.txt".to_string()
}

fn default_history_fn() -> String {
    "metad_history.txt".to_string()
}

fn default_configuration_fn() -> String {
    "last_accepted.yml".to_string()
}

/// Everything the `hmc_metad` binary needs for one run.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunConfig {
    pub metad: MetadParams,
    pub system: DoubleWellParams,
    pub n_steps: u64,
    #[serde(default = "default_log_stride")]
    pub log_stride: u64,
    #[serde(default = "default_log_fn")]
    pub log_fn: String,
    #[serde(default = "default_history_fn")]
    pub history_fn: String,
    #[serde(default = "default_configuration_fn")]
    pub configuration_fn: String,
}

/// read a yaml run configuration
pub fn read_run_config<P: AsRef<Path>>(filename: P) -> Result<RunConfig> {
    let file = std::fs::File::open(filename)?;
    let reader = std::io::BufReader::new(file);
    let config: RunConfig = serde_yaml::from_reader(reader)?;
    config.metad.validate()?;
    Ok(config)
}

// example of yaml file
// n_steps: 100000
// log_stride: 100
// metad:
//   kt: 1.0
//   mc_stride: 10
//   metad_stride: 100
//   init_height: 0.5
//   sigma: 0.1
//   gamma: 8.0
//   cv_min: -2.0
//   cv_max: 2.0
//   bins: 101
// system:
//   n_particles: 1
//   a: 1.0
//   b: 2.0

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetadError;

    const MINIMAL: &str = "
n_steps: 1000
metad:
  kt: 1.0
  mc_stride: 10
  metad_stride: 100
  init_height: 0.5
  sigma: 0.1
  gamma: 8.0
  cv_min: -2.0
  cv_max: 2.0
  bins: 101
system:
  n_particles: 2
";

    #[test]
    fn test_defaults_filled_in() {
        let config: RunConfig = serde_yaml::from_str(MINIMAL).unwrap();
        assert_eq!(config.metad.seed, 1);
        assert!(config.metad.bias_mode);
        assert!(!config.metad.restart);
        assert_eq!(config.log_stride, 1);
        assert_eq!(config.history_fn, "metad_history.txt");
        assert_eq!(config.system.n_particles, 2);
        assert_eq!(config.system.a, 1.0);
    }

    #[test]
    fn test_read_rejects_invalid_strides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, MINIMAL.replace("metad_stride: 100", "metad_stride: 25")).unwrap();
        assert!(matches!(read_run_config(&path), Err(MetadError::Configuration(_))));
    }

    #[test]
    fn test_read_missing_file() {
        assert!(matches!(read_run_config("/nonexistent/config.yml"), Err(MetadError::Io(_))));
    }
}
