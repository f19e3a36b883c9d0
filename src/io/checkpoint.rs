//! Last accepted configuration, saved with the timestep it was reached at.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::metad::{HostEngine, MetadParams};

/// Contents of the configuration file written at the end of a run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SavedConfiguration<S> {
    pub timestep: u64,
    pub snapshot: S,
}

pub fn write_checkpoint<P: AsRef<Path>, S: Serialize>(path: P, timestep: u64, snapshot: &S) -> Result<()> {
    let file = File::create(path)?;
    serde_yaml::to_writer(BufWriter::new(file), &SavedConfiguration { timestep, snapshot })?;
    Ok(())
}

pub fn read_checkpoint<P: AsRef<Path>, S: DeserializeOwned>(path: P) -> Result<SavedConfiguration<S>> {
    let file = File::open(path)?;
    Ok(serde_yaml::from_reader(BufReader::new(file))?)
}

/// Put a saved configuration back into `host` and resume the clock from it.
///
/// An `initial_timestep` already present in `params` wins over the saved one.
pub fn restore_checkpoint<H, P>(host: &mut H, params: &mut MetadParams, path: P) -> Result<u64>
where
    H: HostEngine,
    H::Snapshot: DeserializeOwned,
    P: AsRef<Path>,
{
    let saved: SavedConfiguration<H::Snapshot> = read_checkpoint(path.as_ref())?;
    host.restore(&saved.snapshot);
    let timestep = *params.initial_timestep.get_or_insert(saved.timestep);
    log::info!("restored configuration from {} at step {}", path.as_ref().display(), saved.timestep);
    Ok(timestep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::{DoubleWellLangevin, DoubleWellParams, ParticleState};

    fn metad_params() -> MetadParams {
        MetadParams {
            kt: 1.0,
            mc_stride: 1,
            metad_stride: 1,
            init_height: 1.0,
            sigma: 0.1,
            gamma: 5.0,
            cv_min: -1.0,
            cv_max: 1.0,
            bins: 5,
            restart: true,
            restart_fn: Some("history.txt".to_string()),
            initial_timestep: None,
            seed: 1,
            bias_mode: true,
            verbose: false,
        }
    }

    #[test]
    fn test_restore_sets_host_and_timestep() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last.yml");

        let mut source = DoubleWellLangevin::new(DoubleWellParams { init_x: 1.0, ..Default::default() }).unwrap();
        for _ in 0..10 {
            source.step();
        }
        let snapshot = source.snapshot();
        write_checkpoint(&path, 250, &snapshot).unwrap();

        let saved: SavedConfiguration<ParticleState> = read_checkpoint(&path).unwrap();
        assert_eq!(saved.timestep, 250);
        assert_eq!(saved.snapshot, snapshot);

        let mut host = DoubleWellLangevin::new(DoubleWellParams::default()).unwrap();
        let mut params = metad_params();
        assert_eq!(restore_checkpoint(&mut host, &mut params, &path).unwrap(), 250);
        assert_eq!(params.initial_timestep, Some(250));
        assert_eq!(host.snapshot(), snapshot);
    }

    #[test]
    fn test_explicit_initial_timestep_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last.yml");
        let mut host = DoubleWellLangevin::new(DoubleWellParams::default()).unwrap();
        write_checkpoint(&path, 250, &host.snapshot()).unwrap();

        let mut params = MetadParams { initial_timestep: Some(300), ..metad_params() };
        assert_eq!(restore_checkpoint(&mut host, &mut params, &path).unwrap(), 300);
        assert_eq!(params.initial_timestep, Some(300));
    }

    #[test]
    fn test_missing_checkpoint_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = DoubleWellLangevin::new(DoubleWellParams::default()).unwrap();
        let mut params = metad_params();
        let err = restore_checkpoint(&mut host, &mut params, dir.path().join("missing.yml"));
        assert!(matches!(err, Err(crate::error::MetadError::Io(_))));
        assert_eq!(params.initial_timestep, None);
    }
}
