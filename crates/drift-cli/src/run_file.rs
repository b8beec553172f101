//! The JSON run file and its conversion to a [`ModelConfig`].
//!
//! ```json
//! {
//!   "start": "2015-04-01",
//!   "stop": "2015-04-03T12",
//!   "dt": 3600,
//!   "output_period": 10800,
//!   "grid": "fjord.drgr",
//!   "forcing": ["ocean_2015-04.drfc"],
//!   "scheme": "RK4",
//!   "diffusivity": 1.0,
//!   "release": { "file": "drift.rls", "frequency": 21600 },
//!   "output": { "file": "drift.out", "instance_variables": ["age"] },
//!   "ibm": { "name": "lifespan", "params": { "max_age": 864000 } }
//! }
//! ```
//!
//! Relative paths are resolved against the directory of the run file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use drift_core::parse_timestamp;
use drift_engine::{ModelConfig, WarmStartConfig};
use drift_ibm::IbmConfig;
use drift_release::ReleaseMode;
use drift_tracker::Scheme;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A complete run, as written by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunFile {
    /// Simulation start, e.g. `2015-04-01T06`.
    pub start: String,
    /// Simulation stop.
    pub stop: String,
    /// Time step in seconds.
    pub dt: i64,
    /// Output period in seconds; defaults to `dt`.
    #[serde(default)]
    pub output_period: Option<i64>,
    /// Grid file.
    pub grid: PathBuf,
    /// Forcing files in time order.
    pub forcing: Vec<PathBuf>,
    /// Extra scalar fields to read from the forcing.
    #[serde(default)]
    pub forcing_fields: Vec<String>,
    /// `EF`, `RK2` or `RK4`.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Horizontal diffusivity in m²/s.
    #[serde(default)]
    pub diffusivity: f64,
    /// Seed of the diffusion noise.
    #[serde(default)]
    pub seed: u64,
    /// Release settings; optional when warm starting.
    #[serde(default)]
    pub release: Option<ReleaseSection>,
    /// Output settings.
    #[serde(default)]
    pub output: OutputSection,
    /// Resume from a previous run.
    #[serde(default)]
    pub warm_start: Option<WarmStartSection>,
    /// Behavior module.
    #[serde(default)]
    pub ibm: IbmSection,
}

fn default_scheme() -> String {
    "RK4".into()
}

/// Release table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseSection {
    /// Release table.
    pub file: PathBuf,
    /// Column names; defaults to `mult release_time X Y Z`.
    #[serde(default)]
    pub format: Option<Vec<String>>,
    /// Continuous release period in seconds; discrete if absent.
    #[serde(default)]
    pub frequency: Option<i64>,
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Output file; nothing is written if absent.
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Instance variables recorded at every output time.
    #[serde(default)]
    pub instance_variables: Vec<String>,
    /// Particle variables recorded once per particle.
    #[serde(default)]
    pub particle_variables: Vec<String>,
    /// Also record longitude and latitude.
    #[serde(default)]
    pub lonlat: bool,
}

/// Warm-start settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarmStartSection {
    /// Output file of the previous run.
    pub file: PathBuf,
    /// Variables to restore from its last frame.
    #[serde(default)]
    pub variables: Vec<String>,
}

/// Behavior module selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IbmSection {
    /// Registered module name.
    #[serde(default = "default_ibm")]
    pub name: String,
    /// Numeric parameters of the module.
    #[serde(default)]
    pub params: IndexMap<String, f64>,
}

fn default_ibm() -> String {
    "none".into()
}

impl Default for IbmSection {
    fn default() -> Self {
        Self {
            name: default_ibm(),
            params: IndexMap::new(),
        }
    }
}

/// A run file together with the directory its paths are relative to.
#[derive(Debug, Clone)]
pub struct LoadedRun {
    /// The parsed document.
    pub file: RunFile,
    base: PathBuf,
}

impl LoadedRun {
    /// Read and parse a run file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read run file {}", path.display()))?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&text, base).with_context(|| format!("in run file {}", path.display()))
    }

    /// Parse a run file whose relative paths start at `base`.
    pub fn parse(text: &str, base: PathBuf) -> Result<Self> {
        let file: RunFile = serde_json::from_str(text).context("invalid run file")?;
        Ok(Self { file, base })
    }

    /// `path` resolved against the run file's directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }

    /// The grid file.
    pub fn grid_path(&self) -> PathBuf {
        self.resolve(&self.file.grid)
    }

    /// The output file, if any.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.file.output.file.as_deref().map(|p| self.resolve(p))
    }

    /// The behavior module configuration.
    pub fn ibm_config(&self) -> IbmConfig {
        let ibm = &self.file.ibm;
        ibm.params
            .iter()
            .fold(IbmConfig::new(ibm.name.clone()), |config, (key, &value)| {
                config.with_param(key.clone(), value)
            })
    }

    /// Build the model configuration. Values are not validated here.
    pub fn model_config(&self) -> Result<ModelConfig> {
        let f = &self.file;
        let time = |what: &str, text: &str| {
            parse_timestamp(text).ok_or_else(|| anyhow!("{what} '{text}' is not a timestamp"))
        };
        let mut config = ModelConfig::new(time("start", &f.start)?, time("stop", &f.stop)?, f.dt);
        if let Some(period) = f.output_period {
            config.output_period_seconds = period;
        }
        config.forcing_sources = f.forcing.iter().map(|p| self.resolve(p)).collect();
        config.forcing_fields = f.forcing_fields.clone();
        config.scheme = f.scheme.parse::<Scheme>()?;
        config.diffusivity = f.diffusivity;
        config.seed = f.seed;

        if let Some(release) = &f.release {
            config.release_file = Some(self.resolve(&release.file));
            if let Some(format) = &release.format {
                config.release_format = format.clone();
            }
            if let Some(frequency_seconds) = release.frequency {
                config.release_mode = ReleaseMode::Continuous { frequency_seconds };
            }
        }
        config.instance_variables = f.output.instance_variables.clone();
        config.particle_variables = f.output.particle_variables.clone();
        config.warm_start = f.warm_start.as_ref().map(|w| WarmStartConfig {
            source: self.resolve(&w.file),
            variables: w.variables.clone(),
        });
        Ok(config)
    }
}
