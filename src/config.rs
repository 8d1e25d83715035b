//! Engine configuration (`spec.md` §6's configuration table).
//!
//! Split the way the teacher's `core_config` splits `ConfigFile` (what was
//! parsed, defaults tolerant of missing keys) from `Config` (what is in
//! effect). Here both halves carry the same fields since the engine has no
//! viewport-style runtime re-derivation step, but keeping the split makes a
//! future TOML-driven host able to reload just the file half.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Overflow policy selected once `N_max` clusters exist and a new one would
/// be needed (`spec.md` §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxClustStrategy {
    Stop,
    Discard,
    Merge,
}

impl Default for MaxClustStrategy {
    fn default() -> Self {
        MaxClustStrategy::Stop
    }
}

/// Radius source: either a fixed value or derived from the scanner's median
/// consecutive-frame distance (`spec.md` §4.7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadiusMode {
    Fixed(f64),
    AutoFactor(f64),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Attachment radius `R`. `None` means `auto_rlim_factor` must be set.
    pub rlim: Option<f64>,
    pub auto_rlim_factor: Option<f64>,

    /// Prior increment `Δp` applied on a successful attach.
    pub dprob: f64,
    /// `N_max`, the maximum number of clusters the store may hold.
    pub maxcl: usize,
    /// Cap on frames processed in one run.
    pub maxim: u64,

    pub gprob: bool,
    pub fmatch_a: f64,
    pub fmatch_b: f64,
    pub max_gprob_visitors: usize,

    pub te4: bool,
    pub te5: bool,

    /// `α` mixing coefficient between prior and transition-row score.
    pub tm_mix: f64,

    pub pred: bool,
    pub pred_len: usize,
    pub pred_h: usize,
    pub pred_n: usize,

    pub maxcl_strategy: MaxClustStrategy,
    pub discard_fraction: f64,

    /// When set, a probe-distance line is emitted for every measured
    /// distance (`spec.md` §6, `distall`).
    pub distall: bool,

    /// Run the scanner only, then stop (`spec.md` §4.7, §6 `scandist`).
    pub scandist: bool,
    /// Cap on the number of intervals the scanner measures.
    pub maxnbfr: u64,

    /// Worker threads for the vectorizable inner loops. `0` means "let
    /// rayon pick", mirroring `std::thread::available_parallelism()`.
    pub ncpu: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rlim: None,
            auto_rlim_factor: None,
            dprob: 0.01,
            maxcl: 1000,
            maxim: 100_000,
            gprob: false,
            fmatch_a: 2.0,
            fmatch_b: 0.5,
            max_gprob_visitors: 1000,
            te4: false,
            te5: false,
            tm_mix: 0.0,
            pred: false,
            pred_len: 3,
            pred_h: 200,
            pred_n: 3,
            maxcl_strategy: MaxClustStrategy::Stop,
            discard_fraction: 0.1,
            distall: false,
            scandist: false,
            maxnbfr: 100_000,
            ncpu: 0,
        }
    }
}

impl EngineConfig {
    /// Resolve the effective radius mode. Fails validation upstream
    /// (`validate`) if neither `rlim` nor `auto_rlim_factor` is set.
    pub fn radius_mode(&self) -> Option<RadiusMode> {
        if let Some(factor) = self.auto_rlim_factor {
            Some(RadiusMode::AutoFactor(factor))
        } else {
            self.rlim.map(RadiusMode::Fixed)
        }
    }

    /// Number of rayon workers to request; `0` defers to
    /// `available_parallelism()`.
    pub fn worker_threads(&self) -> usize {
        if self.ncpu > 0 {
            self.ncpu
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    /// Parse a TOML document overlaying the defaults above. Unknown fields
    /// are ignored for forward compatibility, mirroring the teacher's
    /// tolerance in `core_config::ConfigFile`.
    pub fn from_toml(src: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(src)
    }

    /// Load and parse a TOML config file from disk, mirroring the
    /// teacher's `core_config::load_from`: a missing file is not an
    /// error, it just yields the defaults, since a host embedding this
    /// engine may not ship a config file at all.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml(&src).with_context(|| format!("parsing config file {}", path.display()))
    }
}
