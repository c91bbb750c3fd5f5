use crate::core::energy::model::{
    DEFAULT_EXPONENT, DEFAULT_SHELL_WEIGHT, EnergyModel, SymmetryMode,
};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },

    #[error("Failed to read configuration file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

fn invalid(parameter: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        parameter,
        reason: reason.into(),
    }
}

/// Strategy requested for a discrete problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverMethod {
    /// Exact when the problem is small enough and a backend is compiled in,
    /// heuristic otherwise.
    #[default]
    Auto,
    Exact,
    Heuristic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyConfig {
    pub exponent: f64,
    pub shell_weight: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            exponent: DEFAULT_EXPONENT,
            shell_weight: DEFAULT_SHELL_WEIGHT,
        }
    }
}

impl EnergyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.exponent.is_finite() || self.exponent <= 0.0 {
            return Err(invalid("exponent", "must be finite and positive"));
        }
        if !(0.0..=1.0).contains(&self.shell_weight) {
            return Err(invalid("shell_weight", "must lie in [0, 1]"));
        }
        Ok(())
    }

    pub fn model(&self) -> EnergyModel {
        EnergyModel::new(self.exponent, self.shell_weight)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceConfig {
    pub energy_threshold: f64,
    pub patience_iterations: usize,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            energy_threshold: 1e-9,
            patience_iterations: 20,
        }
    }
}

impl ConvergenceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.energy_threshold.is_finite() || self.energy_threshold < 0.0 {
            return Err(invalid("energy_threshold", "must be finite and non-negative"));
        }
        if self.patience_iterations == 0 {
            return Err(invalid("patience_iterations", "must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescentConfig {
    pub max_iterations: usize,
    /// Largest displacement of any point in the first step, in chord units.
    pub initial_step: f64,
    /// Step size below which the descent is considered collapsed.
    pub min_step: f64,
    pub time_limit_secs: Option<f64>,
    pub convergence: ConvergenceConfig,
}

impl Default for DescentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            initial_step: 0.1,
            min_step: 1e-10,
            time_limit_secs: None,
            convergence: ConvergenceConfig::default(),
        }
    }
}

impl DescentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be at least 1"));
        }
        if !self.initial_step.is_finite() || self.initial_step <= 0.0 {
            return Err(invalid("initial_step", "must be finite and positive"));
        }
        if !self.min_step.is_finite() || self.min_step <= 0.0 || self.min_step > self.initial_step
        {
            return Err(invalid("min_step", "must be positive and not exceed initial_step"));
        }
        validate_time_limit("time_limit_secs", self.time_limit_secs)?;
        self.convergence.validate()
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs.map(Duration::from_secs_f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealingConfig {
    /// Start temperature, relative to the mean pair energy of the problem.
    pub initial_temperature: f64,
    /// Stop temperature, on the same relative scale.
    pub final_temperature: f64,
    pub cooling_rate: f64,
    pub steps_per_temperature: usize,
    pub restarts: usize,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 1.0,
            final_temperature: 1e-3,
            cooling_rate: 0.9,
            steps_per_temperature: 100,
            restarts: 3,
        }
    }
}

impl AnnealingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_temperature.is_finite() || self.initial_temperature <= 0.0 {
            return Err(invalid("initial_temperature", "must be finite and positive"));
        }
        if !self.final_temperature.is_finite()
            || self.final_temperature <= 0.0
            || self.final_temperature > self.initial_temperature
        {
            return Err(invalid(
                "final_temperature",
                "must be positive and not exceed initial_temperature",
            ));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(invalid("cooling_rate", "must lie strictly between 0 and 1"));
        }
        if self.steps_per_temperature == 0 {
            return Err(invalid("steps_per_temperature", "must be at least 1"));
        }
        if self.restarts == 0 {
            return Err(invalid("restarts", "must be at least 1"));
        }
        Ok(())
    }
}

fn validate_time_limit(parameter: &'static str, limit: Option<f64>) -> Result<(), ConfigError> {
    match limit {
        Some(secs) if !secs.is_finite() || secs <= 0.0 => {
            Err(invalid(parameter, "must be finite and positive"))
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub shell_counts: Vec<usize>,
    pub shell_strengths: Option<Vec<f64>>,
    pub seed: Option<u64>,
    pub symmetry: SymmetryMode,
    pub energy: EnergyConfig,
    pub descent: DescentConfig,
}

#[derive(Default, Clone)]
pub struct GenerationConfigBuilder {
    shell_counts: Option<Vec<usize>>,
    shell_strengths: Option<Vec<f64>>,
    seed: Option<u64>,
    symmetry: Option<SymmetryMode>,
    energy: Option<EnergyConfig>,
    descent: Option<DescentConfig>,
}

impl GenerationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shell_counts(mut self, counts: Vec<usize>) -> Self {
        self.shell_counts = Some(counts);
        self
    }
    pub fn shell_strengths(mut self, strengths: Option<Vec<f64>>) -> Self {
        self.shell_strengths = strengths;
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
    pub fn symmetry(mut self, mode: SymmetryMode) -> Self {
        self.symmetry = Some(mode);
        self
    }
    pub fn energy(mut self, energy: EnergyConfig) -> Self {
        self.energy = Some(energy);
        self
    }
    pub fn descent(mut self, descent: DescentConfig) -> Self {
        self.descent = Some(descent);
        self
    }

    /// Validates tunables and fills unset ones with their defaults.
    ///
    /// Shell counts and strengths are validated by the generation workflow,
    /// which reports them as an invalid shell specification.
    pub fn build(self) -> Result<GenerationConfig, ConfigError> {
        let config = GenerationConfig {
            shell_counts: self
                .shell_counts
                .ok_or(ConfigError::MissingParameter("shell_counts"))?,
            shell_strengths: self.shell_strengths,
            seed: self.seed,
            symmetry: self.symmetry.unwrap_or_default(),
            energy: self.energy.unwrap_or_default(),
            descent: self.descent.unwrap_or_default(),
        };
        config.energy.validate()?;
        config.descent.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteConfig {
    pub method: SolverMethod,
    pub time_limit_secs: Option<f64>,
    /// Largest number of binary decision variables `Auto` hands to the exact
    /// solver.
    pub exact_size_limit: usize,
    /// Wall-clock budget of the exact solver when `Auto` selects it and no
    /// explicit time limit is set.
    pub auto_exact_time_limit_secs: f64,
    pub symmetry: SymmetryMode,
    /// Ordering only: number of positions the exact solver fixes per round.
    pub segment_len: Option<usize>,
    pub seed: u64,
    pub energy: EnergyConfig,
    pub annealing: AnnealingConfig,
}

/// Branch-and-bound cost grows steeply with the binary count: around 16
/// binaries a polarity or subsampling model still solves well under a second.
pub const DEFAULT_EXACT_SIZE_LIMIT: usize = 16;

pub const DEFAULT_AUTO_EXACT_TIME_LIMIT_SECS: f64 = 10.0;

impl Default for DiscreteConfig {
    fn default() -> Self {
        Self {
            method: SolverMethod::Auto,
            time_limit_secs: None,
            exact_size_limit: DEFAULT_EXACT_SIZE_LIMIT,
            auto_exact_time_limit_secs: DEFAULT_AUTO_EXACT_TIME_LIMIT_SECS,
            symmetry: SymmetryMode::Antipodal,
            segment_len: None,
            seed: 0,
            energy: EnergyConfig::default(),
            annealing: AnnealingConfig::default(),
        }
    }
}

impl DiscreteConfig {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs.map(Duration::from_secs_f64)
    }

    /// Time limit handed to a solver that proves optimality. `Auto` never
    /// runs one unbounded.
    pub fn exact_time_limit(&self) -> Option<Duration> {
        match (self.time_limit(), self.method) {
            (Some(limit), _) => Some(limit),
            (None, SolverMethod::Auto) => {
                Some(Duration::from_secs_f64(self.auto_exact_time_limit_secs))
            }
            (None, _) => None,
        }
    }
}

#[derive(Default, Clone)]
pub struct DiscreteConfigBuilder {
    method: Option<SolverMethod>,
    time_limit_secs: Option<f64>,
    exact_size_limit: Option<usize>,
    auto_exact_time_limit_secs: Option<f64>,
    symmetry: Option<SymmetryMode>,
    segment_len: Option<usize>,
    seed: Option<u64>,
    energy: Option<EnergyConfig>,
    annealing: Option<AnnealingConfig>,
}

impl DiscreteConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: SolverMethod) -> Self {
        self.method = Some(method);
        self
    }
    pub fn time_limit(mut self, limit: Option<Duration>) -> Self {
        if let Some(limit) = limit {
            self.time_limit_secs = Some(limit.as_secs_f64());
        }
        self
    }
    pub fn time_limit_secs(mut self, secs: f64) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }
    pub fn exact_size_limit(mut self, limit: usize) -> Self {
        self.exact_size_limit = Some(limit);
        self
    }
    pub fn auto_exact_time_limit_secs(mut self, secs: f64) -> Self {
        self.auto_exact_time_limit_secs = Some(secs);
        self
    }
    pub fn symmetry(mut self, mode: SymmetryMode) -> Self {
        self.symmetry = Some(mode);
        self
    }
    pub fn segment_len(mut self, len: usize) -> Self {
        self.segment_len = Some(len);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn energy(mut self, energy: EnergyConfig) -> Self {
        self.energy = Some(energy);
        self
    }
    pub fn annealing(mut self, annealing: AnnealingConfig) -> Self {
        self.annealing = Some(annealing);
        self
    }

    pub fn build(self) -> Result<DiscreteConfig, ConfigError> {
        let defaults = DiscreteConfig::default();
        let config = DiscreteConfig {
            method: self.method.unwrap_or(defaults.method),
            time_limit_secs: self.time_limit_secs,
            exact_size_limit: self.exact_size_limit.unwrap_or(defaults.exact_size_limit),
            auto_exact_time_limit_secs: self
                .auto_exact_time_limit_secs
                .unwrap_or(defaults.auto_exact_time_limit_secs),
            symmetry: self.symmetry.unwrap_or(defaults.symmetry),
            segment_len: self.segment_len,
            seed: self.seed.unwrap_or(defaults.seed),
            energy: self.energy.unwrap_or(defaults.energy),
            annealing: self.annealing.unwrap_or(defaults.annealing),
        };
        validate_time_limit("time_limit_secs", config.time_limit_secs)?;
        validate_time_limit(
            "auto_exact_time_limit_secs",
            Some(config.auto_exact_time_limit_secs),
        )?;
        if config.segment_len == Some(0) {
            return Err(invalid("segment_len", "must be at least 1"));
        }
        config.energy.validate()?;
        config.annealing.validate()?;
        Ok(config)
    }
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct PartialEnergyConfig {
    exponent: Option<f64>,
    #[serde(rename = "shell-weight")]
    shell_weight: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct PartialConvergenceConfig {
    #[serde(rename = "energy-threshold")]
    energy_threshold: Option<f64>,
    #[serde(rename = "patience-iterations")]
    patience_iterations: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct PartialDescentConfig {
    #[serde(rename = "max-iterations")]
    max_iterations: Option<usize>,
    #[serde(rename = "initial-step")]
    initial_step: Option<f64>,
    #[serde(rename = "min-step")]
    min_step: Option<f64>,
    #[serde(rename = "time-limit-secs")]
    time_limit_secs: Option<f64>,
    convergence: Option<PartialConvergenceConfig>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct PartialAnnealingConfig {
    #[serde(rename = "initial-temperature")]
    initial_temperature: Option<f64>,
    #[serde(rename = "final-temperature")]
    final_temperature: Option<f64>,
    #[serde(rename = "cooling-rate")]
    cooling_rate: Option<f64>,
    #[serde(rename = "steps-per-temperature")]
    steps_per_temperature: Option<usize>,
    restarts: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct PartialSolverConfig {
    method: Option<SolverMethod>,
    #[serde(rename = "time-limit-secs")]
    time_limit_secs: Option<f64>,
    #[serde(rename = "exact-size-limit")]
    exact_size_limit: Option<usize>,
    #[serde(rename = "auto-exact-time-limit-secs")]
    auto_exact_time_limit_secs: Option<f64>,
    #[serde(rename = "segment-len")]
    segment_len: Option<usize>,
    seed: Option<u64>,
}

/// File-level configuration. Every key is optional; unset keys fall back to
/// the defaults of the corresponding config struct.
///
/// ```toml
/// symmetry = "antipodal"
///
/// [energy]
/// exponent = 2.0
/// shell-weight = 0.5
///
/// [descent]
/// max-iterations = 2000
///
/// [descent.convergence]
/// energy-threshold = 1e-9
/// patience-iterations = 20
///
/// [annealing]
/// cooling-rate = 0.9
///
/// [solver]
/// method = "auto"
/// time-limit-secs = 30.0
/// ```
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QspaceConfig {
    symmetry: Option<SymmetryMode>,
    energy: Option<PartialEnergyConfig>,
    descent: Option<PartialDescentConfig>,
    annealing: Option<PartialAnnealingConfig>,
    solver: Option<PartialSolverConfig>,
}

impl QspaceConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.energy_config().validate()?;
        config.descent_config().validate()?;
        config.annealing_config().validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn energy_config(&self) -> EnergyConfig {
        let defaults = EnergyConfig::default();
        let file = self.energy.clone().unwrap_or_default();
        EnergyConfig {
            exponent: file.exponent.unwrap_or(defaults.exponent),
            shell_weight: file.shell_weight.unwrap_or(defaults.shell_weight),
        }
    }

    pub fn descent_config(&self) -> DescentConfig {
        let defaults = DescentConfig::default();
        let file = self.descent.clone().unwrap_or_default();
        let convergence = file.convergence.unwrap_or_default();
        DescentConfig {
            max_iterations: file.max_iterations.unwrap_or(defaults.max_iterations),
            initial_step: file.initial_step.unwrap_or(defaults.initial_step),
            min_step: file.min_step.unwrap_or(defaults.min_step),
            time_limit_secs: file.time_limit_secs.or(defaults.time_limit_secs),
            convergence: ConvergenceConfig {
                energy_threshold: convergence
                    .energy_threshold
                    .unwrap_or(defaults.convergence.energy_threshold),
                patience_iterations: convergence
                    .patience_iterations
                    .unwrap_or(defaults.convergence.patience_iterations),
            },
        }
    }

    pub fn annealing_config(&self) -> AnnealingConfig {
        let defaults = AnnealingConfig::default();
        let file = self.annealing.clone().unwrap_or_default();
        AnnealingConfig {
            initial_temperature: file
                .initial_temperature
                .unwrap_or(defaults.initial_temperature),
            final_temperature: file.final_temperature.unwrap_or(defaults.final_temperature),
            cooling_rate: file.cooling_rate.unwrap_or(defaults.cooling_rate),
            steps_per_temperature: file
                .steps_per_temperature
                .unwrap_or(defaults.steps_per_temperature),
            restarts: file.restarts.unwrap_or(defaults.restarts),
        }
    }

    /// A generation builder pre-filled from the file; callers set the shell
    /// counts and may override anything else.
    pub fn generation_builder(&self) -> GenerationConfigBuilder {
        let mut builder = GenerationConfigBuilder::new()
            .energy(self.energy_config())
            .descent(self.descent_config());
        if let Some(mode) = self.symmetry {
            builder = builder.symmetry(mode);
        }
        builder
    }

    pub fn discrete_builder(&self) -> DiscreteConfigBuilder {
        let mut builder = DiscreteConfigBuilder::new()
            .energy(self.energy_config())
            .annealing(self.annealing_config());
        if let Some(mode) = self.symmetry {
            builder = builder.symmetry(mode);
        }
        let solver = self.solver.clone().unwrap_or_default();
        if let Some(method) = solver.method {
            builder = builder.method(method);
        }
        if let Some(secs) = solver.time_limit_secs {
            builder = builder.time_limit_secs(secs);
        }
        if let Some(limit) = solver.exact_size_limit {
            builder = builder.exact_size_limit(limit);
        }
        if let Some(secs) = solver.auto_exact_time_limit_secs {
            builder = builder.auto_exact_time_limit_secs(secs);
        }
        if let Some(len) = solver.segment_len {
            builder = builder.segment_len(len);
        }
        if let Some(seed) = solver.seed {
            builder = builder.seed(seed);
        }
        builder
    }
}
