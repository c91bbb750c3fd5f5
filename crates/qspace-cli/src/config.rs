use crate::cli::{DiscreteArgs, GenerateArgs};
use crate::error::Result;
use qspace::engine::config::{
    DescentConfig, DiscreteConfig, DiscreteConfigBuilder, GenerationConfig, QspaceConfig,
};
use std::path::Path;
use tracing::debug;

/// Reads the configuration file, or the all-defaults configuration when no
/// file was given.
pub fn load(path: Option<&Path>) -> Result<QspaceConfig> {
    match path {
        Some(path) => {
            debug!("Loading configuration from {:?}", path);
            Ok(QspaceConfig::from_file(path)?)
        }
        None => Ok(QspaceConfig::default()),
    }
}

/// File values overridden by `generate` flags.
pub fn generation_config(
    file: &QspaceConfig,
    args: &GenerateArgs,
    shell_counts: Vec<usize>,
) -> Result<GenerationConfig> {
    let mut builder = file
        .generation_builder()
        .shell_counts(shell_counts)
        .shell_strengths(args.strengths.clone())
        .seed(args.seed);
    if let Some(max_iterations) = args.max_iterations {
        builder = builder.descent(DescentConfig {
            max_iterations,
            ..file.descent_config()
        });
    }
    Ok(builder.build()?)
}

/// Builder for the discrete commands with the shared flags applied; callers
/// add command-specific settings before building.
pub fn discrete_builder(file: &QspaceConfig, args: &DiscreteArgs) -> DiscreteConfigBuilder {
    let mut builder = file.discrete_builder();
    if let Some(method) = args.method {
        builder = builder.method(method.into());
    }
    if let Some(secs) = args.time_limit {
        builder = builder.time_limit_secs(secs);
    }
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    builder
}

pub fn discrete_config(file: &QspaceConfig, args: &DiscreteArgs) -> Result<DiscreteConfig> {
    Ok(discrete_builder(file, args).build()?)
}
