use super::{print_notices, read_scheme, write_scheme};
use crate::cli::DiscreteArgs;
use crate::config;
use crate::error::Result;
use qspace::engine::config::QspaceConfig;
use qspace::engine::progress::ProgressReporter;
use qspace::workflows::polarity;

pub fn run(args: DiscreteArgs, file: &QspaceConfig, reporter: &ProgressReporter) -> Result<()> {
    let discrete = config::discrete_config(file, &args)?;
    let scheme = read_scheme(&args.input)?;

    println!("Optimizing polarity of {} direction(s)...", scheme.num_directions());
    let result = polarity::run(&scheme, &discrete, reporter)?;
    write_scheme(&result.scheme, &args.output)?;

    print_notices(&result.notices);
    println!(
        "✓ Flipped {} direction(s) with the {} solver ({}); polar energy {:.6} -> {:.6}.",
        result.flips.iter().filter(|&&f| f).count(),
        result.solver,
        result.status,
        result.initial_energy,
        result.energy
    );
    Ok(())
}
