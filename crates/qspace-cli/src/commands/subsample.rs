use super::{print_notices, read_scheme, write_scheme};
use crate::cli::SubsampleArgs;
use crate::config;
use crate::error::Result;
use qspace::engine::config::QspaceConfig;
use qspace::engine::progress::ProgressReporter;
use qspace::workflows::subsample;

pub fn run(args: SubsampleArgs, file: &QspaceConfig, reporter: &ProgressReporter) -> Result<()> {
    let discrete = config::discrete_config(file, &args.common)?;
    let scheme = read_scheme(&args.common.input)?;

    println!(
        "Keeping {} of {} direction(s)...",
        args.sizes.iter().sum::<usize>(),
        scheme.num_directions()
    );
    let result = subsample::run(&scheme, &args.sizes, &discrete, reporter)?;
    write_scheme(&result.scheme, &args.common.output)?;

    print_notices(&result.notices);
    println!(
        "✓ Subsampled with the {} solver ({}); energy {:.6}.",
        result.solver, result.status, result.energy
    );
    Ok(())
}
