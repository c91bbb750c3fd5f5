use super::{print_notices, read_scheme, write_scheme};
use crate::cli::PartitionArgs;
use crate::config;
use crate::error::Result;
use qspace::engine::config::QspaceConfig;
use qspace::engine::progress::ProgressReporter;
use qspace::workflows::subsample;

pub fn run(args: PartitionArgs, file: &QspaceConfig, reporter: &ProgressReporter) -> Result<()> {
    let discrete = config::discrete_config(file, &args.common)?;
    let scheme = read_scheme(&args.common.input)?;

    println!(
        "Splitting shell {} into {} group(s)...",
        args.shell,
        args.sizes.len()
    );
    let result = subsample::run_partition(
        &scheme,
        args.shell,
        &args.sizes,
        args.strengths.as_deref(),
        &discrete,
        reporter,
    )?;
    write_scheme(&result.scheme, &args.common.output)?;

    print_notices(&result.notices);
    println!(
        "✓ Partitioned with the {} solver ({}); energy {:.6}.",
        result.solver, result.status, result.energy
    );
    Ok(())
}
