use super::{read_scheme, write_scheme};
use crate::cli::GenerateArgs;
use crate::config;
use crate::error::Result;
use qspace::engine::config::QspaceConfig;
use qspace::engine::progress::ProgressReporter;
use qspace::workflows::generate;
use qspace::{ConvergenceStatus, GenerationResult};
use tracing::info;

pub fn run(args: GenerateArgs, file: &QspaceConfig, reporter: &ProgressReporter) -> Result<()> {
    let result = match &args.refine {
        Some(path) => {
            let initial = read_scheme(path)?;
            let generation = config::generation_config(file, &args, initial.shell_counts())?;
            println!(
                "Refining {} direction(s) in {} shell(s)...",
                initial.num_directions(),
                initial.num_shells()
            );
            generate::refine(&initial, &generation, reporter)?
        }
        None => {
            let generation = config::generation_config(file, &args, args.counts.clone())?;
            println!(
                "Generating {} direction(s) in {} shell(s)...",
                args.counts.iter().sum::<usize>(),
                args.counts.len()
            );
            generate::run(&generation, reporter)?
        }
    };

    write_scheme(&result.scheme, &args.output)?;
    report(&result);
    info!("Generation output written to {:?}", &args.output);
    Ok(())
}

fn report(result: &GenerationResult) {
    match result.status {
        ConvergenceStatus::Converged => println!(
            "✓ Converged after {} iteration(s); energy {:.6}.",
            result.iterations,
            result.energy.total()
        ),
        ConvergenceStatus::NonConvergence(reason) => println!(
            "Warning: descent stopped ({reason:?}) after {} iteration(s); best energy {:.6}.",
            result.iterations,
            result.energy.total()
        ),
    }
}
