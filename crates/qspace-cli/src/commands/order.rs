use super::{print_notices, read_scheme, write_table};
use crate::cli::OrderArgs;
use crate::config;
use crate::error::Result;
use qspace::engine::config::QspaceConfig;
use qspace::engine::progress::ProgressReporter;
use qspace::workflows::ordering;

pub fn run(args: OrderArgs, file: &QspaceConfig, reporter: &ProgressReporter) -> Result<()> {
    let mut builder = config::discrete_builder(file, &args.common);
    if let Some(len) = args.segment {
        builder = builder.segment_len(len);
    }
    let discrete = builder.build()?;
    let scheme = read_scheme(&args.common.input)?;

    println!("Ordering {} direction(s)...", scheme.num_directions());
    let result = ordering::run(&scheme, &discrete, reporter)?;
    write_table(&result.acquisition_table(&scheme)?, &args.common.output)?;

    print_notices(&result.notices);
    println!(
        "✓ Ordered with the {} solver ({}); cumulative energy {:.6} (input order {:.6}).",
        result.solver, result.status, result.objective, result.identity_objective
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{DiscreteArgs, MethodArg};
    use crate::commands::write_scheme;
    use qspace::Scheme;
    use qspace::core::io::csv::CsvFile;
    use qspace::core::utils::geometry::fibonacci_sphere;
    use std::fs::File;
    use std::path::Path;

    fn heuristic_args(input: &Path, output: &Path) -> DiscreteArgs {
        DiscreteArgs {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            method: Some(MethodArg::Heuristic),
            time_limit: None,
            seed: None,
        }
    }

    #[test]
    fn output_rows_follow_the_acquisition_order_across_shells() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        let scheme = Scheme::from_groups(
            &[Some(1000.0), Some(2000.0)],
            vec![fibonacci_sphere(4, 0.0), fibonacci_sphere(4, 0.5)],
        )
        .unwrap();
        write_scheme(&scheme, &input).unwrap();
        let file = QspaceConfig::default();

        let args = OrderArgs {
            common: heuristic_args(&input, &output),
            segment: None,
        };
        run(args, &file, &ProgressReporter::new()).unwrap();

        let discrete = config::discrete_builder(&file, &heuristic_args(&input, &output))
            .build()
            .unwrap();
        let expected = ordering::run(&scheme, &discrete, &ProgressReporter::new()).unwrap();
        let rows = scheme.to_table().directions;
        let sequence: Vec<_> = expected.ordering.iter().map(|&i| rows[i]).collect();

        let written = CsvFile::read_table(File::open(&output).unwrap()).unwrap();
        assert_eq!(written.directions, sequence);
        assert_eq!(written.strength_of(0), Some(1000.0));
        assert_eq!(written.strength_of(1), Some(2000.0));
        assert_eq!(read_scheme(&output).unwrap(), expected.scheme);
    }
}
