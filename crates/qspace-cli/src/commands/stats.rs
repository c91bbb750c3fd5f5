use super::read_scheme;
use crate::cli::StatsArgs;
use crate::error::Result;
use qspace::core::utils::statistics::{covering_radius, covering_radius_upper_bound, norm_of_mean};
use qspace::engine::config::QspaceConfig;
use qspace::{EnergyTerm, Scheme, SymmetryMode};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ShellStats {
    pub count: usize,
    pub strength: Option<f64>,
    /// Smallest antipodal pairwise angle in degrees.
    pub covering_radius_deg: Option<f64>,
    pub covering_bound_deg: f64,
    pub norm_of_mean: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemeStats {
    pub shells: Vec<ShellStats>,
    pub combined_covering_radius_deg: Option<f64>,
    pub energy: EnergyTerm,
}

impl SchemeStats {
    pub fn compute(scheme: &Scheme, file: &QspaceConfig) -> Self {
        let shells = scheme
            .shells()
            .iter()
            .map(|shell| ShellStats {
                count: shell.len(),
                strength: shell.strength(),
                covering_radius_deg: covering_radius(shell.directions(), true)
                    .map(f64::to_degrees),
                covering_bound_deg: covering_radius_upper_bound(shell.len()).to_degrees(),
                norm_of_mean: norm_of_mean(shell.directions()),
            })
            .collect();
        let model = file.energy_config().model();
        Self {
            shells,
            combined_covering_radius_deg: covering_radius(&scheme.directions(), true)
                .map(f64::to_degrees),
            energy: model.scheme_energy(scheme, SymmetryMode::Antipodal),
        }
    }
}

fn degrees(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}°"))
}

impl fmt::Display for SchemeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<6} {:>6} {:>10} {:>10} {:>10} {:>10}",
            "shell", "count", "strength", "radius", "bound", "|mean|"
        )?;
        for (s, shell) in self.shells.iter().enumerate() {
            writeln!(
                f,
                "{:<6} {:>6} {:>10} {:>10} {:>10} {:>10.4}",
                s,
                shell.count,
                shell.strength.map_or_else(|| "-".to_string(), |b| format!("{b}")),
                degrees(shell.covering_radius_deg),
                format!("{:.2}°", shell.covering_bound_deg),
                shell.norm_of_mean
            )?;
        }
        writeln!(
            f,
            "combined covering radius: {}",
            degrees(self.combined_covering_radius_deg)
        )?;
        write!(
            f,
            "energy: {:.6} (intra-shell {:.6}, cross-shell {:.6})",
            self.energy.total(),
            self.energy.intra_shell,
            self.energy.cross_shell
        )
    }
}

pub fn run(args: StatsArgs, file: &QspaceConfig) -> Result<()> {
    let scheme = read_scheme(&args.input)?;
    println!("{}", SchemeStats::compute(&scheme, file));
    Ok(())
}
