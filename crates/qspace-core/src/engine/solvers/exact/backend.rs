use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BackendError {
    #[error("MILP backend failed: {0}")]
    Solver(String),

    #[error("MILP backend returned {actual} values for {expected} variables")]
    MalformedSolution { expected: usize, actual: usize },

    #[error("MILP backend reached its time limit before finding a feasible solution")]
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableSpec {
    pub lower: f64,
    pub upper: f64,
    pub integer: bool,
}

impl VariableSpec {
    pub const BINARY: Self = Self {
        lower: 0.0,
        upper: 1.0,
        integer: true,
    };

    pub const UNIT: Self = Self {
        lower: 0.0,
        upper: 1.0,
        integer: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    LessEq,
    GreaterEq,
    Equal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub terms: Vec<(usize, f64)>,
    pub relation: Relation,
    pub rhs: f64,
}

/// A mixed-integer linear minimization problem as plain data.
///
/// Variables are addressed by their index in `variables`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MilpModel {
    pub variables: Vec<VariableSpec>,
    pub constraints: Vec<LinearConstraint>,
    pub objective: Vec<(usize, f64)>,
    pub objective_constant: f64,
}

impl MilpModel {
    pub fn add_variable(&mut self, spec: VariableSpec) -> usize {
        self.variables.push(spec);
        self.variables.len() - 1
    }

    pub fn add_constraint(&mut self, terms: Vec<(usize, f64)>, relation: Relation, rhs: f64) {
        self.constraints.push(LinearConstraint {
            terms,
            relation,
            rhs,
        });
    }

    pub fn add_objective_term(&mut self, variable: usize, coefficient: f64) {
        if coefficient != 0.0 {
            self.objective.push((variable, coefficient));
        }
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.integer).count()
    }

    /// Raises every continuous variable that heads a `>=` row to the least
    /// value the row allows, given the other values.
    ///
    /// With the binaries set, this completes the auxiliaries of the
    /// linearized products to a feasible point whose objective is the true
    /// one.
    pub fn complete_auxiliaries(&self, values: &mut [f64]) {
        for c in &self.constraints {
            let Some(&(aux, coefficient)) = c.terms.first() else {
                continue;
            };
            if coefficient != 1.0
                || self.variables[aux].integer
                || c.relation != Relation::GreaterEq
            {
                continue;
            }
            let rest: f64 = c.terms[1..].iter().map(|&(v, w)| w * values[v]).sum();
            values[aux] = values[aux].max(c.rhs - rest);
        }
    }

    /// Objective value of an assignment of all variables.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective_constant
            + self
                .objective
                .iter()
                .map(|&(i, c)| c * values[i])
                .sum::<f64>()
    }
}

/// Per-call limits and hints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MilpOptions {
    /// Wall-clock budget of the whole search. The backend stops by itself
    /// and returns its incumbent.
    pub time_limit: Option<Duration>,
    /// A feasible value for every variable to start the search from.
    pub warm_start: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MilpSolution {
    /// One value per model variable.
    pub values: Vec<f64>,
    /// `false` when the search stopped early with an unproven incumbent.
    pub proven_optimal: bool,
}

/// A general-purpose MILP solver.
///
/// `solve` runs on the calling thread and must return once
/// `options.time_limit` has elapsed.
pub trait MilpBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, model: &MilpModel, options: &MilpOptions) -> Result<MilpSolution, BackendError>;
}

/// The backend compiled into this build, if any.
pub fn default_backend() -> Option<Arc<dyn MilpBackend>> {
    #[cfg(feature = "milp")]
    {
        Some(Arc::new(GoodLpBackend))
    }
    #[cfg(not(feature = "milp"))]
    {
        None
    }
}

/// `good_lp` with the pure-Rust `microlp` solver.
#[cfg(feature = "milp")]
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpBackend;

#[cfg(feature = "milp")]
impl MilpBackend for GoodLpBackend {
    fn name(&self) -> &'static str {
        "good_lp/microlp"
    }

    fn solve(&self, model: &MilpModel, options: &MilpOptions) -> Result<MilpSolution, BackendError> {
        use good_lp::{
            Expression, ProblemVariables, ResolutionError, Solution, SolutionStatus, SolverModel,
            Variable, WithInitialSolution, WithTimeLimit, constraint, microlp, variable,
        };

        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = model
            .variables
            .iter()
            .map(|spec| {
                let definition = variable().min(spec.lower).max(spec.upper);
                if spec.integer {
                    vars.add(definition.integer())
                } else {
                    vars.add(definition)
                }
            })
            .collect();

        let linear = |terms: &[(usize, f64)]| -> Expression {
            let mut expression = Expression::with_capacity(terms.len());
            for &(i, coefficient) in terms {
                expression += coefficient * handles[i];
            }
            expression
        };

        let mut problem = vars
            .minimise(linear(&model.objective))
            .using(microlp);
        if let Some(limit) = options.time_limit {
            problem = problem.with_time_limit(limit.as_secs_f64());
        }
        if let Some(start) = &options.warm_start {
            problem = problem.with_initial_solution(handles.iter().copied().zip(start.iter().copied()));
        }
        for c in &model.constraints {
            let lhs = linear(&c.terms);
            problem = problem.with(match c.relation {
                Relation::LessEq => constraint::leq(lhs, c.rhs),
                Relation::GreaterEq => constraint::geq(lhs, c.rhs),
                Relation::Equal => constraint::eq(lhs, c.rhs),
            });
        }

        let solution = match problem.solve() {
            Ok(solution) => solution,
            // microlp's only `Other` outcome: interrupted with no incumbent.
            Err(ResolutionError::Other(_)) if options.time_limit.is_some() => {
                return Err(BackendError::Interrupted);
            }
            Err(e) => return Err(BackendError::Solver(e.to_string())),
        };
        Ok(MilpSolution {
            values: handles.iter().map(|&h| solution.value(h)).collect(),
            proven_optimal: matches!(solution.status(), SolutionStatus::Optimal),
        })
    }
}
