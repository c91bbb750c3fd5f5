use super::{DiscreteSolver, SolveContext};
use crate::engine::budget::{Budget, BudgetTracker};
use crate::engine::error::EngineError;
use crate::engine::problems::{AssignmentProblem, OrderingProblem, PolarityProblem};
use crate::engine::progress::Progress;
use crate::engine::state::{SolveOutcome, SolveStatus};
use crate::engine::utils::sampling::{geometric_schedule, metropolis_accept};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument, trace};

/// Attempts made to draw a valid random move before giving up on a step.
const MAX_PROPOSAL_ATTEMPTS: usize = 32;

/// Relative slack below which a polish move does not count as an improvement.
const POLISH_TOLERANCE: f64 = 1e-12;

/// Simulated annealing with greedy construction, random restarts and a final
/// greedy polish.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSolver;

impl DiscreteSolver for HeuristicSolver {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    #[instrument(skip_all, name = "heuristic_polarity", fields(n = problem.len()))]
    fn solve_polarity(
        &self,
        problem: &PolarityProblem,
        context: &SolveContext,
    ) -> Result<SolveOutcome<Vec<bool>>, EngineError> {
        Ok(anneal(&PolaritySearch(problem), context))
    }

    #[instrument(skip_all, name = "heuristic_ordering", fields(n = problem.len()))]
    fn solve_ordering(
        &self,
        problem: &OrderingProblem,
        context: &SolveContext,
    ) -> Result<SolveOutcome<Vec<usize>>, EngineError> {
        Ok(anneal(&OrderingSearch(problem), context))
    }

    #[instrument(skip_all, name = "heuristic_assignment", fields(n = problem.len()))]
    fn solve_assignment(
        &self,
        problem: &AssignmentProblem,
        context: &SolveContext,
    ) -> Result<SolveOutcome<Vec<Option<usize>>>, EngineError> {
        Ok(anneal(&AssignmentSearch(problem), context))
    }
}

/// A problem seen as a state space with local moves.
trait LocalSearch {
    type State: Clone;
    type Move: Copy;

    fn greedy(&self) -> Self::State;
    fn random(&self, rng: &mut StdRng) -> Self::State;
    fn objective(&self, state: &Self::State) -> f64;
    fn propose(&self, state: &Self::State, rng: &mut StdRng) -> Option<Self::Move>;
    fn delta(&self, state: &Self::State, mv: Self::Move) -> f64;
    fn apply(&self, state: &mut Self::State, mv: Self::Move);
    /// Every move available from `state`, in a fixed order.
    fn neighborhood(&self, state: &Self::State) -> Vec<Self::Move>;
    /// Whether `mv` is still legal after earlier moves changed `state`.
    fn is_valid(&self, _state: &Self::State, _mv: Self::Move) -> bool {
        true
    }
    /// Typical size of one pair term, used to scale temperatures.
    fn energy_scale(&self) -> f64;
}

fn anneal<S: LocalSearch>(search: &S, context: &SolveContext) -> SolveOutcome<S::State> {
    let config = context.annealing;
    let mut rng = StdRng::seed_from_u64(context.seed);
    let tracker = BudgetTracker::start(Budget {
        time_limit: context.time_limit,
        ..Budget::default()
    });

    let scale = search.energy_scale().max(f64::MIN_POSITIVE);
    let mut moves: u64 = 0;
    let mut best: Option<(S::State, f64)> = None;

    context.reporter.report(Progress::TaskStart {
        total_steps: config.restarts as u64,
    });

    for restart in 0..config.restarts {
        if restart > 0 && tracker.is_time_exhausted() {
            debug!(restart, "Time budget exhausted; skipping remaining restarts.");
            break;
        }

        let mut state = if restart == 0 {
            search.greedy()
        } else {
            search.random(&mut rng)
        };
        let mut energy = search.objective(&state);
        let mut restart_best = (state.clone(), energy);

        for temperature in geometric_schedule(
            config.initial_temperature * scale,
            config.final_temperature * scale,
            config.cooling_rate,
        ) {
            if tracker.is_time_exhausted() {
                break;
            }
            for _ in 0..config.steps_per_temperature {
                let Some(mv) = search.propose(&state, &mut rng) else {
                    break;
                };
                moves += 1;
                let delta = search.delta(&state, mv);
                if metropolis_accept(delta, temperature, &mut rng) {
                    search.apply(&mut state, mv);
                    energy += delta;
                    if energy < restart_best.1 {
                        restart_best = (state.clone(), energy);
                    }
                }
            }
            trace!(temperature, energy, "Finished temperature level.");
        }

        let (mut polished, _) = restart_best;
        moves += polish(search, &mut polished);
        let polished_energy = search.objective(&polished);
        debug!(restart, objective = polished_energy, "Restart finished.");

        if best.as_ref().is_none_or(|(_, e)| polished_energy < *e) {
            best = Some((polished, polished_energy));
        }
        context.reporter.report(Progress::TaskIncrement);
    }
    context.reporter.report(Progress::TaskFinish);

    let (solution, objective) = best.unwrap_or_else(|| {
        let state = search.greedy();
        let energy = search.objective(&state);
        (state, energy)
    });

    SolveOutcome {
        solution,
        objective,
        status: SolveStatus::BestEffort,
        moves,
        elapsed: tracker.elapsed(),
    }
}

/// First-improvement descent over the full neighborhood; only strictly
/// improving moves are taken. Returns the number of moves evaluated.
fn polish<S: LocalSearch>(search: &S, state: &mut S::State) -> u64 {
    let mut evaluated = 0;
    loop {
        let threshold = POLISH_TOLERANCE * search.objective(state).abs().max(1.0);
        let mut improved = false;
        for mv in search.neighborhood(state) {
            if !search.is_valid(state, mv) {
                continue;
            }
            evaluated += 1;
            if search.delta(state, mv) < -threshold {
                search.apply(state, mv);
                improved = true;
            }
        }
        if !improved {
            return evaluated;
        }
    }
}

/// Sequential sign assignment: each point takes the sign that adds less
/// energy against the points already placed.
pub(crate) fn greedy_signs(problem: &PolarityProblem) -> Vec<bool> {
    let n = problem.len();
    let mut flips = vec![false; n];
    for i in 1..n {
        let (keep, flip) = (0..i).fold((0.0, 0.0), |(keep, flip), j| {
            let (same, opposite) = (problem.same_sign(i, j), problem.opposite_sign(i, j));
            if flips[j] {
                (keep + opposite, flip + same)
            } else {
                (keep + same, flip + opposite)
            }
        });
        flips[i] = flip < keep;
    }
    flips
}

/// Greedy ordering that extends `prefix`: each next position takes the
/// remaining point with the least energy against the points already placed,
/// lowest index first on ties.
pub(crate) fn greedy_ordering(problem: &OrderingProblem, prefix: &[usize]) -> Vec<usize> {
    let n = problem.len();
    let mut ordering = prefix.to_vec();
    let mut placed = vec![false; n];
    for &i in prefix {
        placed[i] = true;
    }
    while ordering.len() < n {
        let next = (0..n)
            .filter(|&i| !placed[i])
            .map(|i| (i, problem.sum_against(i, &ordering)))
            .fold(None, |best: Option<(usize, f64)>, (i, cost)| match best {
                Some((_, best_cost)) if best_cost <= cost => best,
                _ => Some((i, cost)),
            });
        let Some((i, _)) = next else {
            break;
        };
        placed[i] = true;
        ordering.push(i);
    }
    ordering
}

/// Greedy selection: groups take turns adding the allowed free point with the
/// least insertion cost until every target is met.
pub(crate) fn greedy_assignment(problem: &AssignmentProblem) -> Vec<Option<usize>> {
    let n = problem.len();
    let mut groups: Vec<Option<usize>> = vec![None; n];
    let mut remaining = problem.targets().to_vec();
    while remaining.iter().any(|&r| r > 0) {
        let mut progressed = false;
        for g in 0..problem.num_groups() {
            if remaining[g] == 0 {
                continue;
            }
            let candidate = (0..n)
                .filter(|&i| groups[i].is_none() && problem.is_allowed(i, Some(g)))
                .map(|i| (i, problem.insertion_cost(&groups, i, g)))
                .fold(None, |best: Option<(usize, f64)>, (i, cost)| match best {
                    Some((_, best_cost)) if best_cost <= cost => best,
                    _ => Some((i, cost)),
                });
            if let Some((i, _)) = candidate {
                groups[i] = Some(g);
                remaining[g] -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
    groups
}

struct PolaritySearch<'a>(&'a PolarityProblem);

impl LocalSearch for PolaritySearch<'_> {
    type State = Vec<bool>;
    type Move = usize;

    fn greedy(&self) -> Vec<bool> {
        greedy_signs(self.0)
    }

    fn random(&self, rng: &mut StdRng) -> Vec<bool> {
        (0..self.0.len()).map(|_| rng.r#gen::<bool>()).collect()
    }

    fn objective(&self, state: &Vec<bool>) -> f64 {
        self.0.objective(state)
    }

    fn propose(&self, state: &Vec<bool>, rng: &mut StdRng) -> Option<usize> {
        (!state.is_empty()).then(|| rng.gen_range(0..state.len()))
    }

    fn delta(&self, state: &Vec<bool>, mv: usize) -> f64 {
        self.0.flip_delta(state, mv)
    }

    fn apply(&self, state: &mut Vec<bool>, mv: usize) {
        state[mv] = !state[mv];
    }

    fn neighborhood(&self, state: &Vec<bool>) -> Vec<usize> {
        (0..state.len()).collect()
    }

    fn energy_scale(&self) -> f64 {
        self.0.mean_pair_energy()
    }
}

struct OrderingSearch<'a>(&'a OrderingProblem);

impl LocalSearch for OrderingSearch<'_> {
    type State = Vec<usize>;
    type Move = (usize, usize);

    fn greedy(&self) -> Vec<usize> {
        greedy_ordering(self.0, &[])
    }

    fn random(&self, rng: &mut StdRng) -> Vec<usize> {
        let mut ordering: Vec<usize> = (0..self.0.len()).collect();
        ordering.shuffle(rng);
        ordering
    }

    fn objective(&self, state: &Vec<usize>) -> f64 {
        self.0.objective(state)
    }

    fn propose(&self, state: &Vec<usize>, rng: &mut StdRng) -> Option<(usize, usize)> {
        let n = state.len();
        if n < 2 {
            return None;
        }
        let a = rng.gen_range(0..n);
        let b = (a + rng.gen_range(1..n)) % n;
        Some((a, b))
    }

    fn delta(&self, state: &Vec<usize>, (a, b): (usize, usize)) -> f64 {
        self.0.swap_delta(state, a, b)
    }

    fn apply(&self, state: &mut Vec<usize>, (a, b): (usize, usize)) {
        state.swap(a, b);
    }

    fn neighborhood(&self, state: &Vec<usize>) -> Vec<(usize, usize)> {
        let n = state.len();
        (0..n)
            .flat_map(|a| ((a + 1)..n).map(move |b| (a, b)))
            .collect()
    }

    fn energy_scale(&self) -> f64 {
        self.0.mean_pair_energy()
    }
}

struct AssignmentSearch<'a>(&'a AssignmentProblem);

impl LocalSearch for AssignmentSearch<'_> {
    type State = Vec<Option<usize>>;
    type Move = (usize, usize);

    fn greedy(&self) -> Self::State {
        greedy_assignment(self.0)
    }

    fn random(&self, rng: &mut StdRng) -> Self::State {
        let problem = self.0;
        let mut groups: Vec<Option<usize>> = vec![None; problem.len()];
        for (g, &target) in problem.targets().iter().enumerate() {
            let mut free: Vec<usize> = (0..problem.len())
                .filter(|&i| groups[i].is_none() && problem.is_allowed(i, Some(g)))
                .collect();
            free.shuffle(rng);
            for &i in free.iter().take(target) {
                groups[i] = Some(g);
            }
        }
        groups
    }

    fn objective(&self, state: &Self::State) -> f64 {
        self.0.objective(state)
    }

    fn propose(&self, state: &Self::State, rng: &mut StdRng) -> Option<(usize, usize)> {
        let n = state.len();
        if n < 2 {
            return None;
        }
        (0..MAX_PROPOSAL_ATTEMPTS)
            .map(|_| (rng.gen_range(0..n), rng.gen_range(0..n)))
            .find(|&(i, j)| self.0.can_exchange(state, i, j))
    }

    fn delta(&self, state: &Self::State, (i, j): (usize, usize)) -> f64 {
        self.0.exchange_delta(state, i, j)
    }

    fn apply(&self, state: &mut Self::State, (i, j): (usize, usize)) {
        state.swap(i, j);
    }

    fn neighborhood(&self, state: &Self::State) -> Vec<(usize, usize)> {
        let n = state.len();
        (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .filter(|&(i, j)| self.0.can_exchange(state, i, j))
            .collect()
    }

    fn is_valid(&self, state: &Self::State, (i, j): (usize, usize)) -> bool {
        self.0.can_exchange(state, i, j)
    }

    fn energy_scale(&self) -> f64 {
        self.0.mean_pair_energy()
    }
}
