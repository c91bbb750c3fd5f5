use rand::Rng;

/// Metropolis criterion: downhill and neutral moves are always taken, uphill
/// moves with probability `exp(-delta / temperature)`.
#[inline]
pub fn metropolis_accept(delta: f64, temperature: f64, rng: &mut impl Rng) -> bool {
    if delta <= 0.0 {
        return true;
    }
    if temperature <= 0.0 || !delta.is_finite() {
        return false;
    }
    rng.r#gen::<f64>() < (-delta / temperature).exp()
}

/// Geometric cooling schedule starting at `initial` and ending at the last
/// level not below `last`.
pub fn geometric_schedule(initial: f64, last: f64, cooling_rate: f64) -> impl Iterator<Item = f64> {
    std::iter::successors(Some(initial), move |&t| Some(t * cooling_rate))
        .take_while(move |&t| t >= last)
}
