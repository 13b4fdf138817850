/// Seeded RNG when `seed` is given, otherwise one seeded from entropy.
pub(crate) fn rng_from_seed(seed: Option<u64>) -> fastrand::Rng {
    seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed)
}

/// Uniform `f64` in `[low, high]`.
///
/// `fastrand` draws from `[0, 1)`; the upper end is reachable only up to
/// rounding, which is enough for box-bounded search. Interpolates instead
/// of scaling `high - low`, which overflows for bounds near `f64::MAX`.
#[inline]
pub(crate) fn f64_range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    let r = rng.f64();
    (low * (1.0 - r) + high * r).clamp(low, high)
}
