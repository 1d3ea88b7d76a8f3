//! Parameter sampling for effect families.
//!
//! Produces a set of unique, bounded parameter values per family, always
//! excluding the identity (no-op) value. Two modes: randomized rejection
//! sampling with a bounded retry budget, and a deterministic grid for
//! reproducible coverage of the range.

use rand::Rng;

/// Retry budget per slot in randomized mode
const MAX_ATTEMPTS: usize = 10;

/// How parameter values are drawn for a family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    Randomized,
    Grid,
}

impl SamplingMode {
    pub fn from_flag(randomized: bool) -> Self {
        if randomized {
            SamplingMode::Randomized
        } else {
            SamplingMode::Grid
        }
    }
}

/// Sample up to `variations` unique float values in `[min, max]`, rounded to
/// one decimal, excluding `identity`.
///
/// Randomized mode rejection-samples each slot with a budget of
/// [`MAX_ATTEMPTS`]; an exhausted slot is skipped when earlier slots
/// succeeded, but the very first slot accepts its last rejected candidate so
/// an enabled family never yields zero variants over a non-degenerate range.
pub fn sample_floats<R: Rng>(
    rng: &mut R,
    mode: SamplingMode,
    min: f64,
    max: f64,
    variations: usize,
    identity: f64,
) -> Vec<f64> {
    match mode {
        SamplingMode::Randomized => {
            rejection_sample(variations, identity, || round1(rng.gen_range(min..=max)))
        }
        SamplingMode::Grid => grid_sample(min, max, variations, identity, round1),
    }
}

/// Integer counterpart of [`sample_floats`].
pub fn sample_ints<R: Rng>(
    rng: &mut R,
    mode: SamplingMode,
    min: i64,
    max: i64,
    variations: usize,
    identity: i64,
) -> Vec<i64> {
    match mode {
        SamplingMode::Randomized => {
            rejection_sample(variations, identity, || rng.gen_range(min..=max))
        }
        SamplingMode::Grid => grid_sample(min as f64, max as f64, variations, identity, |v| {
            v.round() as i64
        }),
    }
}

fn rejection_sample<T, F>(variations: usize, identity: T, mut draw: F) -> Vec<T>
where
    T: PartialEq + Copy,
    F: FnMut() -> T,
{
    let mut values: Vec<T> = Vec::with_capacity(variations);

    for slot in 0..variations {
        let mut candidate = identity;
        let mut attempts = 0;

        while (candidate == identity || values.contains(&candidate)) && attempts < MAX_ATTEMPTS {
            candidate = draw();
            attempts += 1;
        }

        if attempts == MAX_ATTEMPTS && (candidate == identity || values.contains(&candidate)) {
            if slot > 0 {
                // Uniqueness exhausted; settle for fewer variants
                continue;
            }
            // First slot: accept the last rejected candidate rather than
            // yielding an empty set
            values.push(candidate);
            continue;
        }

        values.push(candidate);
    }

    values
}

/// Evenly space `variations + 1` points across `[min, max]` inclusive, map
/// through `quantize`, drop duplicates and the identity, then trim from the
/// end until at most `variations` values remain.
fn grid_sample<T, F>(min: f64, max: f64, variations: usize, identity: T, quantize: F) -> Vec<T>
where
    T: PartialEq + Copy,
    F: Fn(f64) -> T,
{
    if variations == 0 {
        return Vec::new();
    }

    let points = variations + 1;
    let mut values: Vec<T> = Vec::with_capacity(points);
    for i in 0..points {
        let t = if points == 1 {
            0.0
        } else {
            i as f64 / (points - 1) as f64
        };
        let value = quantize(min + t * (max - min));
        if value != identity && !values.contains(&value) {
            values.push(value);
        }
    }

    values.truncate(variations);
    values
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_randomized_floats_exclude_identity() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let values =
                sample_floats(&mut rng, SamplingMode::Randomized, 0.6, 1.6, 3, 1.0);
            assert!(!values.is_empty());
            assert!(values.len() <= 3);
            assert!(!values.contains(&1.0));
        }
    }

    #[test]
    fn test_randomized_floats_are_unique() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let values =
                sample_floats(&mut rng, SamplingMode::Randomized, 0.6, 1.6, 5, 1.0);
            let mut deduped = values.clone();
            deduped.dedup_by(|a, b| a == b);
            let unique = values
                .iter()
                .all(|v| values.iter().filter(|w| *w == v).count() == 1);
            assert!(unique, "duplicates in {:?}", deduped);
        }
    }

    #[test]
    fn test_randomized_never_empty_for_nondegenerate_range() {
        // Only two representable values after rounding, one of them identity:
        // uniqueness is quickly exhausted but the first slot must still fill.
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let values =
                sample_floats(&mut rng, SamplingMode::Randomized, 0.9, 1.0, 4, 1.0);
            assert!(!values.is_empty());
        }
    }

    #[test]
    fn test_degenerate_range_falls_back_to_single_value() {
        // min == max == identity: only the first-slot fallback fires
        let mut rng = StdRng::seed_from_u64(5);
        let values = sample_floats(&mut rng, SamplingMode::Randomized, 1.0, 1.0, 3, 1.0);
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_zero_variations_yields_empty_set() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_floats(&mut rng, SamplingMode::Randomized, 0.5, 2.0, 0, 1.0).is_empty());
        assert!(sample_floats(&mut rng, SamplingMode::Grid, 0.5, 2.0, 0, 1.0).is_empty());
    }

    #[test]
    fn test_randomized_ints_in_bounds() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..50 {
            let values = sample_ints(&mut rng, SamplingMode::Randomized, -5, 5, 3, 0);
            assert!(!values.is_empty());
            assert!(values.iter().all(|&v| (-5..=5).contains(&v) && v != 0));
        }
    }

    #[test]
    fn test_grid_floats_exclude_identity_exact_size() {
        let mut rng = StdRng::seed_from_u64(0);
        // 4 points across [0.5, 2.0]: 0.5, 1.0, 1.5, 2.0 -> identity dropped
        let values = sample_floats(&mut rng, SamplingMode::Grid, 0.5, 2.0, 3, 1.0);
        assert_eq!(values, vec![0.5, 1.5, 2.0]);
    }

    #[test]
    fn test_grid_trims_from_the_end() {
        let mut rng = StdRng::seed_from_u64(0);
        // 5 points across [0.0, 2.0]: 0.0, 0.5, 1.0, 1.5, 2.0 -> drop 1.0,
        // then trim 2.0 to get back to `variations`
        let values = sample_floats(&mut rng, SamplingMode::Grid, 0.0, 2.0, 3, 1.0);
        assert_eq!(values, vec![0.0, 0.5, 1.5]);
    }

    #[test]
    fn test_grid_ints_collapse_duplicates() {
        let mut rng = StdRng::seed_from_u64(0);
        // 6 points across [-2, 2] round to -2,-1,0,0,1,2; dedupe + drop identity
        let values = sample_ints(&mut rng, SamplingMode::Grid, -2, 2, 5, 0);
        assert_eq!(values, vec![-2, -1, 1, 2]);
    }

    #[test]
    fn test_grid_size_property() {
        let mut rng = StdRng::seed_from_u64(0);
        for variations in 1..8 {
            let values =
                sample_ints(&mut rng, SamplingMode::Grid, -6, 6, variations, 0);
            assert!(values.len() <= variations);
            assert!(!values.contains(&0));
        }
    }
}
