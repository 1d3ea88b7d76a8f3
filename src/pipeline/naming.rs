//! Output naming scheme.
//!
//! Deterministic `{base}_{effect_tag}_{parameter}[_{random_suffix}]{ext}`
//! pattern. With the suffix disabled, repeated runs with identical parameters
//! overwrite their prior output. The companion scan predicate classifies
//! files already carrying an effect tag so a re-run over a partially
//! processed directory does not re-augment augmented files.

use rand::distributions::Uniform;
use rand::Rng;

use crate::effects::EffectKind;

/// Length of the collision-avoidance suffix
const SUFFIX_LEN: usize = 5;

/// Build an output filename from its naming components.
///
/// `extension` includes the leading period (e.g. `".wav"`); an empty
/// `random_suffix` omits the suffix segment.
pub fn output_filename(
    base_name: &str,
    effect_tag: &str,
    parameter: &str,
    random_suffix: &str,
    extension: &str,
) -> String {
    if random_suffix.is_empty() {
        format!("{}_{}_{}{}", base_name, effect_tag, parameter, extension)
    } else {
        format!(
            "{}_{}_{}_{}{}",
            base_name, effect_tag, parameter, random_suffix, extension
        )
    }
}

/// Generate a fixed-length lowercase suffix.
pub fn random_suffix<R: Rng>(rng: &mut R) -> String {
    let letters = Uniform::new_inclusive(b'a', b'z');
    (0..SUFFIX_LEN)
        .map(|_| rng.sample(letters) as char)
        .collect()
}

/// Format a float parameter for a filename: integral values keep one decimal
/// (`2.0`), everything else uses the shortest representation (`1.5`).
pub fn format_factor(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Whether a filename already carries any known effect tag, i.e. was
/// produced by a previous run.
pub fn is_augmented_name(file_name: &str) -> bool {
    EffectKind::ALL
        .iter()
        .any(|kind| file_name.contains(kind.tag()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_filename_with_and_without_suffix() {
        assert_eq!(
            output_filename("song", "timestretch", "1.5", "abcde", ".wav"),
            "song_timestretch_1.5_abcde.wav"
        );
        assert_eq!(
            output_filename("song", "pitchshift", "-3", "", ".wav"),
            "song_pitchshift_-3.wav"
        );
    }

    #[test]
    fn test_random_suffix_shape() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..20 {
            let suffix = random_suffix(&mut rng);
            assert_eq!(suffix.len(), 5);
            assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_format_factor() {
        assert_eq!(format_factor(1.5), "1.5");
        assert_eq!(format_factor(2.0), "2.0");
        assert_eq!(format_factor(0.6), "0.6");
    }

    #[test]
    fn test_augmented_scan_is_idempotent() {
        let names = [
            ("song.wav", false),
            ("song_timestretch_1.5_abcde.wav", true),
            ("song_pitchshift_-3.wav", true),
            ("song_reverb_filters_40_zzzzz.wav", true),
            ("song_gain_chorus_6_qqqqq.wav", true),
            ("song_addpauses_1.wav", true),
            ("a_b_merged.wav", true),
            ("song_noise_1.5.wav", true),
            ("plain_recording_take2.wav", false),
        ];

        // Same classification on repeated scans
        for _ in 0..2 {
            for (name, expected) in names {
                assert_eq!(is_augmented_name(name), expected, "{}", name);
            }
        }
    }
}
