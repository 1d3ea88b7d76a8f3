//! Effect families and their dispatcher.
//!
//! Each of the seven augmentation families is one variant of [`EffectKind`];
//! [`run_family`] samples that family's parameters, invokes the
//! transformation per parameter and collects the produced annotation files.
//! Variant-level failures are recorded in the family's [`FamilyOutcome`]
//! without aborting the remaining parameters.

pub mod gain_chorus;
pub mod merge;
pub mod noise;
pub mod pauses;
pub mod pitch_shift;
pub mod reverb_filter;
pub mod sampler;
pub mod time_stretch;

use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::annotation::NoteEvent;
use crate::audio::AudioAsset;
use crate::config::Config;
use crate::error::AugmentError;
use crate::pipeline::naming;

pub use merge::MergeCandidate;
pub use sampler::SamplingMode;

/// The closed set of augmentation families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Pauses,
    TimeStretch,
    PitchShift,
    ReverbFilter,
    GainChorus,
    Merge,
    Noise,
}

impl EffectKind {
    /// All families in dispatch (and result concatenation) order
    pub const ALL: [EffectKind; 7] = [
        EffectKind::Pauses,
        EffectKind::TimeStretch,
        EffectKind::PitchShift,
        EffectKind::ReverbFilter,
        EffectKind::GainChorus,
        EffectKind::Merge,
        EffectKind::Noise,
    ];

    /// Tag embedded in output filenames and matched by the re-entry scan
    pub fn tag(&self) -> &'static str {
        match self {
            EffectKind::Pauses => "addpauses",
            EffectKind::TimeStretch => "timestretch",
            EffectKind::PitchShift => "pitchshift",
            EffectKind::ReverbFilter => "reverb_filters",
            EffectKind::GainChorus => "gain_chorus",
            EffectKind::Merge => "merged",
            EffectKind::Noise => "noise",
        }
    }

    /// Name used by `--disable-effect` and log lines
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Pauses => "pauses",
            EffectKind::TimeStretch => "timestretch",
            EffectKind::PitchShift => "pitchshift",
            EffectKind::ReverbFilter => "reverb",
            EffectKind::GainChorus => "chorus",
            EffectKind::Merge => "merge",
            EffectKind::Noise => "noise",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        EffectKind::ALL.iter().copied().find(|k| k.name() == name)
    }

    fn enabled(&self, config: &Config) -> bool {
        match self {
            EffectKind::Pauses => config.add_pause.enabled,
            EffectKind::TimeStretch => config.time_stretch.enabled,
            EffectKind::PitchShift => config.pitch_shift.enabled,
            EffectKind::ReverbFilter => config.reverb_filter.enabled,
            EffectKind::GainChorus => config.gain_chorus.enabled,
            EffectKind::Merge => config.merge_audio.enabled,
            EffectKind::Noise => config.add_noise.enabled,
        }
    }
}

/// Everything one family unit needs: the standardized asset, its decoded
/// annotation, the immutable configuration snapshot and the merge pool.
#[derive(Debug, Clone)]
pub struct FamilyContext {
    pub asset: AudioAsset,
    pub events: Arc<Vec<NoteEvent>>,
    pub config: Arc<Config>,
    pub output_dir: PathBuf,
    pub merge_candidates: Arc<Vec<MergeCandidate>>,
}

/// Explicit result of one family unit.
#[derive(Debug, Default)]
pub struct FamilyOutcome {
    /// Annotation files produced, one per successful variant
    pub annotation_files: Vec<PathBuf>,
    /// Per-variant failures, already logged, with their reasons
    pub variant_failures: Vec<String>,
    /// A family-level failure (e.g. merge pool too small); the family
    /// produced nothing
    pub family_error: Option<String>,
}

impl FamilyOutcome {
    fn variant(&mut self, result: crate::error::Result<PathBuf>, kind: EffectKind, label: &str) {
        match result {
            Ok(path) => self.annotation_files.push(path),
            Err(err) => {
                error!("{} variant {} failed: {}", kind.name(), label, err);
                self.variant_failures.push(format!("{}: {}", label, err));
            }
        }
    }
}

/// Run one effect family end to end.
///
/// Samples the family's parameters, applies the transformation for each and
/// collects annotation paths. Never panics on bad input; every failure ends
/// up in the returned outcome.
pub fn run_family(kind: EffectKind, ctx: &FamilyContext) -> FamilyOutcome {
    let mut outcome = FamilyOutcome::default();
    if !kind.enabled(&ctx.config) {
        return outcome;
    }

    let mut rng = rand::thread_rng();
    match kind {
        EffectKind::Pauses => run_pauses(ctx, &mut rng, &mut outcome),
        EffectKind::TimeStretch => run_time_stretch(ctx, &mut rng, &mut outcome),
        EffectKind::PitchShift => run_pitch_shift(ctx, &mut rng, &mut outcome),
        EffectKind::ReverbFilter => run_reverb_filter(ctx, &mut rng, &mut outcome),
        EffectKind::GainChorus => run_gain_chorus(ctx, &mut rng, &mut outcome),
        EffectKind::Merge => run_merge(ctx, &mut rng, &mut outcome),
        EffectKind::Noise => run_noise(ctx, &mut rng, &mut outcome),
    }

    outcome
}

fn output_path<R: Rng>(ctx: &FamilyContext, rng: &mut R, kind: EffectKind, parameter: &str) -> PathBuf {
    let suffix = if ctx.config.enable_random_suffix {
        naming::random_suffix(rng)
    } else {
        String::new()
    };
    ctx.output_dir.join(naming::output_filename(
        &ctx.asset.base_name,
        kind.tag(),
        parameter,
        &suffix,
        &ctx.asset.extension,
    ))
}

fn run_pauses<R: Rng>(ctx: &FamilyContext, rng: &mut R, outcome: &mut FamilyOutcome) {
    let cfg = &ctx.config.add_pause;
    info!("Applying pause insertion");
    let output = output_path(ctx, rng, EffectKind::Pauses, "1");

    match pauses::apply_pauses(
        rng,
        &ctx.asset,
        &ctx.events,
        cfg.pause_threshold,
        cfg.min_pause_duration,
        cfg.max_pause_duration,
        &output,
    ) {
        Ok(Some(path)) => outcome.annotation_files.push(path),
        Ok(None) => {}
        Err(err) => {
            error!("pause insertion failed: {}", err);
            outcome.variant_failures.push(err.to_string());
        }
    }
}

fn run_time_stretch<R: Rng>(ctx: &FamilyContext, rng: &mut R, outcome: &mut FamilyOutcome) {
    let cfg = &ctx.config.time_stretch;
    let factors = sampler::sample_floats(
        rng,
        SamplingMode::from_flag(cfg.randomized),
        cfg.min_factor,
        cfg.max_factor,
        cfg.variations,
        1.0,
    );

    for factor in factors {
        let parameter = naming::format_factor(factor);
        info!("Applying time stretch: {}x", parameter);
        let output = output_path(ctx, rng, EffectKind::TimeStretch, &parameter);
        let result = time_stretch::apply_time_stretch(&ctx.asset, &ctx.events, factor, &output);
        outcome.variant(result, EffectKind::TimeStretch, &parameter);
    }
}

fn run_pitch_shift<R: Rng>(ctx: &FamilyContext, rng: &mut R, outcome: &mut FamilyOutcome) {
    let cfg = &ctx.config.pitch_shift;
    let semitones = sampler::sample_ints(
        rng,
        SamplingMode::from_flag(cfg.randomized),
        cfg.min_semitones,
        cfg.max_semitones,
        cfg.variations,
        0,
    );

    for shift in semitones {
        let parameter = shift.to_string();
        info!("Applying pitch shift: {} semitones", shift);
        let output = output_path(ctx, rng, EffectKind::PitchShift, &parameter);
        let result = pitch_shift::apply_pitch_shift(&ctx.asset, &ctx.events, shift, &output);
        outcome.variant(result, EffectKind::PitchShift, &parameter);
    }
}

fn run_reverb_filter<R: Rng>(ctx: &FamilyContext, rng: &mut R, outcome: &mut FamilyOutcome) {
    let cfg = &ctx.config.reverb_filter;
    let room_scales = sampler::sample_ints(
        rng,
        SamplingMode::Randomized,
        cfg.min_room_scale,
        cfg.max_room_scale,
        cfg.variations,
        0,
    );

    for room_scale in room_scales {
        let Some(&(low_pass, high_pass)) = cfg.cutoff_pairs.choose(rng) else {
            break;
        };
        let parameter = room_scale.to_string();
        info!(
            "Applying reverb (room_scale={}) and filters (LP={}Hz, HP={}Hz)",
            room_scale, low_pass, high_pass
        );
        let output = output_path(ctx, rng, EffectKind::ReverbFilter, &parameter);
        let result = reverb_filter::apply_reverb_and_filters(
            &ctx.asset, &ctx.events, room_scale, low_pass, high_pass, &output,
        );
        outcome.variant(result, EffectKind::ReverbFilter, &parameter);
    }
}

fn run_gain_chorus<R: Rng>(ctx: &FamilyContext, rng: &mut R, outcome: &mut FamilyOutcome) {
    let cfg = &ctx.config.gain_chorus;
    let gains = sampler::sample_ints(
        rng,
        SamplingMode::Randomized,
        cfg.min_gain,
        cfg.max_gain,
        cfg.variations,
        0,
    );
    let depths = sampler::sample_floats(
        rng,
        SamplingMode::Randomized,
        cfg.min_depth,
        cfg.max_depth,
        cfg.variations,
        0.0,
    );

    for (gain, depth) in gains.into_iter().zip(depths.into_iter()) {
        let Some(&rate) = cfg.rates.choose(rng) else {
            break;
        };
        let parameter = gain.to_string();
        info!(
            "Applying gain ({} dB) and chorus (depth={}, rate={} Hz)",
            gain, depth, rate
        );
        let output = output_path(ctx, rng, EffectKind::GainChorus, &parameter);
        let result = gain_chorus::apply_gain_and_chorus(
            &ctx.asset, &ctx.events, gain, depth, rate, &output,
        );
        outcome.variant(result, EffectKind::GainChorus, &parameter);
    }
}

fn run_merge<R: Rng>(ctx: &FamilyContext, rng: &mut R, outcome: &mut FamilyOutcome) {
    let cfg = &ctx.config.merge_audio;
    match merge::apply_merge(
        rng,
        &ctx.asset,
        &ctx.events,
        &ctx.merge_candidates,
        cfg.merge_num,
        cfg.sort_events,
        &ctx.output_dir,
    ) {
        Ok(path) => outcome.annotation_files.push(path),
        Err(err @ AugmentError::MergePoolTooSmall { .. }) => {
            error!("Skipping merge: {}", err);
            outcome.family_error = Some(err.to_string());
        }
        Err(err) => {
            error!("Merge failed: {}", err);
            outcome.family_error = Some(err.to_string());
        }
    }
}

fn run_noise<R: Rng>(ctx: &FamilyContext, rng: &mut R, outcome: &mut FamilyOutcome) {
    let cfg = &ctx.config.add_noise;
    let intensities = sampler::sample_floats(
        rng,
        SamplingMode::from_flag(cfg.randomized),
        cfg.min_intensity,
        cfg.max_intensity,
        cfg.variations,
        1.0,
    );

    for intensity in intensities {
        let parameter = naming::format_factor(intensity);
        info!("Applying noise with intensity {}", parameter);
        let output = output_path(ctx, rng, EffectKind::Noise, &parameter);
        let result = noise::apply_noise(rng, &ctx.asset, &ctx.events, intensity, &output);
        outcome.variant(result, EffectKind::Noise, &parameter);
    }
}
