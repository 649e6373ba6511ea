use saavy_sampler::{
    dsp::envelope::EnvelopeStage, sample::Sample, EngineConfig, ParamIndex, SamplerEngine,
};

const RATE: f32 = 48_000.0;
const BLOCK: usize = 256;

fn engine_with(data: Vec<f32>) -> SamplerEngine {
    let mut engine = SamplerEngine::new(EngineConfig {
        channels: 2,
        sample_rate: RATE,
        buffer_size: BLOCK,
        tempo: 120.0,
    })
    .unwrap();
    engine.set_sample(Sample::from_frames(vec![data], RATE, 440.0).unwrap());
    engine.set_param_value(ParamIndex::Dca1Attack, 0.0);
    engine.set_param_value(ParamIndex::Dca1Decay, 0.0);
    engine.set_param_value(ParamIndex::Dca1Sustain, 1.0);
    engine.set_param_value(ParamIndex::Gen1Glide, 0.0);
    engine
}

fn saw(frames: usize) -> Vec<f32> {
    let period = RATE / 440.0;
    (0..frames)
        .map(|i| 2.0 * (i as f32 / period).fract() - 1.0)
        .collect()
}

/// Render `frames` and return the interleaved-free left/right pair.
fn render(engine: &mut SamplerEngine, frames: usize) -> (Vec<f32>, Vec<f32>) {
    let mut left = vec![0.0; frames];
    let mut right = vec![0.0; frames];
    engine.process(&[], &mut [left.as_mut_slice(), right.as_mut_slice()], frames);
    (left, right)
}

fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
}

#[test]
fn a4_note_sounds_within_first_block() {
    let mut engine = engine_with(saw(RATE as usize));
    engine.process_midi(&[0x90, 69, 100]);

    let (left, right) = render(&mut engine, BLOCK);
    assert!(peak(&left) > 0.0, "first block should not be silent");
    assert!(
        left.iter().chain(&right).all(|s| s.is_finite() && s.abs() <= 1.0),
        "limited output must stay within [-1, 1]"
    );
}

#[test]
fn release_reaches_exact_silence() {
    let release = 0.1f32;
    let mut engine = engine_with(vec![0.5; 2 * RATE as usize]);
    engine.set_param_value(ParamIndex::Dca1Release, release);

    engine.process_midi(&[0x90, 69, 100]);
    render(&mut engine, 4 * BLOCK);

    let max_frames = engine.envelopes().dca.max_frames() as f32;
    let release_frames = ((release * release * max_frames).round() as usize)
        .max(engine.envelopes().dca.min_frames() as usize);

    engine.process_midi(&[0x80, 69, 0]);
    let (left, _) = render(&mut engine, release_frames + 4 * BLOCK);

    let mut last_peak = f32::MAX;
    for block in left[..release_frames].chunks(BLOCK) {
        let p = peak(block);
        assert!(p <= last_peak + 1e-4, "release must not swell: {p} > {last_peak}");
        last_peak = p;
    }
    assert!(
        left[release_frames - 1..].iter().all(|&s| s == 0.0),
        "output must be exactly zero once the release has run"
    );
    assert_eq!(engine.active_voices(), 0);
}

#[test]
fn mono_retrigger_fast_releases_previous_note() {
    let mut engine = engine_with(saw(RATE as usize));
    engine.set_param_value(ParamIndex::Def1Mono, 1.0);

    engine.process_midi(&[0x90, 60, 100]);
    render(&mut engine, BLOCK);
    let a = engine.pool().note_voice(60).unwrap();

    engine.process_midi(&[0x90, 67, 100]);
    assert_eq!(engine.pool().note_voice(60), None, "notes[A] must be cleared");
    let old = engine.pool().voice(a);
    assert_eq!(old.dca_env.stage, EnvelopeStage::Release);
    assert_eq!(old.dca_env.frames, engine.envelopes().dca.min_frames());

    let frames = engine.envelopes().dca.min_frames() as usize + BLOCK;
    render(&mut engine, frames);
    assert_eq!(engine.active_voices(), 1);
    assert!(engine.pool().note_voice(67).is_some());
}

#[test]
fn truncated_midi_is_ignored_and_stream_continues() {
    let mut engine = engine_with(saw(RATE as usize));
    engine.process_midi(&[0x90, 60, 100, 0x90, 62]);
    assert_eq!(engine.active_voices(), 1);
    assert!(engine.pool().note_voice(62).is_none());

    engine.process_midi(&[0x90, 62, 100]);
    assert_eq!(engine.active_voices(), 2);
}

#[test]
fn missing_sample_renders_silence() {
    let mut engine = SamplerEngine::new(EngineConfig::default()).unwrap();
    engine.process_midi(&[0x90, 69, 127]);

    let (left, right) = render(&mut engine, 512);
    assert!(left.iter().chain(&right).all(|&s| s == 0.0));
    assert_eq!(engine.active_voices(), 0, "an over generator frees its voice");
}

#[test]
fn looped_sample_outlives_its_length_until_released() {
    let frames = 4_800;
    let mut engine = engine_with(saw(frames));
    engine.set_loop(true);

    engine.process_midi(&[0x90, 69, 100]);
    let (left, _) = render(&mut engine, 4 * frames);
    let held = peak(&left[3 * frames..]);
    assert!(held > 0.0, "loop keeps sounding");
    assert_eq!(engine.active_voices(), 1);

    // 4 · frames at the base pitch lands right after a loop wrap, inside
    // the crossfade; letting go of the loop there must not keep its dip
    engine.process_midi(&[0x80, 69, 0]);
    let (released, _) = render(&mut engine, 2 * frames);
    let level = peak(&released[..BLOCK]);
    assert!(
        level > 0.5 * held,
        "release starts at {level}, held level was {held}"
    );
    assert_eq!(engine.active_voices(), 0, "released loop plays out and ends");
}

#[test]
fn param_port_writes_apply_on_next_block() {
    let mut engine = engine_with(saw(RATE as usize));
    let port = engine.param_port(ParamIndex::Out1Volume);

    std::thread::spawn(move || port.set(0.0)).join().unwrap();
    render(&mut engine, BLOCK);
    assert_eq!(engine.param_value(ParamIndex::Out1Volume), 0.0);
}

#[test]
fn reverse_parameter_flips_sample_at_block_boundary() {
    let data: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
    let mut engine = engine_with(data);
    engine.set_param_value(ParamIndex::Gen1Reverse, 1.0);
    assert!(!engine.sample().is_reverse());

    render(&mut engine, 16);
    assert!(engine.sample().is_reverse());
    assert_eq!(engine.sample().playback_frame(0, 0), Some(0.99));
    assert_eq!(engine.sample().frames(0)[0], 0.0, "flip leaves stored frames alone");
}
