use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, SQRT_2};

use crate::{
    config::EngineConfig,
    dsp::{
        filter::{FilterSlope, FilterType},
        lfo::{lfo_frequency, LfoShape, LfoWave, Phasor},
        shaping::{limit, velocity_curve},
    },
    error::Result,
    io::{
        control::{ControlEvent, ControlSink},
        converter::{cc_bipolar, cc_unit, note_to_freq, pitch_bend_unit},
        midi::{self, MidiEvent, MidiEvents},
    },
    sample::Sample,
    synth::{
        controls::{AuxControls, MidiControls},
        params::{ParamIndex, ParamPort, Params},
        pool::{VoiceId, VoicePool},
        voice::{OutputRamps, RenderCtx, VoiceEnvelopes},
    },
};

/*
Sampler Engine
==============

Owns the sample, the parameter table, the voice pool and the send bus, and
turns MIDI bytes plus parameter state into audio one block at a time.

Block Flow
----------

  process(ins, outs, n)
    │
    ├─ chunk n into runs of at most buffer_size frames
    │
    └─ per chunk:
         1. ins → send bus, outs ← 0
         2. sync ports, run change detectors (base note, env time,
            reverse, loop, LFO shape), retarget block ramps
         3. per playing voice, in play-list order:
              render up to the next envelope stage boundary,
              advance whichever envelopes ran out,
              free the voice once its DCA is idle or the sample ended
         4. send effect (if any), send bus → outs, limiter
         5. advance phasor, block ramps and parameter ramps

MIDI is applied by `process_midi` before the block it belongs to.

Envelope Time
-------------

    srate_ms   = sample_rate / 1000
    min_frames = round(2 ms · srate_ms)
    max_frames = envtime_ms · srate_ms
    envtime_ms = 10000 · GEN1_ENVTIME

When the env-time knob is below 2 ms the range falls back to half the
sample's length, and to 3 ms when that too is degenerate.
*/

const MIN_ENV_MS: f32 = 2.0;
const ENVTIME_SCALE_MS: f32 = 10_000.0;
const PITCH_SCALE: f32 = 0.5;
const OCTAVE_SCALE: f32 = 12.0;

/// External effect stage run over the send bus once all voices are mixed.
pub trait SendEffect: Send {
    /// Process the first `nframes` of every send channel in place.
    fn process(&mut self, sends: &mut [Vec<f32>], nframes: usize);

    /// Drop all internal state (tails, delay lines).
    fn reset(&mut self) {}
}

pub struct SamplerEngine {
    config: EngineConfig,
    params: Params,
    sample: Sample,
    pool: VoicePool,
    envelopes: VoiceEnvelopes,
    lfo_wave: LfoWave,
    phasor: Phasor,
    ctl: MidiControls,
    aux: AuxControls,
    ramps: OutputRamps,
    sends: Vec<Vec<f32>>,
    glide_last: f32,
    bank: u16,
    sample_key: f32,
    envtime: f32,
    effects: Option<Box<dyn SendEffect>>,
    control_sink: Option<Box<dyn ControlSink>>,
}

impl SamplerEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let params = Params::default();
        let mut engine = Self {
            config,
            sample_key: params.value(ParamIndex::Gen1Sample),
            envtime: params.value(ParamIndex::Gen1Envtime),
            params,
            sample: Sample::new(config.sample_rate),
            pool: VoicePool::new(),
            envelopes: VoiceEnvelopes::default(),
            lfo_wave: LfoWave::new(config.sample_rate),
            phasor: Phasor::default(),
            ctl: MidiControls::default(),
            aux: AuxControls::default(),
            ramps: OutputRamps::default(),
            sends: vec![vec![0.0; config.buffer_size]; config.channels as usize],
            glide_last: 0.0,
            bank: 0,
            effects: None,
            control_sink: None,
        };
        engine.update_env_times();
        engine.reset_ramps();

        tracing::info!(
            channels = config.channels,
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            "sampler engine created"
        );
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    pub fn buffer_size(&self) -> usize {
        self.config.buffer_size
    }

    pub fn set_channels(&mut self, channels: u16) -> Result<()> {
        let config = EngineConfig {
            channels,
            ..self.config
        };
        config.validate()?;
        self.config = config;
        self.alloc_sends();
        tracing::info!(channels, "channel count changed");
        Ok(())
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<()> {
        let config = EngineConfig {
            sample_rate,
            ..self.config
        };
        config.validate()?;
        self.config = config;
        self.sample.set_sample_rate(sample_rate);
        self.lfo_wave.set_sample_rate(sample_rate);
        self.update_env_times();
        tracing::info!(
            sample_rate,
            min_frames = self.envelopes.dca.min_frames(),
            max_frames = self.envelopes.dca.max_frames(),
            "sample rate changed"
        );
        Ok(())
    }

    pub fn set_buffer_size(&mut self, buffer_size: usize) -> Result<()> {
        let config = EngineConfig {
            buffer_size,
            ..self.config
        };
        config.validate()?;
        self.config = config;
        self.alloc_sends();
        tracing::info!(buffer_size, "buffer size changed");
        Ok(())
    }

    pub fn tempo(&self) -> f32 {
        self.config.tempo
    }

    pub fn set_tempo(&mut self, tempo: f32) -> Result<()> {
        let config = EngineConfig {
            tempo,
            ..self.config
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    fn alloc_sends(&mut self) {
        self.sends = vec![vec![0.0; self.config.buffer_size]; self.config.channels as usize];
    }

    // ---- sample ----

    pub fn sample(&self) -> &Sample {
        &self.sample
    }

    /// Replace the sample. Every sounding voice is stopped first.
    ///
    /// The sample keeps the base frequency it was built with; GEN1_SAMPLE
    /// only retunes it once that parameter is next written.
    pub fn set_sample(&mut self, mut sample: Sample) {
        self.all_notes_off();
        sample.set_sample_rate(self.config.sample_rate);
        sample.set_reverse(self.params.value(ParamIndex::Gen1Reverse) > 0.5);
        if self.params.value(ParamIndex::Gen1Loop) > 0.5 {
            sample.set_loop(true);
        }
        self.sample = sample;
        self.sample_key = self.params.value(ParamIndex::Gen1Sample);
        self.update_env_times();
        tracing::info!(
            channels = self.sample.channels(),
            frames = self.sample.length(),
            max_env_frames = self.envelopes.dca.max_frames(),
            "sample installed"
        );
    }

    #[cfg(feature = "wav")]
    pub fn open_sample(&mut self, path: impl AsRef<std::path::Path>, base_freq: f32) -> Result<()> {
        let sample = Sample::open(path, base_freq)?;
        self.set_sample(sample);
        Ok(())
    }

    pub fn close_sample(&mut self) {
        self.all_notes_off();
        self.sample.close();
        self.update_env_times();
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        self.params
            .set_value(ParamIndex::Gen1Reverse, if reverse { 1.0 } else { 0.0 });
        self.sample.set_reverse(reverse);
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.params
            .set_value(ParamIndex::Gen1Loop, if looping { 1.0 } else { 0.0 });
        self.sample.set_loop(looping);
    }

    pub fn set_loop_range(&mut self, start: u32, end: u32) {
        self.sample.set_loop_range(start, end);
    }

    // ---- parameters ----

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param_value(&self, index: ParamIndex) -> f32 {
        self.params.value(index)
    }

    pub fn set_param_value(&mut self, index: ParamIndex, value: f32) {
        self.params.set_value(index, value);
    }

    /// Lock-free handle the host can write `index` through from any thread.
    pub fn param_port(&mut self, index: ParamIndex) -> ParamPort {
        self.params[index].port()
    }

    // ---- hooks ----

    pub fn set_effects(&mut self, effects: Option<Box<dyn SendEffect>>) {
        self.effects = effects;
    }

    pub fn set_control_sink(&mut self, sink: Option<Box<dyn ControlSink>>) {
        self.control_sink = sink;
    }

    // ---- state ----

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn active_voices(&self) -> usize {
        self.pool.active_count()
    }

    pub fn envelopes(&self) -> &VoiceEnvelopes {
        &self.envelopes
    }

    pub fn controls(&self) -> &MidiControls {
        &self.ctl
    }

    pub fn aux(&self) -> &AuxControls {
        &self.aux
    }

    /// Bank select as `msb << 7 | lsb`.
    pub fn bank(&self) -> u16 {
        self.bank
    }

    fn update_env_times(&mut self) {
        let srate_ms = 0.001 * self.config.sample_rate;
        let mut envtime_ms = ENVTIME_SCALE_MS * self.params.value(ParamIndex::Gen1Envtime);
        if envtime_ms < MIN_ENV_MS {
            envtime_ms = 0.5 * self.sample.length() as f32 / srate_ms;
            if envtime_ms < MIN_ENV_MS {
                envtime_ms = MIN_ENV_MS + 1.0;
            }
        }
        let min_frames = (srate_ms * MIN_ENV_MS).round().max(1.0) as u32;
        let max_frames = (srate_ms * envtime_ms) as u32;
        self.envelopes.set_frame_range(min_frames, max_frames);
    }

    fn reset_ramps(&mut self) {
        let (volume, pan_left, pan_right, width) = self.ramp_targets();
        self.ramps.volume.reset(volume);
        self.ramps.pan_left.reset(pan_left);
        self.ramps.pan_right.reset(pan_right);
        self.ramps.width.reset(width);
    }

    fn ramp_targets(&self) -> (f32, f32, f32, f32) {
        let p = &self.params;
        let volume = p.value(ParamIndex::Out1Volume)
            * p.value(ParamIndex::Dca1Volume)
            * self.ctl.volume
            * self.aux.volume;
        let theta = (FRAC_PI_4
            * (1.0 + p.value(ParamIndex::Out1Panning))
            * (1.0 + self.ctl.panning)
            * (1.0 + self.aux.panning))
            .clamp(0.0, FRAC_PI_2);
        (
            volume,
            SQRT_2 * theta.cos(),
            SQRT_2 * theta.sin(),
            p.value(ParamIndex::Out1Width),
        )
    }

    // ---- MIDI ----

    /// Apply every complete message in `data`. A truncated trailing
    /// message is ignored.
    pub fn process_midi(&mut self, data: &[u8]) {
        let target = self.params.value(ParamIndex::Def1Channel).round();
        let target = if (1.0..=16.0).contains(&target) {
            target as u8
        } else {
            0
        };

        for event in MidiEvents::new(data) {
            if target != 0 && event.channel() != target {
                continue;
            }
            match event {
                MidiEvent::NoteOn { key, velocity, .. } => self.note_on(key, velocity),
                MidiEvent::NoteOff { key, .. } => self.note_off(key),
                MidiEvent::PolyPressure { key, pressure, .. } => {
                    if let Some(id) = self.pool.note_voice(key) {
                        self.pool.voice_mut(id).pressure = cc_unit(pressure);
                    }
                }
                MidiEvent::ControlChange {
                    channel,
                    controller,
                    value,
                } => self.control_change(channel, controller, value),
                MidiEvent::ProgramChange { channel, program } => {
                    self.forward(ControlEvent::Program {
                        channel,
                        bank: self.bank,
                        program,
                    });
                }
                MidiEvent::ChannelPressure { pressure, .. } => {
                    self.ctl.pressure = cc_unit(pressure);
                }
                MidiEvent::PitchBend { value, .. } => {
                    let range = self.params.value(ParamIndex::Def1Pitchbend);
                    self.ctl.pitchbend = (range * pitch_bend_unit(value)).exp2();
                }
            }
        }
    }

    fn forward(&mut self, event: ControlEvent) {
        if let Some(sink) = self.control_sink.as_mut() {
            sink.push(event);
        }
    }

    fn control_change(&mut self, channel: u8, controller: u8, value: u8) {
        match controller {
            midi::CC_BANK_SELECT_MSB => {
                self.bank = (self.bank & 0x7f) | (u16::from(value) << 7);
            }
            midi::CC_BANK_SELECT_LSB => {
                self.bank = (self.bank & !0x7f) | u16::from(value);
            }
            midi::CC_MODWHEEL => {
                self.ctl.modwheel = self.params.value(ParamIndex::Def1Modwheel) * cc_unit(value);
            }
            midi::CC_VOLUME => self.ctl.volume = cc_unit(value),
            midi::CC_PANNING => self.ctl.panning = cc_bipolar(value),
            midi::CC_SUSTAIN => {
                if self.ctl.sustain && value < 64 {
                    self.all_sustain_off();
                }
                self.ctl.sustain = value >= 64;
            }
            midi::CC_ALL_SOUND_OFF => self.all_sound_off(),
            midi::CC_ALL_CONTROLLERS_OFF => self.all_controllers_off(),
            midi::CC_ALL_NOTES_OFF => self.all_notes_off(),
            _ => {}
        }
        self.forward(ControlEvent::Controller {
            channel,
            controller,
            value,
        });
    }

    fn note_on(&mut self, key: u8, velocity: u8) {
        let key = key & 0x7f;

        if self.params.value(ParamIndex::Def1Mono) > 0.0 {
            let mut cursor = self.pool.first_playing();
            while let Some(id) = cursor {
                cursor = self.pool.next_playing(id);
                if self.pool.is_bound(id) && !self.pool.voice(id).is_releasing() {
                    self.steal(id);
                }
            }
        }

        if let Some(id) = self.pool.note_voice(key) {
            self.steal(id);
        }

        let Some(id) = self.pool.allocate() else {
            return;
        };

        let p = &self.params;
        let sample_rate = self.config.sample_rate;
        let voice = self.pool.voice_mut(id);

        let vel = velocity as f32 / 127.0;
        voice.velocity = velocity_curve(vel * vel, p.value(ParamIndex::Def1Velocity));
        voice.pressure = 0.0;
        voice.pressure_ramp
            .reset(p.value(ParamIndex::Def1Pressure) * self.ctl.pressure);

        voice.generator.start(&self.sample);
        voice.freq = note_to_freq(
            key as f32
                + p.value(ParamIndex::Gen1Octave) * OCTAVE_SCALE
                + p.value(ParamIndex::Gen1Tuning),
        );

        voice.filters.reset(
            FilterType::from_value(p.value(ParamIndex::Dcf1Type)),
            sample_rate,
            p.value(ParamIndex::Dcf1Cutoff),
            p.value(ParamIndex::Dcf1Reso),
        );
        voice.start_envelopes(&self.envelopes, p);

        let phase_shift = if p.value(ParamIndex::Lfo1Sync) > 0.0 {
            self.phasor.phase_shift()
        } else {
            0.0
        };
        voice.lfo_sample = voice.lfo.start(&self.lfo_wave, phase_shift);

        let glide = p.value(ParamIndex::Gen1Glide);
        let glide_frames = (glide * glide * sample_rate) as u32;
        voice.glide.reset(glide_frames, voice.freq, &mut self.glide_last);
        voice.sustain_pending = false;

        self.pool.bind_note(key, id);
    }

    /// Fast-release a voice and detach it from its note.
    fn steal(&mut self, id: VoiceId) {
        let voice = self.pool.voice_mut(id);
        voice.note_off_fast(&self.envelopes);
        let note = voice.note;
        if let Some(note) = note {
            self.pool.unbind_note(note);
        }
    }

    fn note_off(&mut self, key: u8) {
        let Some(id) = self.pool.note_voice(key) else {
            return;
        };
        let voice = self.pool.voice_mut(id);
        if self.ctl.sustain {
            voice.sustain_pending = true;
        } else if !voice.is_releasing() {
            voice.note_off(&self.envelopes, &self.params, &self.sample);
        }
    }

    /// Release every held voice whose note-off arrived under the pedal.
    pub fn all_sustain_off(&mut self) {
        let mut cursor = self.pool.first_playing();
        while let Some(id) = cursor {
            cursor = self.pool.next_playing(id);
            if !self.pool.is_bound(id) {
                continue;
            }
            let voice = self.pool.voice_mut(id);
            if voice.sustain_pending {
                voice.sustain_pending = false;
                if !voice.is_releasing() {
                    voice.note_off(&self.envelopes, &self.params, &self.sample);
                }
            }
        }
    }

    /// Silence every voice immediately.
    pub fn all_notes_off(&mut self) {
        self.pool.release_all();
        self.glide_last = 0.0;
        self.aux.reset();
    }

    /// Flush the effect stage.
    pub fn all_sound_off(&mut self) {
        if let Some(effects) = self.effects.as_mut() {
            effects.reset();
        }
    }

    pub fn all_controllers_off(&mut self) {
        self.ctl.reset();
    }

    pub fn reset(&mut self) {
        self.all_sound_off();
        self.all_notes_off();
        self.phasor.reset();
        self.reset_ramps();
    }

    // ---- audio ----

    /// Render `nframes` frames into `outs`, passing `ins` through as the
    /// bed the send bus mixes into.
    pub fn process(&mut self, ins: &[&[f32]], outs: &mut [&mut [f32]], nframes: usize) {
        let nframes = outs
            .iter()
            .map(|out| out.len())
            .fold(nframes, usize::min);
        let chunk = self.config.buffer_size.max(1);

        let mut offset = 0;
        while offset < nframes {
            let len = (nframes - offset).min(chunk);
            self.process_block(ins, outs, offset, len);
            offset += len;
        }
    }

    fn process_block(
        &mut self,
        ins: &[&[f32]],
        outs: &mut [&mut [f32]],
        offset: usize,
        len: usize,
    ) {
        let channels = (self.config.channels as usize)
            .min(outs.len())
            .min(self.sends.len());

        for k in 0..channels {
            let send = &mut self.sends[k][..len];
            match ins.get(k).and_then(|input| input.get(offset..offset + len)) {
                Some(input) => send.copy_from_slice(input),
                None => send.fill(0.0),
            }
            outs[k][offset..offset + len].fill(0.0);
        }

        self.params.sync();
        self.run_change_detectors();

        let (volume, pan_left, pan_right, width) = self.ramp_targets();
        self.ramps.volume.set_target(volume);
        self.ramps.pan_left.set_target(pan_left);
        self.ramps.pan_right.set_target(pan_right);
        self.ramps.width.set_target(width);

        let p = &self.params;
        let bpm = match p.value(ParamIndex::Lfo1Bpm) {
            bpm if bpm > 0.0 => bpm,
            _ => self.config.tempo,
        };
        let fxsend = p.value(ParamIndex::Out1Fxsend);
        let pressure_depth = p.value(ParamIndex::Def1Pressure);
        let lfo_panning = p.value(ParamIndex::Lfo1Panning);
        let lfo_volume = p.value(ParamIndex::Lfo1Volume);

        let ctx = RenderCtx {
            sample: &self.sample,
            lfo_wave: &self.lfo_wave,
            params: p,
            ctl: &self.ctl,
            ramps: &self.ramps,
            channels,
            lfo_freq: lfo_frequency(bpm, p.value(ParamIndex::Lfo1Rate)),
            modwheel: self.ctl.modwheel + PITCH_SCALE * p.value(ParamIndex::Lfo1Pitch),
            fxsend: fxsend * fxsend,
            k12: u16::from(self.sample.channels() > 1),
            slope: FilterSlope::from_value(p.value(ParamIndex::Dcf1Slope)),
        };

        let mut cursor = self.pool.first_playing();
        while let Some(id) = cursor {
            cursor = self.pool.next_playing(id);

            {
                let voice = self.pool.voice_mut(id);
                voice
                    .pressure_ramp
                    .set_target(pressure_depth * self.ctl.pressure.max(voice.pressure));
            }

            let mut start = 0;
            while start < len {
                let voice = self.pool.voice_mut(id);
                let ngen = voice.frames_to_transition((len - start) as u32) as usize;

                if ngen > 0 {
                    let lfo1 = voice.render(&ctx, start, ngen, outs, offset, &mut self.sends);
                    self.aux.panning = lfo1 * lfo_panning;
                    self.aux.volume = lfo1 * lfo_volume + 1.0;
                    start += ngen;
                    voice.pressure_ramp.process(ngen as u32);
                }

                if voice.dca_env.running && voice.dca_env.frames == 0 {
                    self.envelopes.dca.advance(&mut voice.dca_env, p);
                }
                if voice.dca_env.is_idle() || voice.generator.is_over(&self.sample) {
                    self.pool.release(id);
                    break;
                }
                if voice.dcf_env.running && voice.dcf_env.frames == 0 {
                    self.envelopes.dcf.advance(&mut voice.dcf_env, p);
                }
                if voice.lfo_env.running && voice.lfo_env.frames == 0 {
                    self.envelopes.lfo.advance(&mut voice.lfo_env, p);
                }
            }
        }

        if let Some(effects) = self.effects.as_mut() {
            effects.process(&mut self.sends[..channels], len);
        }

        let limiter = self.params.value(ParamIndex::Dyn1Limiter) > 0.0;
        for (out, send) in outs.iter_mut().zip(&self.sends).take(channels) {
            for (o, s) in out[offset..offset + len].iter_mut().zip(&send[..len]) {
                *o += s;
                if limiter {
                    *o = limit(*o);
                }
            }
        }

        self.phasor.process(len as u32);
        self.ramps.process(len as u32);
        self.params.tick(len as u32);
    }

    fn run_change_detectors(&mut self) {
        let key = self.params.value(ParamIndex::Gen1Sample);
        if key != self.sample_key {
            self.sample_key = key;
            self.sample.reset(note_to_freq(key));
        }

        let envtime = self.params.value(ParamIndex::Gen1Envtime);
        if envtime != self.envtime {
            self.envtime = envtime;
            self.update_env_times();
        }

        self.sample
            .reverse_test(self.params.value(ParamIndex::Gen1Reverse) > 0.5);
        self.sample
            .loop_test(self.params.value(ParamIndex::Gen1Loop) > 0.5);
        self.lfo_wave.reset_test(
            LfoShape::from_value(self.params.value(ParamIndex::Lfo1Shape)),
            self.params.value(ParamIndex::Lfo1Width),
        );
    }
}
