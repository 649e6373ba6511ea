use crate::{
    dsp::{
        envelope::{Envelope, EnvelopeParams, EnvelopeStage, EnvelopeState},
        filter::{BiquadFilter, FilterKernel, FilterSlope, FilterType, SVFilter, Svf24},
        formant::FormantFilter,
        glide::Glide,
        lfo::{Lfo, LfoWave},
        ramp::Ramp,
        shaping::sigmoid_1,
    },
    sample::{Generator, Sample},
    synth::{
        controls::MidiControls,
        params::{ParamIndex, Params},
    },
};

/*
Voice Signal Chain
==================

One voice turns the shared sample into a stereo pair:

  ┌───────────┐   ┌────────┐   ┌───────────┐   ┌─────┐   ┌──────────────┐
  │ Generator │──→│ Filter │──→│ Mid/Side  │──→│ DCA │──→│ Dry / Send   │
  │ (pitch)   │   │ (DCF)  │   │ (width)   │   │     │   │ split (fx)   │
  └───────────┘   └────────┘   └───────────┘   └─────┘   └──────────────┘
        ↑              ↑                          ↑
        │              │                          │
       LFO ─────────────────────────────────── LFO env
     (pitch)       (cutoff, reso)

Every voice owns three envelope states (amplitude, filter, LFO depth), a
glide offset, a pressure ramp and one filter kernel of every topology per
channel so the slope can change between notes without allocating.

Render is called for a run of frames in which no envelope changes stage;
the engine cuts blocks at stage boundaries and advances the envelopes in
between.
*/

/// The three envelope policies every voice is driven by.
#[derive(Debug, Clone)]
pub struct VoiceEnvelopes {
    pub dca: Envelope,
    pub dcf: Envelope,
    pub lfo: Envelope,
}

impl Default for VoiceEnvelopes {
    fn default() -> Self {
        Self {
            dca: Envelope::new(EnvelopeParams::DCA),
            dcf: Envelope::new(EnvelopeParams::DCF),
            lfo: Envelope::new(EnvelopeParams::LFO),
        }
    }
}

impl VoiceEnvelopes {
    pub fn set_frame_range(&mut self, min_frames: u32, max_frames: u32) {
        self.dca.set_frame_range(min_frames, max_frames);
        self.dcf.set_frame_range(min_frames, max_frames);
        self.lfo.set_frame_range(min_frames, max_frames);
    }
}

/// Per-channel filter kernels of every slope.
#[derive(Default)]
pub struct VoiceFilters {
    svf12: [SVFilter; 2],
    svf24: [Svf24; 2],
    biquad: [BiquadFilter; 2],
    formant: [FormantFilter; 2],
}

impl VoiceFilters {
    pub fn reset(&mut self, filter_type: FilterType, sample_rate: f32, cutoff: f32, reso: f32) {
        for k in 0..2 {
            self.svf12[k].reset(filter_type, sample_rate, cutoff, reso);
            self.svf24[k].reset(filter_type, sample_rate, cutoff, reso);
            self.biquad[k].reset(filter_type, sample_rate, cutoff, reso);
            self.formant[k].reset(filter_type, sample_rate, cutoff, reso);
        }
    }

    #[inline]
    pub fn output(&mut self, slope: FilterSlope, k: usize, input: f32, cutoff: f32, reso: f32) -> f32 {
        match slope {
            FilterSlope::Slope12 => self.svf12[k].output(input, cutoff, reso),
            FilterSlope::Slope24 => self.svf24[k].output(input, cutoff, reso),
            FilterSlope::Biquad => self.biquad[k].output(input, cutoff, reso),
            FilterSlope::Formant => self.formant[k].output(input, cutoff, reso),
        }
    }
}

/// Block-rate output controls, interpolated across each block.
#[derive(Debug, Clone, Default)]
pub struct OutputRamps {
    pub volume: Ramp,
    pub pan_left: Ramp,
    pub pan_right: Ramp,
    pub width: Ramp,
}

impl OutputRamps {
    pub fn process(&mut self, frames: u32) {
        self.volume.process(frames);
        self.pan_left.process(frames);
        self.pan_right.process(frames);
        self.width.process(frames);
    }
}

/// Everything a voice reads, but does not own, while rendering a block.
pub struct RenderCtx<'a> {
    pub sample: &'a Sample,
    pub lfo_wave: &'a LfoWave,
    pub params: &'a Params,
    pub ctl: &'a MidiControls,
    pub ramps: &'a OutputRamps,
    pub channels: usize,
    pub lfo_freq: f32,
    /// Pitch modulation depth: mod wheel plus LFO1_PITCH.
    pub modwheel: f32,
    /// Squared send amount.
    pub fxsend: f32,
    /// Source channel feeding the right side.
    pub k12: u16,
    pub slope: FilterSlope,
}

pub struct Voice {
    /// Note this voice was started for; kept while the voice drains after
    /// being detached from the note table.
    pub note: Option<u8>,
    pub velocity: f32,
    /// Poly pressure, raw 0..1.
    pub pressure: f32,
    pub freq: f32,
    pub generator: Generator,
    pub lfo: Lfo,
    pub lfo_sample: f32,
    pub filters: VoiceFilters,
    pub dca_env: EnvelopeState,
    pub dcf_env: EnvelopeState,
    pub lfo_env: EnvelopeState,
    pub glide: Glide,
    pub pressure_ramp: Ramp,
    pub sustain_pending: bool,
}

impl Voice {
    pub fn new(seed: u64) -> Self {
        Self {
            note: None,
            velocity: 0.0,
            pressure: 0.0,
            freq: 0.0,
            generator: Generator::default(),
            lfo: Lfo::new(seed),
            lfo_sample: 0.0,
            filters: VoiceFilters::default(),
            dca_env: EnvelopeState::default(),
            dcf_env: EnvelopeState::default(),
            lfo_env: EnvelopeState::default(),
            glide: Glide::default(),
            pressure_ramp: Ramp::new(0.0),
            sustain_pending: false,
        }
    }

    /// Return to the free-list state.
    pub fn clear(&mut self) {
        self.note = None;
        self.pressure = 0.0;
        self.sustain_pending = false;
        self.dca_env = EnvelopeState::default();
        self.dcf_env = EnvelopeState::default();
        self.lfo_env = EnvelopeState::default();
    }

    pub fn start_envelopes(&mut self, envs: &VoiceEnvelopes, params: &Params) {
        envs.dca.start(&mut self.dca_env, params);
        envs.dcf.start(&mut self.dcf_env, params);
        envs.lfo.start(&mut self.lfo_env, params);
    }

    /// Ordinary note-off: every envelope releases and the loop lets go.
    pub fn note_off(&mut self, envs: &VoiceEnvelopes, params: &Params, sample: &Sample) {
        envs.dca.note_off(&mut self.dca_env, params);
        envs.dcf.note_off(&mut self.dcf_env, params);
        envs.lfo.note_off(&mut self.lfo_env, params);
        self.generator.set_loop(sample, false);
    }

    /// Shortest click-free release, used when a note is stolen.
    pub fn note_off_fast(&mut self, envs: &VoiceEnvelopes) {
        envs.dca.note_off_fast(&mut self.dca_env);
        envs.dcf.note_off_fast(&mut self.dcf_env);
        envs.lfo.note_off_fast(&mut self.lfo_env);
    }

    pub fn is_releasing(&self) -> bool {
        self.dca_env.stage == EnvelopeStage::Release
    }

    /// Frames left before any running envelope needs to change stage.
    pub fn frames_to_transition(&self, limit: u32) -> u32 {
        [&self.dca_env, &self.dcf_env, &self.lfo_env]
            .into_iter()
            .filter(|env| env.running)
            .fold(limit, |frames, env| frames.min(env.frames))
    }

    /// Render `count` frames starting at block frame `start`, adding the dry
    /// part into `outs[k][out_base + n]` and the send part into `sends[k][n]`.
    ///
    /// Returns the LFO modulation value at the first frame.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        start: usize,
        count: usize,
        outs: &mut [&mut [f32]],
        out_base: usize,
        sends: &mut [Vec<f32>],
    ) -> f32 {
        let params = ctx.params;
        let ramps = ctx.ramps;
        let mut first_lfo = 0.0;

        for j in 0..count {
            let n = start + j;
            let at = n as u32;

            let pre = self.pressure_ramp.value_at(j as u32);
            let vel1 = self.velocity + (1.0 - self.velocity) * pre;

            let lfo_env = self.lfo_env.tick();
            let lfo1 = self.lfo_sample * lfo_env;
            if j == 0 {
                first_lfo = lfo1;
            }

            let glide = self.glide.tick();
            self.generator.next(
                ctx.sample,
                self.freq * (ctx.ctl.pitchbend + ctx.modwheel * lfo1) + glide,
            );
            let gen1 = self.generator.value(ctx.sample, 0);
            let gen2 = self.generator.value(ctx.sample, ctx.k12);

            let sweep = params[ParamIndex::Lfo1Sweep].ramp_value(at);
            self.lfo_sample = self
                .lfo
                .sample(ctx.lfo_wave, ctx.lfo_freq * (1.0 + 0.5 * sweep * lfo_env));

            let dcf_depth = params[ParamIndex::Dcf1Envelope].ramp_value(at);
            let env1 = 0.5 * (1.0 + vel1 * dcf_depth * self.dcf_env.tick());
            let cutoff = sigmoid_1(
                params[ParamIndex::Dcf1Cutoff].ramp_value(at)
                    * env1
                    * (1.0 + params[ParamIndex::Lfo1Cutoff].ramp_value(at) * lfo1),
            );
            let reso = sigmoid_1(
                params[ParamIndex::Dcf1Reso].ramp_value(at)
                    * env1
                    * (1.0 + params[ParamIndex::Lfo1Reso].ramp_value(at) * lfo1),
            );

            let left = self.filters.output(ctx.slope, 0, gen1, cutoff, reso);
            let right = self.filters.output(ctx.slope, 1, gen2, cutoff, reso);

            let mid = 0.5 * (left + right);
            let side = 0.5 * (left - right);
            let wid = ramps.width.value_at(at);
            let vol1 = vel1 * ramps.volume.value_at(at) * self.dca_env.tick();

            let out1 = vol1 * (mid + side * wid) * ramps.pan_left.value_at(at);
            let out2 = vol1 * (mid - side * wid) * ramps.pan_right.value_at(at);

            for (k, (out, send)) in outs
                .iter_mut()
                .zip(sends.iter_mut())
                .take(ctx.channels)
                .enumerate()
            {
                let dry = if k & 1 == 1 { out2 } else { out1 };
                let wet = ctx.fxsend * dry;
                out[out_base + n] += dry - wet;
                send[n] += wet;
            }
        }

        first_lfo
    }
}
