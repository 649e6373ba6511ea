//! The shared sample buffer and its playback generator.
//!
//! One [`Sample`] is owned by the engine and read by every voice's
//! [`Generator`]. Frames are stored per channel with zero guard frames
//! around the audio so the 4-point interpolator can always read a full
//! stencil in either direction:
//!
//! ```text
//!   index:   0    1    2    3   ...   n+1    n+2  n+3  n+4
//!   data:  [ 0 ,  0 , s0 , s1 , ... , sn-1 ,  0 ,  0 ,  0  ]
//! ```
//!
//! Frames are always stored forward. Reverse playback mirrors the read
//! position and the stencil order, so flipping direction never touches the
//! frame data.

pub mod generator;
#[cfg(feature = "wav")]
pub mod loader;

use std::path::{Path, PathBuf};

pub use generator::Generator;

use crate::error::{Result, SamplerError};

pub const GUARD_FRONT: usize = 2;
pub const GUARD_BACK: usize = 3;

#[derive(Debug, Clone)]
pub struct Sample {
    sample_rate: f32,
    channels: Vec<Vec<f32>>,
    nframes: u32,
    rate0: f32,
    freq0: f32,
    ratio: f32,
    reverse: bool,
    looping: bool,
    loop_start: u32,
    loop_end: u32,
    loop_phase1: f32,
    loop_phase2: f32,
    path: Option<PathBuf>,
}

impl Sample {
    /// An empty sample; every generator reading it is immediately over.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            channels: Vec::new(),
            nframes: 0,
            rate0: sample_rate,
            freq0: 1.0,
            ratio: 0.0,
            reverse: false,
            looping: false,
            loop_start: 0,
            loop_end: 0,
            loop_phase1: 0.0,
            loop_phase2: 0.0,
            path: None,
        }
    }

    /// Build from de-interleaved channel data recorded at `source_rate`,
    /// whose natural pitch is `base_freq` Hz.
    pub fn from_frames(channels: Vec<Vec<f32>>, source_rate: f32, base_freq: f32) -> Result<Self> {
        let nframes = channels.first().map_or(0, Vec::len);
        if nframes == 0 {
            return Err(SamplerError::EmptySample);
        }
        if channels.iter().any(|c| c.len() != nframes) {
            return Err(SamplerError::InvalidConfig(
                "sample channels differ in length".into(),
            ));
        }
        if nframes > u32::MAX as usize - GUARD_BACK {
            return Err(SamplerError::InvalidConfig("sample is too long".into()));
        }

        let channels = channels
            .into_iter()
            .map(|data| {
                let mut padded = Vec::with_capacity(GUARD_FRONT + data.len() + GUARD_BACK);
                padded.extend([0.0; GUARD_FRONT]);
                padded.extend(data);
                padded.extend([0.0; GUARD_BACK]);
                padded
            })
            .collect();

        let mut sample = Self::new(source_rate);
        sample.channels = channels;
        sample.nframes = nframes as u32;
        sample.rate0 = source_rate;
        sample.loop_end = sample.nframes;
        sample.reset(base_freq);
        Ok(sample)
    }

    /// Decode a WAV file into a new sample.
    #[cfg(feature = "wav")]
    pub fn open(path: impl AsRef<Path>, base_freq: f32) -> Result<Self> {
        let path = path.as_ref();
        let (channels, source_rate) = loader::decode_wav(path)?;
        let mut sample = Self::from_frames(channels, source_rate, base_freq)?;
        sample.path = Some(path.to_path_buf());
        tracing::info!(
            path = %path.display(),
            channels = sample.channels(),
            frames = sample.length(),
            rate = source_rate,
            "sample opened"
        );
        Ok(sample)
    }

    /// Drop all frame data, keeping the host sample rate.
    pub fn close(&mut self) {
        if let Some(path) = &self.path {
            tracing::info!(path = %path.display(), "sample closed");
        }
        *self = Self::new(self.sample_rate);
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.nframes == 0
    }

    pub fn channels(&self) -> u16 {
        self.channels.len() as u16
    }

    pub fn length(&self) -> u32 {
        self.nframes
    }

    /// Source sample rate of the frame data.
    pub fn rate(&self) -> f32 {
        self.rate0
    }

    /// Base (natural) frequency.
    pub fn freq(&self) -> f32 {
        self.freq0
    }

    /// Frames advanced per output frame per Hz of playback frequency.
    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_ratio();
    }

    /// Retune to a new base frequency.
    pub fn reset(&mut self, base_freq: f32) {
        self.freq0 = base_freq;
        self.update_ratio();
    }

    fn update_ratio(&mut self) {
        self.ratio = if self.nframes > 0 && self.freq0 > 0.0 && self.sample_rate > 0.0 {
            self.rate0 / (self.freq0 * self.sample_rate)
        } else {
            0.0
        };
    }

    /// Stored (forward) audio frames of channel `k`, without guards.
    pub fn frames(&self, k: u16) -> &[f32] {
        match self.channels.get(k as usize) {
            Some(data) => &data[GUARD_FRONT..GUARD_FRONT + self.nframes as usize],
            None => &[],
        }
    }

    /// Value of channel `k` at playback position `index`, honouring
    /// the reverse flag.
    pub fn playback_frame(&self, k: u16, index: u32) -> Option<f32> {
        self.stencil(k, index).map(|[_, x1, _, _]| x1)
    }

    /// Playback frames `index − 1 ..= index + 2` of channel `k`, guards
    /// included.
    #[inline]
    pub fn stencil(&self, k: u16, index: u32) -> Option<[f32; 4]> {
        if index >= self.nframes {
            return None;
        }
        let data = self.channels.get(k as usize)?;
        if self.reverse {
            let start = (self.nframes - 1 - index) as usize + GUARD_FRONT - 2;
            let &[x3, x2, x1, x0] = data.get(start..start + 4)? else {
                return None;
            };
            Some([x0, x1, x2, x3])
        } else {
            let start = index as usize + GUARD_FRONT - 1;
            let &[x0, x1, x2, x3] = data.get(start..start + 4)? else {
                return None;
            };
            Some([x0, x1, x2, x3])
        }
    }

    #[inline]
    pub fn is_over(&self, frame: u32) -> bool {
        self.nframes == 0 || frame >= self.nframes
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    /// Flip playback direction. Only the read mapping and the loop
    /// phases change; the frame data stays as stored.
    pub fn set_reverse(&mut self, reverse: bool) {
        if reverse == self.reverse {
            return;
        }
        self.reverse = reverse;
        self.update_loop_phases();
    }

    /// Apply `reverse` if it differs, returning whether it did.
    pub fn reverse_test(&mut self, reverse: bool) -> bool {
        let changed = reverse != self.reverse;
        if changed {
            self.set_reverse(reverse);
        }
        changed
    }

    pub fn is_loop(&self) -> bool {
        self.looping && self.loop_start < self.loop_end
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
        if looping && self.loop_start >= self.loop_end {
            self.loop_start = 0;
            self.loop_end = self.nframes;
        }
        self.update_loop_phases();
    }

    /// Apply `looping` if it differs, returning whether it did.
    pub fn loop_test(&mut self, looping: bool) -> bool {
        let changed = looping != self.looping;
        if changed {
            self.set_loop(looping);
        }
        changed
    }

    /// Loop region in forward frame units, clamped to the sample.
    pub fn set_loop_range(&mut self, start: u32, end: u32) {
        let end = end.min(self.nframes);
        self.loop_start = start.min(end);
        self.loop_end = end;
        self.update_loop_phases();
    }

    pub fn loop_start(&self) -> u32 {
        self.loop_start
    }

    pub fn loop_end(&self) -> u32 {
        self.loop_end
    }

    /// Loop length in frames.
    pub fn loop_phase1(&self) -> f32 {
        self.loop_phase1
    }

    /// Loop end in playback (possibly reversed) frame units.
    pub fn loop_phase2(&self) -> f32 {
        self.loop_phase2
    }

    fn update_loop_phases(&mut self) {
        if self.loop_start < self.loop_end {
            self.loop_phase1 = (self.loop_end - self.loop_start) as f32;
            self.loop_phase2 = if self.reverse {
                (self.nframes - self.loop_start) as f32
            } else {
                self.loop_end as f32
            };
        } else {
            self.loop_phase1 = 0.0;
            self.loop_phase2 = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_sample(len: usize) -> Sample {
        let data = (0..len).map(|i| i as f32).collect();
        Sample::from_frames(vec![data], 48_000.0, 440.0).unwrap()
    }

    #[test]
    fn guards_surround_audio() {
        let sample = ramp_sample(4);
        assert_eq!(sample.stencil(0, 0), Some([0.0, 0.0, 1.0, 2.0]));
        assert_eq!(sample.stencil(0, 3), Some([2.0, 3.0, 0.0, 0.0]));
        assert_eq!(sample.stencil(0, 4), None);
        assert_eq!(sample.stencil(1, 0), None);
    }

    #[test]
    fn reverse_stencil_reads_mirrored_frames() {
        let mut sample = ramp_sample(4);
        sample.set_reverse(true);
        assert_eq!(sample.stencil(0, 0), Some([0.0, 3.0, 2.0, 1.0]));
        assert_eq!(sample.stencil(0, 3), Some([1.0, 0.0, 0.0, 0.0]));
        assert_eq!(sample.stencil(0, 4), None);
    }

    #[test]
    fn ratio_tracks_rates_and_base_freq() {
        let mut sample = ramp_sample(16);
        sample.set_sample_rate(96_000.0);
        assert!((sample.ratio() - 48_000.0 / (440.0 * 96_000.0)).abs() < 1e-8);

        sample.reset(220.0);
        assert!((sample.ratio() * 440.0 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_empty_and_ragged_data() {
        assert!(matches!(
            Sample::from_frames(vec![], 48_000.0, 440.0),
            Err(SamplerError::EmptySample)
        ));
        assert!(Sample::from_frames(vec![vec![0.0; 4], vec![0.0; 3]], 48_000.0, 440.0).is_err());
    }

    #[test]
    fn enabling_loop_without_range_selects_whole_sample() {
        let mut sample = ramp_sample(100);
        sample.set_loop_range(0, 0);
        sample.set_loop(true);
        assert!(sample.is_loop());
        assert_eq!((sample.loop_start(), sample.loop_end()), (0, 100));
        assert_eq!(sample.loop_phase1(), 100.0);
        assert_eq!(sample.loop_phase2(), 100.0);
    }

    #[test]
    fn reverse_mirrors_frames_and_loop_region() {
        let mut sample = ramp_sample(10);
        sample.set_loop_range(2, 6);
        sample.set_loop(true);

        assert!(sample.reverse_test(true));
        assert!(!sample.reverse_test(true));
        assert_eq!(sample.playback_frame(0, 0), Some(9.0));
        assert_eq!(sample.playback_frame(0, 9), Some(0.0));
        assert_eq!(sample.loop_phase1(), 4.0);
        assert_eq!(sample.loop_phase2(), 8.0);
        assert_eq!(sample.frames(0)[0], 0.0, "stored data is never rewritten");

        sample.set_reverse(false);
        assert_eq!(sample.playback_frame(0, 0), Some(0.0));
        assert_eq!(sample.loop_phase2(), 6.0);
    }

    #[test]
    fn close_empties_the_sample() {
        let mut sample = ramp_sample(10);
        sample.close();
        assert!(sample.is_empty());
        assert!(sample.is_over(0));
        assert_eq!(sample.sample_rate(), 48_000.0);
    }
}
