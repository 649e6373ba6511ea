use std::path::Path;

use hound::SampleFormat;

use crate::error::{Result, SamplerError};

/// Decode a WAV file into de-interleaved f32 channels and its sample rate.
pub fn decode_wav(path: &Path) -> Result<(Vec<Vec<f32>>, f32)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(SamplerError::EmptySample);
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(SamplerError::UnsupportedFormat {
                    bits: spec.bits_per_sample,
                    format: "float",
                });
            }
            reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(SamplerError::UnsupportedFormat {
                    bits: spec.bits_per_sample,
                    format: "integer",
                });
            }
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|x| x as f32 / max))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let frames = interleaved.len() / channels;
    if frames == 0 {
        return Err(SamplerError::EmptySample);
    }

    let mut data = vec![Vec::with_capacity(frames); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (channel, &s) in data.iter_mut().zip(frame) {
            channel.push(s);
        }
    }

    Ok((data, spec.sample_rate as f32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("saavy_sampler_{}_{name}.wav", std::process::id()))
    }

    #[test]
    fn decodes_stereo_int_wav() {
        let path = temp_path("stereo16");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..10i16 {
            writer.write_sample(i * 1000).unwrap();
            writer.write_sample(-i * 1000).unwrap();
        }
        writer.finalize().unwrap();

        let (channels, rate) = decode_wav(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(rate, 44_100.0);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].len(), 10);
        assert!((channels[0][3] - 3000.0 / 32768.0).abs() < 1e-6);
        assert!((channels[1][3] + 3000.0 / 32768.0).abs() < 1e-6);
    }

    #[test]
    fn decodes_float_wav() {
        let path = temp_path("mono32f");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [0.25f32, -0.5, 0.75] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let (channels, rate) = decode_wav(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(rate, 48_000.0);
        assert_eq!(channels, vec![vec![0.25, -0.5, 0.75]]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = decode_wav(Path::new("/definitely/not/here.wav"));
        assert!(result.is_err());
    }
}
