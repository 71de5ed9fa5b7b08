//! WAV File Source/Sink - Read and write WAV audio files
//!
//! Pure Rust RIFF/WAVE I/O for the convolution front end. Supports
//! 8/16/24/32-bit PCM and 32-bit IEEE float, including
//! `WAVE_FORMAT_EXTENSIBLE` headers on the read side.
//!
//! Samples are exchanged as `f64` in `[-1.0, 1.0]`:
//!
//! | Encoding      | Read scale          | Write                                   |
//! |---------------|---------------------|-----------------------------------------|
//! | PCM 8-bit     | `(b - 128) / 128`   | `round(s·128)` clamped to `[-128, 127]`, +128 |
//! | PCM 16-bit    | `v / 32768`         | `round(s·32768)` clamped to `[-32768, 32767]` |
//! | PCM 24-bit    | `v / 8388608`       | `round(s·8388608)`, clamped              |
//! | PCM 32-bit    | `v / 2147483648`    | `round(s·2147483648)`, clamped           |
//! | Float 32-bit  | as stored           | as `f32`                                 |
//!
//! ## Example
//!
//! ```rust,no_run
//! use wavconv_core::wav_source_sink::{read_signal, write_signal};
//!
//! let (spec, samples) = read_signal("input.wav").unwrap();
//! write_signal("copy.wav", &spec, &samples).unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, warn};

use crate::types::{ConvError, ConvResult, Sample};

const FORMAT_PCM: u16 = 1;
const FORMAT_FLOAT: u16 = 3;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Largest `fmt ` chunk accepted (extensible headers use 40 bytes)
const MAX_FMT_CHUNK_SIZE: u64 = 1024;

/// Sample encoding inside the data chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// Integer PCM
    Pcm,
    /// IEEE float
    Float,
}

impl SampleFormat {
    fn tag(self) -> u16 {
        match self {
            SampleFormat::Pcm => FORMAT_PCM,
            SampleFormat::Float => FORMAT_FLOAT,
        }
    }
}

/// Format metadata of a WAV file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WavSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub format: SampleFormat,
}

impl WavSpec {
    /// 16-bit PCM mono
    pub fn mono16(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
            bits_per_sample: 16,
            format: SampleFormat::Pcm,
        }
    }

    /// Reject encodings this module cannot read or write
    pub fn validate(&self) -> ConvResult<()> {
        if self.channels == 0 {
            return Err(ConvError::Format("channel count must be at least 1".to_string()));
        }
        let supported = match self.format {
            SampleFormat::Pcm => matches!(self.bits_per_sample, 8 | 16 | 24 | 32),
            SampleFormat::Float => self.bits_per_sample == 32,
        };
        if !supported {
            return Err(ConvError::Format(format!(
                "unsupported WAV encoding: {:?} with {} bits per sample",
                self.format, self.bits_per_sample
            )));
        }
        // Both are stored as 16/32-bit header fields
        if self.block_align() > u16::MAX as u32 {
            return Err(ConvError::Format(format!(
                "{} channels of {} bits do not fit a WAV frame",
                self.channels, self.bits_per_sample
            )));
        }
        if self.sample_rate as u64 * self.block_align() as u64 > u32::MAX as u64 {
            return Err(ConvError::Format(format!(
                "byte rate overflows at {} Hz with {} channels",
                self.sample_rate, self.channels
            )));
        }
        Ok(())
    }

    fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample / 8
    }

    /// Bytes per frame
    fn block_align(&self) -> u32 {
        self.channels as u32 * self.bytes_per_sample() as u32
    }
}

/// Quantize a sample to a signed integer of `bits` width.
///
/// Multiplies by full scale `2^(bits-1)`, rounds to nearest and saturates
/// to the representable range. Widths outside `1..=32` are clamped into it.
pub fn quantize(sample: Sample, bits: u16) -> i32 {
    let bits = bits.clamp(1, 32);
    let full_scale = (1i64 << (bits - 1)) as f64;
    let v = (sample * full_scale).round();
    let v = if v.is_nan() { 0.0 } else { v };
    v.clamp(-full_scale, full_scale - 1.0) as i32
}

/// WAV file reader.
#[derive(Debug)]
pub struct WavFileSource {
    reader: BufReader<File>,
    spec: WavSpec,
    num_frames: u64,
    frames_read: u64,
}

impl WavFileSource {
    /// Open a WAV file and parse its header.
    pub fn open(path: impl AsRef<Path>) -> ConvResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let (spec, declared_size) = Self::read_header(&mut reader)?;

        // Streamed or truncated files declare more data than they hold
        let data_start = reader.stream_position()?;
        let available = reader.get_ref().metadata()?.len().saturating_sub(data_start);
        let data_size = if declared_size > available {
            warn!(
                path = %path.display(),
                declared = declared_size,
                available,
                "WAV data chunk is shorter than its header claims; reading what is present"
            );
            available
        } else {
            declared_size
        };
        let num_frames = data_size / spec.block_align() as u64;
        debug!(
            path = %path.display(),
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            bits = spec.bits_per_sample,
            frames = num_frames,
            "Opened WAV source"
        );
        Ok(Self {
            reader,
            spec,
            num_frames,
            frames_read: 0,
        })
    }

    fn read_header<R: Read + Seek>(r: &mut R) -> ConvResult<(WavSpec, u64)> {
        let mut buf4 = [0u8; 4];

        r.read_exact(&mut buf4)?;
        if &buf4 != b"RIFF" {
            return Err(ConvError::Format("not a RIFF file".to_string()));
        }
        r.read_exact(&mut buf4)?; // file size - 8
        r.read_exact(&mut buf4)?;
        if &buf4 != b"WAVE" {
            return Err(ConvError::Format("not a WAVE file".to_string()));
        }

        let mut fmt: Option<(u16, u16, u32, u16)> = None;

        loop {
            match r.read_exact(&mut buf4) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let chunk_id = buf4;
            r.read_exact(&mut buf4)?;
            let chunk_size = u32::from_le_bytes(buf4) as u64;

            if &chunk_id == b"fmt " {
                if chunk_size < 16 {
                    return Err(ConvError::Format("fmt chunk too short".to_string()));
                }
                if chunk_size > MAX_FMT_CHUNK_SIZE {
                    return Err(ConvError::Format(format!(
                        "fmt chunk of {} bytes is implausibly large",
                        chunk_size
                    )));
                }
                let mut body = vec![0u8; chunk_size as usize];
                r.read_exact(&mut body)?;
                if chunk_size % 2 == 1 {
                    r.seek(SeekFrom::Current(1))?;
                }

                let le16 = |at: usize| u16::from_le_bytes([body[at], body[at + 1]]);
                let mut tag = le16(0);
                let channels = le16(2);
                let sample_rate = u32::from_le_bytes([body[4], body[5], body[6], body[7]]);
                let bits = le16(14);

                // Extensible headers carry the real tag in the sub-format GUID
                if tag == FORMAT_EXTENSIBLE {
                    if body.len() < 26 {
                        return Err(ConvError::Format(
                            "extensible fmt chunk without sub-format".to_string(),
                        ));
                    }
                    tag = le16(24);
                }
                fmt = Some((tag, channels, sample_rate, bits));
            } else if &chunk_id == b"data" {
                let (tag, channels, sample_rate, bits_per_sample) = fmt.ok_or_else(|| {
                    ConvError::Format("data chunk before fmt chunk".to_string())
                })?;
                let format = match tag {
                    FORMAT_PCM => SampleFormat::Pcm,
                    FORMAT_FLOAT => SampleFormat::Float,
                    other => {
                        return Err(ConvError::Format(format!(
                            "unsupported WAV format tag {:#06x}",
                            other
                        )))
                    }
                };
                let spec = WavSpec {
                    sample_rate,
                    channels,
                    bits_per_sample,
                    format,
                };
                spec.validate()?;
                return Ok((spec, chunk_size));
            } else {
                // Skip unknown chunk (word aligned)
                let skip = chunk_size + (chunk_size & 1);
                r.seek(SeekFrom::Current(skip as i64))?;
            }
        }

        Err(ConvError::Format("no data chunk found".to_string()))
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    pub fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.spec.channels
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.spec.bits_per_sample
    }

    /// Total number of sample frames.
    pub fn num_frames(&self) -> u64 {
        self.num_frames
    }

    /// Get duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.spec.sample_rate > 0 {
            self.num_frames as f64 / self.spec.sample_rate as f64
        } else {
            0.0
        }
    }

    pub fn is_eof(&self) -> bool {
        self.frames_read >= self.num_frames
    }

    /// Read up to `count` frames. Multi-channel data stays interleaved.
    pub fn read_frames(&mut self, count: usize) -> ConvResult<Vec<Sample>> {
        let remaining = (self.num_frames - self.frames_read) as usize;
        let to_read = count.min(remaining);
        if to_read == 0 {
            return Ok(Vec::new());
        }

        let total_values = to_read * self.spec.channels as usize;
        let width = self.spec.bytes_per_sample() as usize;
        let mut raw = vec![0u8; total_values * width];
        self.reader.read_exact(&mut raw)?;

        let samples: Vec<Sample> = match (self.spec.format, self.spec.bits_per_sample) {
            (SampleFormat::Pcm, 8) => raw.iter().map(|&b| (b as f64 - 128.0) / 128.0).collect(),
            (SampleFormat::Pcm, 16) => raw
                .chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]) as f64 / 32768.0)
                .collect(),
            (SampleFormat::Pcm, 24) => raw
                .chunks_exact(3)
                .map(|b| {
                    let v = i32::from_le_bytes([0, b[0], b[1], b[2]]) >> 8; // sign extend
                    v as f64 / 8388608.0
                })
                .collect(),
            (SampleFormat::Pcm, 32) => raw
                .chunks_exact(4)
                .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64 / 2147483648.0)
                .collect(),
            (SampleFormat::Float, 32) => raw
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
                .collect(),
            (format, bits) => {
                return Err(ConvError::Format(format!(
                    "unsupported WAV encoding: {:?} with {} bits per sample",
                    format, bits
                )))
            }
        };

        self.frames_read += to_read as u64;
        Ok(samples)
    }

    /// Read all remaining frames.
    pub fn read_all(&mut self) -> ConvResult<Vec<Sample>> {
        let remaining = (self.num_frames - self.frames_read) as usize;
        self.read_frames(remaining)
    }
}

/// WAV file writer.
#[derive(Debug)]
pub struct WavFileSink {
    writer: BufWriter<File>,
    spec: WavSpec,
    data_start: u64,
    frames_written: u64,
    finalized: bool,
}

impl WavFileSink {
    /// Create a WAV file with the given format.
    pub fn create(path: impl AsRef<Path>, spec: WavSpec) -> ConvResult<Self> {
        spec.validate()?;
        let mut w = BufWriter::new(File::create(path)?);

        // Ranges checked by validate()
        let block_align = spec.block_align() as u16;
        let byte_rate = spec.sample_rate * spec.block_align();

        // RIFF header, sizes patched on close
        w.write_all(b"RIFF")?;
        w.write_all(&0u32.to_le_bytes())?;
        w.write_all(b"WAVE")?;

        w.write_all(b"fmt ")?;
        w.write_all(&16u32.to_le_bytes())?;
        w.write_all(&spec.format.tag().to_le_bytes())?;
        w.write_all(&spec.channels.to_le_bytes())?;
        w.write_all(&spec.sample_rate.to_le_bytes())?;
        w.write_all(&byte_rate.to_le_bytes())?;
        w.write_all(&block_align.to_le_bytes())?;
        w.write_all(&spec.bits_per_sample.to_le_bytes())?;

        w.write_all(b"data")?;
        w.write_all(&0u32.to_le_bytes())?;
        let data_start = w.stream_position()?;

        Ok(Self {
            writer: w,
            spec,
            data_start,
            frames_written: 0,
            finalized: false,
        })
    }

    /// Write samples in `[-1.0, 1.0]`. Multi-channel input must be
    /// interleaved whole frames.
    pub fn write_samples(&mut self, samples: &[Sample]) -> ConvResult<()> {
        let channels = self.spec.channels as usize;
        if samples.len() % channels != 0 {
            return Err(ConvError::Format(format!(
                "{} samples do not fill whole {}-channel frames",
                samples.len(),
                channels
            )));
        }

        let bits = self.spec.bits_per_sample;
        let mut buf = Vec::with_capacity(samples.len() * self.spec.bytes_per_sample() as usize);
        match (self.spec.format, bits) {
            (SampleFormat::Pcm, 8) => {
                for &s in samples {
                    buf.push((quantize(s, 8) + 128) as u8);
                }
            }
            (SampleFormat::Pcm, 16) => {
                for &s in samples {
                    buf.extend_from_slice(&(quantize(s, 16) as i16).to_le_bytes());
                }
            }
            (SampleFormat::Pcm, 24) => {
                for &s in samples {
                    buf.extend_from_slice(&quantize(s, 24).to_le_bytes()[..3]);
                }
            }
            (SampleFormat::Pcm, 32) => {
                for &s in samples {
                    buf.extend_from_slice(&quantize(s, 32).to_le_bytes());
                }
            }
            (SampleFormat::Float, 32) => {
                for &s in samples {
                    buf.extend_from_slice(&(s as f32).to_le_bytes());
                }
            }
            (format, bits) => {
                return Err(ConvError::Format(format!(
                    "unsupported WAV encoding: {:?} with {} bits per sample",
                    format, bits
                )))
            }
        }
        self.writer.write_all(&buf)?;
        self.frames_written += (samples.len() / channels) as u64;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    /// Patch the header sizes and flush.
    pub fn close(mut self) -> ConvResult<()> {
        self.finalize()?;
        Ok(())
    }

    fn finalize(&mut self) -> std::io::Result<()> {
        if self.finalized {
            return Ok(());
        }
        let data_size = self.frames_written * self.spec.block_align() as u64;

        self.writer.seek(SeekFrom::Start(self.data_start - 4))?;
        self.writer.write_all(&(data_size as u32).to_le_bytes())?;

        let riff_size = self.data_start + data_size - 8;
        self.writer.seek(SeekFrom::Start(4))?;
        self.writer.write_all(&(riff_size as u32).to_le_bytes())?;

        self.writer.flush()?;
        self.finalized = true;
        Ok(())
    }
}

impl Drop for WavFileSink {
    fn drop(&mut self) {
        let _ = self.finalize();
    }
}

/// Read a single-channel WAV file.
///
/// Fails with [`ConvError::Format`] if the file has more than one channel.
pub fn read_signal(path: impl AsRef<Path>) -> ConvResult<(WavSpec, Vec<Sample>)> {
    let mut source = WavFileSource::open(path)?;
    if source.channels() != 1 {
        return Err(ConvError::not_mono(source.channels()));
    }
    let samples = source.read_all()?;
    Ok((source.spec(), samples))
}

/// Write `samples` to `path` with the given format.
pub fn write_signal(path: impl AsRef<Path>, spec: &WavSpec, samples: &[Sample]) -> ConvResult<()> {
    let mut sink = WavFileSink::create(path, *spec)?;
    sink.write_samples(samples)?;
    sink.close()
}
