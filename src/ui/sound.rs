/// Sound engine: procedural chiptune cues via rodio.
///
/// Four cues (jump, collect, hit, win), each generated once at init as an
/// in-memory WAV buffer. Playback is fire-and-forget via a detached Sink.
///
/// Build without the "sound" feature to drop audio entirely; the stub
/// SoundEngine then accepts every call and does nothing.

use crate::sim::event::Cue;

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Cue;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_jump: Arc<Vec<u8>>,
        sfx_collect: Arc<Vec<u8>>,
        sfx_hit: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        /// None when no output device is available.
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("audio unavailable: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_jump: Arc::new(make_wav(&gen_jump())),
                sfx_collect: Arc::new(make_wav(&gen_collect())),
                sfx_hit: Arc::new(make_wav(&gen_hit())),
                sfx_win: Arc::new(make_wav(&gen_win())),
            })
        }

        pub fn play(&self, cue: Cue) {
            let buf = match cue {
                Cue::Jump => &self.sfx_jump,
                Cue::Collect => &self.sfx_collect,
                Cue::Hit => &self.sfx_hit,
                Cue::Win => &self.sfx_win,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples
    // ════════════════════════════════════════════════════════════

    /// Sine sweep from `f0` to `f1` (exponential glide) with a decaying
    /// envelope from 0.3 down to ~0.01 over the full `duration`.
    pub(super) fn gen_sweep(f0: f32, f1: f32, glide: f32, duration: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let g = (t / glide).min(1.0);
                let freq = f0 * (f1 / f0).powf(g);
                phase += freq / SAMPLE_RATE as f32;
                let env = 0.3 * (0.01_f32 / 0.3).powf(i as f32 / n as f32);
                (phase * TAU).sin() * env
            })
            .collect()
    }

    /// Jump: 400 Hz gliding down to 200 Hz.
    fn gen_jump() -> Vec<f32> {
        gen_sweep(400.0, 200.0, 0.2, 0.3)
    }

    /// Collect: bright upward chirp.
    fn gen_collect() -> Vec<f32> {
        gen_sweep(800.0, 1200.0, 0.1, 0.3)
    }

    /// Hit: low falling buzz.
    fn gen_hit() -> Vec<f32> {
        gen_sweep(200.0, 100.0, 0.3, 0.3)
    }

    /// Win: C5 → E5 → G5, 0.1 s per note, the last one ringing out.
    pub(super) fn gen_win() -> Vec<f32> {
        let notes = [(523.0_f32, 0.1_f32), (659.0, 0.1), (784.0, 0.2)];
        let mut samples = Vec::new();
        for &(freq, dur) in &notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _cue: Cue) {}
}

#[cfg(all(test, feature = "sound"))]
mod tests {
    use super::inner::{gen_sweep, gen_win, make_wav};

    #[test]
    fn wav_header_matches_payload() {
        let samples = vec![0.0_f32, 0.5, -0.5, 1.5];
        let wav = make_wav(&samples);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + samples.len() * 2);
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size as usize, samples.len() * 2);
        // Out-of-range input is clipped
        let last = i16::from_le_bytes([wav[50], wav[51]]);
        assert_eq!(last, 32767);
    }

    #[test]
    fn sweep_stays_in_range_and_decays() {
        let s = gen_sweep(400.0, 200.0, 0.2, 0.3);
        assert!(!s.is_empty());
        assert!(s.iter().all(|v| v.abs() <= 0.3 + 1e-6));
        let head: f32 = s[..500].iter().map(|v| v.abs()).sum();
        let tail: f32 = s[s.len() - 500..].iter().map(|v| v.abs()).sum();
        assert!(tail < head);
    }

    #[test]
    fn win_is_three_notes_long() {
        let s = gen_win();
        assert_eq!(s.len(), (22050.0_f32 * 0.1) as usize * 2 + (22050.0_f32 * 0.2) as usize);
    }
}
