use std::collections::VecDeque;

pub const FFT_SIZE: usize = 256;

/// Time-domain analyser over the most recent `fft_size` samples.
///
/// Byte output follows the usual 8-bit convention: 128 is silence, 0 and 255
/// are full-scale negative and positive.
#[derive(Debug)]
pub struct Analyser {
    fft_size: usize,
    window: VecDeque<f32>,
}

impl Default for Analyser {
    fn default() -> Self {
        Self::new(FFT_SIZE)
    }
}

impl Analyser {
    pub fn new(fft_size: usize) -> Self {
        let fft_size = fft_size.max(2);
        Self {
            fft_size,
            window: std::iter::repeat(0.0).take(fft_size).collect(),
        }
    }

    /// Half the FFT size; also the length of a time-domain read.
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Feed mono samples in [-1, 1].
    pub fn push(&mut self, samples: &[f32]) {
        let keep = samples.len().min(self.fft_size);
        for _ in 0..keep {
            self.window.pop_front();
        }
        self.window
            .extend(samples[samples.len() - keep..].iter().copied());
    }

    /// Forget everything; reads return silence.
    pub fn reset(&mut self) {
        self.window.iter_mut().for_each(|s| *s = 0.0);
    }

    /// Fill `out` with the start of the current window as bytes.
    pub fn byte_time_domain(&self, out: &mut [u8]) {
        for (dst, &s) in out.iter_mut().zip(self.window.iter()) {
            *dst = (128.0 * (1.0 + s)).clamp(0.0, 255.0) as u8;
        }
    }
}

/// Little-endian signed 16-bit PCM to floats.
pub fn s16le_to_f32(bytes: &[u8], out: &mut Vec<f32>) {
    out.extend(
        bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_is_128() {
        let a = Analyser::default();
        let mut out = vec![0u8; a.frequency_bin_count()];
        a.byte_time_domain(&mut out);
        assert_eq!(out.len(), 128);
        assert!(out.iter().all(|&b| b == 128));
    }

    #[test]
    fn test_full_scale_clamps() {
        let mut a = Analyser::new(4);
        a.push(&[1.0, -1.0, 0.5, 2.0]);
        let mut out = [0u8; 4];
        a.byte_time_domain(&mut out);
        assert_eq!(out, [255, 0, 192, 255]);
    }

    #[test]
    fn test_window_keeps_latest() {
        let mut a = Analyser::new(4);
        a.push(&[0.1, 0.2, 0.3]);
        a.push(&[0.5, 0.5, 0.5, 0.5, -0.5, -0.5]);
        let mut out = [0u8; 4];
        a.byte_time_domain(&mut out);
        assert_eq!(out, [192, 192, 64, 64]);

        a.reset();
        a.byte_time_domain(&mut out);
        assert_eq!(out, [128; 4]);
    }

    #[test]
    fn test_s16le() {
        let mut out = Vec::new();
        s16le_to_f32(&[0x00, 0x80, 0x00, 0x00, 0xff, 0x7f, 0x01], &mut out);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], -1.0);
        assert_eq!(out[1], 0.0);
        assert!(out[2] > 0.999);
    }
}
