use rodio::Source;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::num::NonZero;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fixed transform size; half of it is the number of frequency bins.
pub const FFT_SIZE: usize = 256;
pub const BIN_COUNT: usize = FFT_SIZE / 2;

/// Smoothing factor trading responsiveness for visual stability.
const SMOOTHING: f32 = 0.8;
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

#[derive(Debug)]
struct SpectrumState {
    smoothed: [f32; BIN_COUNT],
    bins: [u8; BIN_COUNT],
}

/// Shared view of the latest byte-valued frequency snapshot.
#[derive(Debug, Clone)]
pub struct SpectrumHandle {
    state: Arc<Mutex<SpectrumState>>,
}

impl SpectrumHandle {
    fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SpectrumState {
                smoothed: [0.0; BIN_COUNT],
                bins: [0; BIN_COUNT],
            })),
        }
    }

    pub fn bins(&self) -> [u8; BIN_COUNT] {
        self.state
            .lock()
            .map(|state| state.bins)
            .unwrap_or([0; BIN_COUNT])
    }

    pub fn same_graph(&self, other: &SpectrumHandle) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    fn write_magnitudes(&self, magnitudes: &[f32; BIN_COUNT]) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        for (index, magnitude) in magnitudes.iter().enumerate() {
            let smoothed = state.smoothed[index] * SMOOTHING + magnitude * (1.0 - SMOOTHING);
            state.smoothed[index] = smoothed;
            let db = 20.0 * smoothed.max(f32::MIN_POSITIVE).log10();
            let scaled = (db - MIN_DB) / (MAX_DB - MIN_DB);
            state.bins[index] = (scaled.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
    }
}

/// Construction slot for the analysis graph. The `Option` itself is the
/// idempotence guard: `ensure` builds at most once per engine lifetime.
#[derive(Debug, Default)]
pub struct SpectrumBridge {
    handle: Option<SpectrumHandle>,
}

impl SpectrumBridge {
    pub fn ensure(&mut self) -> SpectrumHandle {
        self.handle.get_or_insert_with(SpectrumHandle::new).clone()
    }

    pub fn handle(&self) -> Option<SpectrumHandle> {
        self.handle.clone()
    }
}

/// Passes samples through unchanged while feeding mono-mixed windows into
/// the FFT.
pub struct SpectrumTap<S> {
    inner: S,
    handle: SpectrumHandle,
    window: Vec<f32>,
    frame_sum: f32,
    frame_filled: u16,
    channels: NonZero<u16>,
    sample_rate: NonZero<u32>,
    fft: Arc<dyn Fft<f32>>,
}

impl<S> SpectrumTap<S>
where
    S: Source<Item = f32>,
{
    pub fn new(source: S, handle: SpectrumHandle) -> Self {
        let channels = source.channels();
        let sample_rate = source.sample_rate();
        Self {
            inner: source,
            handle,
            window: Vec::with_capacity(FFT_SIZE),
            frame_sum: 0.0,
            frame_filled: 0,
            channels,
            sample_rate,
            fft: FftPlanner::new().plan_fft_forward(FFT_SIZE),
        }
    }

    fn process_window(&mut self) {
        let mut buffer: Vec<Complex<f32>> = self
            .window
            .iter()
            .enumerate()
            .map(|(index, &sample)| {
                let hann = 0.5
                    * (1.0
                        - (2.0 * std::f32::consts::PI * index as f32 / FFT_SIZE as f32).cos());
                Complex::new(sample * hann, 0.0)
            })
            .collect();

        self.fft.process(&mut buffer);

        let mut magnitudes = [0.0_f32; BIN_COUNT];
        for (index, magnitude) in magnitudes.iter_mut().enumerate() {
            *magnitude = buffer[index].norm() / FFT_SIZE as f32;
        }
        self.handle.write_magnitudes(&magnitudes);
        self.window.clear();
    }
}

impl<S> Iterator for SpectrumTap<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.inner.next()?;

        self.frame_sum += sample;
        self.frame_filled += 1;
        if self.frame_filled == self.channels.get() {
            self.window
                .push(self.frame_sum / f32::from(self.channels.get()));
            self.frame_sum = 0.0;
            self.frame_filled = 0;
            if self.window.len() >= FFT_SIZE {
                self.process_window();
            }
        }

        Some(sample)
    }
}

impl<S> Source for SpectrumTap<S>
where
    S: Source<Item = f32>,
{
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> NonZero<u16> {
        self.channels
    }

    fn sample_rate(&self) -> NonZero<u32> {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, position: Duration) -> Result<(), rodio::source::SeekError> {
        self.inner.try_seek(position)
    }
}
