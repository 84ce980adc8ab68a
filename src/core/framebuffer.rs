use nalgebra::{Vector3, Vector4};
use std::cell::UnsafeCell;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Colour and depth samples for one render target, `sample_count²` samples per
/// output pixel.
///
/// Shared by the row workers of a single draw call: depth is an atomic f32
/// bit pattern, colour writes take one of a fixed set of striped locks.
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub sample_count: usize,
    pub buffer_width: usize,
    pub buffer_height: usize,

    /// Guarded by `locks`; index `i` belongs to stripe `i % locks.len()`.
    pub color_buffer: UnsafeCell<Vec<Vector3<f32>>>,
    pub depth_buffer: Vec<AtomicU32>,
    locks: Vec<Mutex<()>>,
}

const LOCK_STRIPES: usize = 1024;

// Colour access goes through the stripe locks, depth through atomics.
unsafe impl Sync for FrameBuffer {}

impl FrameBuffer {
    pub fn new(width: usize, height: usize, sample_count: usize) -> Self {
        let sample_count = sample_count.max(1);
        let (buffer_width, buffer_height) = (width * sample_count, height * sample_count);
        let size = buffer_width * buffer_height;

        Self {
            width,
            height,
            sample_count,
            buffer_width,
            buffer_height,
            color_buffer: UnsafeCell::new(vec![Vector3::zeros(); size]),
            depth_buffer: std::iter::repeat_with(|| AtomicU32::new(f32::INFINITY.to_bits()))
                .take(size)
                .collect(),
            locks: std::iter::repeat_with(|| Mutex::new(())).take(LOCK_STRIPES).collect(),
        }
    }

    /// Resets every sample to `color` and every depth to `depth`.
    pub fn clear(&mut self, color: Vector3<f32>, depth: f32) {
        let bits = depth.to_bits();
        self.depth_buffer
            .iter_mut()
            .for_each(|d| *d.get_mut() = bits);
        self.color_buffer.get_mut().fill(color);
    }

    #[inline(always)]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.buffer_width && y < self.buffer_height
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.buffer_width + x
    }

    /// Less-than depth test that stores `new_depth` when it passes.
    #[inline]
    pub fn depth_test_and_update(&self, x: usize, y: usize, new_depth: f32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        self.depth_buffer[self.index(x, y)]
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |bits| {
                (new_depth < f32::from_bits(bits)).then_some(new_depth.to_bits())
            })
            .is_ok()
    }

    /// Depth test without writing: used while depth writes are masked off.
    #[inline]
    pub fn depth_test(&self, x: usize, y: usize, new_depth: f32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let current = f32::from_bits(self.depth_buffer[self.index(x, y)].load(Ordering::Relaxed));
        new_depth < current
    }

    /// Unconditional depth store (depth test disabled, writes enabled).
    #[inline]
    pub fn store_depth(&self, x: usize, y: usize, depth: f32) {
        if self.in_bounds(x, y) {
            self.depth_buffer[self.index(x, y)].store(depth.to_bits(), Ordering::Relaxed);
        }
    }

    pub fn depth_at(&self, x: usize, y: usize) -> Option<f32> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(f32::from_bits(
            self.depth_buffer[self.index(x, y)].load(Ordering::Relaxed),
        ))
    }

    #[inline]
    pub fn set_pixel_safe(&self, x: usize, y: usize, color: Vector3<f32>) {
        self.with_sample(x, y, |dst| *dst = color);
    }

    /// `src * alpha + dst * (1 - alpha)`
    #[inline]
    pub fn blend_pixel_safe(&self, x: usize, y: usize, color: Vector4<f32>) {
        let alpha = color.w.clamp(0.0, 1.0);
        self.with_sample(x, y, |dst| *dst = color.xyz() * alpha + *dst * (1.0 - alpha));
    }

    /// Runs `f` on one colour sample while holding its stripe lock.
    fn with_sample(&self, x: usize, y: usize, f: impl FnOnce(&mut Vector3<f32>)) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = self.index(x, y);
        // Poisoning only means another writer panicked; the samples are plain floats.
        let _guard = self.locks[idx % self.locks.len()]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // SAFETY: every write to `idx` holds the same stripe lock.
        let buffer = unsafe { &mut *self.color_buffer.get() };
        f(&mut buffer[idx]);
    }

    /// Output pixel: the mean of its samples. Only meaningful between draws.
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Vector3<f32>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        // SAFETY: draws run to completion before anyone resolves pixels.
        let buffer = unsafe { &*self.color_buffer.get() };
        let n = self.sample_count;
        let sum: Vector3<f32> = (0..n * n)
            .map(|i| buffer[self.index(x * n + i % n, y * n + i / n)])
            .sum();
        Some(sum / (n * n) as f32)
    }
}
