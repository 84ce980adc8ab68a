use crate::error::AssetLoadError;

/// Grid of normalized elevation samples in [0, 1], row-major (`z` rows of `x` columns).
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    columns: usize,
    rows: usize,
    samples: Vec<f32>,
}

impl HeightField {
    pub fn new(columns: usize, rows: usize, samples: Vec<f32>) -> Result<Self, AssetLoadError> {
        if columns == 0 || rows == 0 {
            return Err(AssetLoadError::InvalidHeightField(format!(
                "grid must be at least 1x1, got {columns}x{rows}"
            )));
        }
        if samples.len() != columns * rows {
            return Err(AssetLoadError::InvalidHeightField(format!(
                "expected {} samples for a {columns}x{rows} grid, got {}",
                columns * rows,
                samples.len()
            )));
        }
        Ok(Self {
            columns,
            rows,
            samples,
        })
    }

    /// Procedural terrain: `f(u, v)` with u, v in [0, 1] across the grid.
    /// Results are clamped into [0, 1].
    pub fn from_fn(
        columns: usize,
        rows: usize,
        f: impl Fn(f32, f32) -> f32,
    ) -> Result<Self, AssetLoadError> {
        let norm = |i: usize, n: usize| if n > 1 { i as f32 / (n - 1) as f32 } else { 0.0 };
        let samples = (0..rows)
            .flat_map(|z| (0..columns).map(move |x| (x, z)))
            .map(|(x, z)| f(norm(x, columns), norm(z, rows)).clamp(0.0, 1.0))
            .collect();
        Self::new(columns, rows, samples)
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample at integer grid coordinates, clamped to the grid.
    #[inline]
    pub fn sample(&self, x: usize, z: usize) -> f32 {
        let x = x.min(self.columns - 1);
        let z = z.min(self.rows - 1);
        self.samples[z * self.columns + x]
    }
}
