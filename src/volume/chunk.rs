//! Chunk planning for block-parallel volume processing.
//!
//! The planner balances per-block memory against block count: it targets a
//! fixed number of bytes per block and derives a chunk shape that tiles the
//! volume exactly. A preview hint pins one axis to its full extent so slices
//! in that orientation can be screened without touching every block.

use crate::error::{AttributeError, AttributeResult};

/// Target bytes per block before halo extension.
const TARGET_BLOCK_BYTES: usize = 32 << 20;

/// Orientation hint for interactive screening.
///
/// Naming follows seismic convention: `Inline` is axis 0, `Crossline` is
/// axis 1, `Depth` (time) is axis 2, the fast axis traces run along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewAxis {
    Inline,
    Crossline,
    Depth,
}

impl PreviewAxis {
    /// The volume axis this orientation keeps unsplit.
    pub fn axis(&self) -> usize {
        match self {
            Self::Inline => 0,
            Self::Crossline => 1,
            Self::Depth => 2,
        }
    }
}

/// Decide a chunk shape for a volume.
///
/// The returned shape tiles the volume exactly: chunk sizes along an axis
/// sum to that axis's extent, with the final chunk possibly smaller.
///
/// # Arguments
///
/// * `shape` - Volume extents, all positive
/// * `itemsize` - Bytes per element
/// * `kernel` - Optional operator footprint (odd positive extents). Each
///   chunk is forced to hold at least one full window along every axis, and
///   a split axis's tail chunk is kept at zero or at least the kernel
///   extent so halo extension never needs second-neighbor data.
/// * `preview` - Optional axis to keep at full extent; only the remaining
///   two axes are split, against a proportionally reduced byte target.
///
/// # Errors
///
/// [`AttributeError::Configuration`] when the volume cannot hold one full
/// window along some axis, or when an argument is degenerate.
pub fn compute_chunk_shape(
    shape: [usize; 3],
    itemsize: usize,
    kernel: Option<[usize; 3]>,
    preview: Option<PreviewAxis>,
) -> AttributeResult<[usize; 3]> {
    if shape.iter().any(|&s| s == 0) {
        return Err(AttributeError::Configuration {
            context: format!("volume extents must be positive, got {:?}", shape),
        });
    }
    if itemsize == 0 {
        return Err(AttributeError::Configuration {
            context: "itemsize must be positive".to_string(),
        });
    }
    if let Some(k) = kernel {
        for axis in 0..3 {
            if k[axis] == 0 || k[axis] % 2 == 0 {
                return Err(AttributeError::Configuration {
                    context: format!("kernel extents must be odd and positive, got {:?}", k),
                });
            }
            if k[axis] > shape[axis] {
                return Err(AttributeError::Configuration {
                    context: format!(
                        "kernel {:?} exceeds volume extent {} along axis {}",
                        k, shape[axis], axis
                    ),
                });
            }
        }
    }

    let target_elems = (TARGET_BLOCK_BYTES / itemsize).max(1);
    let mut chunk = [0usize; 3];

    match preview {
        Some(p) => {
            let pinned = p.axis();
            chunk[pinned] = shape[pinned];
            // The pinned axis consumes its share of the target up front.
            let per_slab = (target_elems / shape[pinned]).max(1);
            let side = (per_slab as f64).sqrt().round().max(1.0) as usize;
            for axis in 0..3 {
                if axis != pinned {
                    chunk[axis] = side.min(shape[axis]);
                }
            }
        }
        None => {
            let side = (target_elems as f64).cbrt().round().max(1.0) as usize;
            for axis in 0..3 {
                chunk[axis] = side.min(shape[axis]);
            }
        }
    }

    for axis in 0..3 {
        let floor = kernel.map_or(1, |k| k[axis]);
        chunk[axis] = chunk[axis].max(floor).min(shape[axis]);
        chunk[axis] = fit_axis(shape[axis], chunk[axis], floor);
    }

    Ok(chunk)
}

/// Shrink a chunk size until the tail chunk is zero or at least `floor`.
///
/// Falls back to a single full-extent chunk when no size in
/// `[floor, initial]` leaves an admissible tail.
fn fit_axis(extent: usize, initial: usize, floor: usize) -> usize {
    let mut size = initial;
    while size >= floor {
        let tail = extent % size;
        if tail == 0 || tail >= floor {
            return size;
        }
        size -= 1;
    }
    extent
}

/// A concrete tiling of a volume: per-axis chunk-size lists.
///
/// Invariant: the sizes along each axis sum exactly to that axis's extent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    shape: [usize; 3],
    chunks: [Vec<usize>; 3],
}

impl ChunkPlan {
    /// Materialize the tiling implied by a chunk shape.
    pub fn new(shape: [usize; 3], chunk_shape: [usize; 3]) -> AttributeResult<Self> {
        let mut chunks: [Vec<usize>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for axis in 0..3 {
            if chunk_shape[axis] == 0 || chunk_shape[axis] > shape[axis] {
                return Err(AttributeError::Configuration {
                    context: format!(
                        "chunk shape {:?} invalid for volume shape {:?} along axis {}",
                        chunk_shape, shape, axis
                    ),
                });
            }
            let mut remaining = shape[axis];
            while remaining > 0 {
                let size = chunk_shape[axis].min(remaining);
                chunks[axis].push(size);
                remaining -= size;
            }
        }
        Ok(Self { shape, chunks })
    }

    /// Volume shape this plan tiles.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Chunk sizes along an axis.
    pub fn chunks(&self, axis: usize) -> &[usize] {
        &self.chunks[axis]
    }

    /// Block count per axis.
    pub fn grid(&self) -> [usize; 3] {
        [
            self.chunks[0].len(),
            self.chunks[1].len(),
            self.chunks[2].len(),
        ]
    }

    /// Start offsets of the chunks along an axis.
    pub fn starts(&self, axis: usize) -> Vec<usize> {
        let mut starts = Vec::with_capacity(self.chunks[axis].len());
        let mut offset = 0;
        for &size in &self.chunks[axis] {
            starts.push(offset);
            offset += size;
        }
        starts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_tiles_exactly() {
        let plan = ChunkPlan::new([100, 70, 33], [33, 33, 33]).unwrap();
        for axis in 0..3 {
            let total: usize = plan.chunks(axis).iter().sum();
            assert_eq!(total, plan.shape()[axis]);
        }
        assert_eq!(plan.grid(), [4, 3, 1]);
        assert_eq!(plan.starts(0), vec![0, 33, 66, 99]);
        assert_eq!(plan.chunks(0), &[33, 33, 33, 1]);
    }

    #[test]
    fn test_plan_rejects_oversized_chunk() {
        assert!(ChunkPlan::new([10, 10, 10], [11, 10, 10]).is_err());
        assert!(ChunkPlan::new([10, 10, 10], [0, 10, 10]).is_err());
    }

    #[test]
    fn test_preview_pins_depth_axis() {
        let chunk =
            compute_chunk_shape([100, 100, 100], 4, Some([1, 1, 25]), Some(PreviewAxis::Depth))
                .unwrap();
        assert_eq!(chunk[2], 100);
        assert!(chunk[0] <= 100 && chunk[1] <= 100);
    }

    #[test]
    fn test_preview_splits_only_remaining_axes() {
        let chunk = compute_chunk_shape(
            [2000, 2000, 1000],
            4,
            Some([1, 1, 25]),
            Some(PreviewAxis::Depth),
        )
        .unwrap();
        assert_eq!(chunk[2], 1000);
        assert!(chunk[0] < 2000);
        assert!(chunk[1] < 2000);
    }

    #[test]
    fn test_kernel_lower_bound() {
        let chunk = compute_chunk_shape([64, 64, 4000], 8, Some([1, 1, 129]), None).unwrap();
        assert!(chunk[2] >= 129);
    }

    #[test]
    fn test_kernel_larger_than_volume_is_rejected() {
        let err = compute_chunk_shape([100, 100, 10], 4, Some([1, 1, 25]), None).unwrap_err();
        assert!(err.to_string().contains("axis 2"));
    }

    #[test]
    fn test_even_kernel_is_rejected() {
        assert!(compute_chunk_shape([100, 100, 100], 4, Some([1, 1, 24]), None).is_err());
    }

    #[test]
    fn test_tail_fits_kernel() {
        // Whatever chunk size the planner picks, a nonzero tail chunk must
        // hold at least one full window along the kernel axis.
        let chunk = compute_chunk_shape([64, 64, 1001], 4, Some([1, 1, 25]), None).unwrap();
        let tail = 1001 % chunk[2];
        assert!(tail == 0 || tail >= 25);
    }

    #[test]
    fn test_fit_axis_falls_back_to_full_extent() {
        // extent 7, floor 5: sizes 5 and 6 both leave tails 1..=2 < 5.
        assert_eq!(fit_axis(7, 6, 5), 7);
        assert_eq!(fit_axis(8, 4, 4), 4);
    }
}
