//! Block decomposition of a volume, with halo extension and trimming.
//!
//! A [`ChunkedVolume`] is a grid of blocks covering a volume exactly. Blocks
//! may carry a halo: extra samples on each face taken from the neighboring
//! block's data (or from a [`BoundaryFill`] policy on the outermost faces),
//! so a windowed operator applied per block produces the same interior
//! values as a global application of the same short-support operator.
//!
//! Round trip guarantee: `extend` followed by `trim` with a matching
//! half-window, then `assemble`, recovers the original volume exactly.
//! Boundary-filled samples only live in the halo and are never read back.

use crate::error::{AttributeError, AttributeResult};
use crate::volume::boundary::{pad_volume, BoundaryFill};
use crate::volume::chunk::ChunkPlan;
use crate::volume::as_volume_shape;
use numr::ops::{ScalarOps, ShapeOps, TensorOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

/// A volume partitioned into a grid of blocks, each possibly halo-extended.
#[derive(Debug, Clone)]
pub struct ChunkedVolume<R: Runtime> {
    blocks: Vec<Tensor<R>>,
    plan: ChunkPlan,
    halo: [usize; 3],
}

impl<R: Runtime> ChunkedVolume<R> {
    /// Partition a volume per the plan, without a halo.
    pub fn split(volume: &Tensor<R>, plan: ChunkPlan) -> AttributeResult<Self> {
        let shape = as_volume_shape(volume.shape(), "split")?;
        if shape != plan.shape() {
            return Err(AttributeError::ShapeMismatch {
                expected: plan.shape().to_vec(),
                actual: volume.shape().to_vec(),
                context: "chunk plan".to_string(),
            });
        }
        let blocks = cut_blocks(volume, &plan, [0, 0, 0])?;
        Ok(Self {
            blocks,
            plan,
            halo: [0, 0, 0],
        })
    }

    /// Partition a volume per the plan and grow every block by the halo.
    ///
    /// Interior faces read the neighboring block's data; outer faces use the
    /// fill policy. Fails when a half-window exceeds the size of any block
    /// that has a neighbor along that axis, since that would require data
    /// from beyond the immediate neighbor.
    pub fn extend<C>(
        client: &C,
        volume: &Tensor<R>,
        plan: ChunkPlan,
        halo: [usize; 3],
        fill: &BoundaryFill<R>,
    ) -> AttributeResult<Self>
    where
        C: ScalarOps<R> + ShapeOps<R> + TensorOps<R> + RuntimeClient<R>,
    {
        let shape = as_volume_shape(volume.shape(), "extend")?;
        if shape != plan.shape() {
            return Err(AttributeError::ShapeMismatch {
                expected: plan.shape().to_vec(),
                actual: volume.shape().to_vec(),
                context: "chunk plan".to_string(),
            });
        }
        for axis in 0..3 {
            let sizes = plan.chunks(axis);
            if sizes.len() > 1 {
                let smallest = sizes.iter().copied().min().unwrap_or(0);
                if halo[axis] > smallest {
                    return Err(AttributeError::Configuration {
                        context: format!(
                            "halo {} exceeds smallest chunk {} along axis {}",
                            halo[axis], smallest, axis
                        ),
                    });
                }
            }
        }

        let padded = pad_volume(client, volume, halo, fill)?;
        let blocks = cut_blocks(&padded, &plan, halo)?;
        Ok(Self { blocks, plan, halo })
    }

    /// The tiling this volume was partitioned with.
    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    /// Halo currently carried by each block.
    pub fn halo(&self) -> [usize; 3] {
        self.halo
    }

    /// The blocks, row-major over the grid (inline outermost, depth innermost).
    pub fn blocks(&self) -> &[Tensor<R>] {
        &self.blocks
    }

    /// Apply an operator to every block, keeping layout and halo.
    ///
    /// The operator must preserve block shape; anything else is an error.
    pub fn map<F>(&self, mut op: F) -> AttributeResult<Self>
    where
        F: FnMut(&Tensor<R>) -> AttributeResult<Tensor<R>>,
    {
        let mut mapped = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            let out = op(block)?;
            if out.shape() != block.shape() {
                return Err(AttributeError::ShapeMismatch {
                    expected: block.shape().to_vec(),
                    actual: out.shape().to_vec(),
                    context: "block operator output".to_string(),
                });
            }
            mapped.push(out);
        }
        self.with_blocks(mapped)
    }

    /// Rebuild with replacement blocks of identical shapes.
    pub fn with_blocks(&self, blocks: Vec<Tensor<R>>) -> AttributeResult<Self> {
        if blocks.len() != self.blocks.len() {
            return Err(AttributeError::Configuration {
                context: format!(
                    "expected {} blocks, got {}",
                    self.blocks.len(),
                    blocks.len()
                ),
            });
        }
        for (old, new) in self.blocks.iter().zip(&blocks) {
            if old.shape() != new.shape() {
                return Err(AttributeError::ShapeMismatch {
                    expected: old.shape().to_vec(),
                    actual: new.shape().to_vec(),
                    context: "replacement block".to_string(),
                });
            }
        }
        Ok(Self {
            blocks,
            plan: self.plan.clone(),
            halo: self.halo,
        })
    }

    /// Remove `kernel[axis] / 2` samples from every side of every block.
    pub fn trim(&self, kernel: [usize; 3]) -> AttributeResult<Self> {
        let hw = [kernel[0] / 2, kernel[1] / 2, kernel[2] / 2];
        for axis in 0..3 {
            if hw[axis] > self.halo[axis] {
                return Err(AttributeError::Configuration {
                    context: format!(
                        "trim half-window {} exceeds halo {} along axis {}",
                        hw[axis], self.halo[axis], axis
                    ),
                });
            }
        }

        let mut trimmed = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            let mut cut = block.clone();
            for axis in 0..3 {
                if hw[axis] > 0 {
                    let len = cut.shape()[axis];
                    cut = cut.narrow(axis as isize, hw[axis], len - 2 * hw[axis])?;
                }
            }
            trimmed.push(cut);
        }
        Ok(Self {
            blocks: trimmed,
            plan: self.plan.clone(),
            halo: [
                self.halo[0] - hw[0],
                self.halo[1] - hw[1],
                self.halo[2] - hw[2],
            ],
        })
    }

    /// Concatenate the blocks back into a single volume.
    ///
    /// Blocks must carry no halo: overlapping blocks cannot be reassembled.
    pub fn assemble<C>(&self, client: &C) -> AttributeResult<Tensor<R>>
    where
        C: ShapeOps<R> + RuntimeClient<R>,
    {
        if self.halo != [0, 0, 0] {
            return Err(AttributeError::Configuration {
                context: format!("assemble requires trimmed blocks, halo is {:?}", self.halo),
            });
        }
        let grid = self.plan.grid();

        let mut slabs = Vec::with_capacity(grid[0]);
        for i in 0..grid[0] {
            let mut strips = Vec::with_capacity(grid[1]);
            for j in 0..grid[1] {
                let row_start = (i * grid[1] + j) * grid[2];
                let row: Vec<&Tensor<R>> =
                    self.blocks[row_start..row_start + grid[2]].iter().collect();
                strips.push(cat_or_clone(client, &row, 2)?);
            }
            let strip_refs: Vec<&Tensor<R>> = strips.iter().collect();
            slabs.push(cat_or_clone(client, &strip_refs, 1)?);
        }
        let slab_refs: Vec<&Tensor<R>> = slabs.iter().collect();
        cat_or_clone(client, &slab_refs, 0)
    }
}

/// Concatenate along an axis, skipping the call for a single part.
fn cat_or_clone<R, C>(client: &C, parts: &[&Tensor<R>], axis: isize) -> AttributeResult<Tensor<R>>
where
    R: Runtime,
    C: ShapeOps<R> + RuntimeClient<R>,
{
    if parts.len() == 1 {
        Ok(parts[0].contiguous())
    } else {
        Ok(client.cat(parts, axis)?)
    }
}

/// Cut the grid of blocks out of a (possibly padded) volume.
///
/// A block covering `[start, start + size)` of the original volume occupies
/// `[start, start + size + 2 * halo)` of the padded volume.
fn cut_blocks<R: Runtime>(
    padded: &Tensor<R>,
    plan: &ChunkPlan,
    halo: [usize; 3],
) -> AttributeResult<Vec<Tensor<R>>> {
    let grid = plan.grid();
    let starts = [plan.starts(0), plan.starts(1), plan.starts(2)];

    let mut blocks = Vec::with_capacity(grid[0] * grid[1] * grid[2]);
    for i in 0..grid[0] {
        for j in 0..grid[1] {
            for k in 0..grid[2] {
                let idx = [i, j, k];
                let mut block = padded.clone();
                for axis in 0..3 {
                    let start = starts[axis][idx[axis]];
                    let size = plan.chunks(axis)[idx[axis]] + 2 * halo[axis];
                    block = block.narrow(axis as isize, start, size)?;
                }
                blocks.push(block);
            }
        }
    }
    Ok(blocks)
}
