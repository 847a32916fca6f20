//! Submitters that record GPU operations without touching a GPU.

use vesper_render::{
    FrameUniforms, GpuSubmitter, PositionAttr, ShadeAttr, SubmitError, TextureHandle,
};

/// One recorded `upload_and_draw` call.
#[derive(Debug, Clone)]
pub struct SubmittedBatch {
    pub positions: Vec<PositionAttr>,
    pub shades: Vec<ShadeAttr>,
    pub textures: Vec<TextureHandle>,
}

impl SubmittedBatch {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Records every submission for verification in tests.
///
/// Optionally fails injected uploads to exercise error paths:
/// [`RecordingSubmitter::failing_after`] makes every `upload_and_draw` from
/// the given call index on return an error (the failed call is still
/// recorded, mirroring a submission that died on the device).
#[derive(Debug, Default)]
pub struct RecordingSubmitter {
    uniforms: Vec<FrameUniforms>,
    batches: Vec<SubmittedBatch>,
    fail_from: Option<usize>,
}

impl RecordingSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `upload_and_draw` whose zero-based call index is at least
    /// `index`.
    pub fn failing_after(index: usize) -> Self {
        Self {
            fail_from: Some(index),
            ..Self::default()
        }
    }

    /// All recorded draw calls, in issue order.
    pub fn batches(&self) -> &[SubmittedBatch] {
        &self.batches
    }

    /// Recorded per-frame uniform sets, in order.
    pub fn uniforms(&self) -> &[FrameUniforms] {
        &self.uniforms
    }

    /// Number of draw calls recorded.
    pub fn draw_call_count(&self) -> usize {
        self.batches.len()
    }

    /// Vertices summed over all recorded draw calls.
    pub fn total_vertices(&self) -> usize {
        self.batches.iter().map(SubmittedBatch::vertex_count).sum()
    }

    /// Clear recorded calls (useful between test steps).
    pub fn clear(&mut self) {
        self.uniforms.clear();
        self.batches.clear();
    }
}

impl GpuSubmitter for RecordingSubmitter {
    fn set_per_frame_uniforms(&mut self, uniforms: &FrameUniforms) -> Result<(), SubmitError> {
        self.uniforms.push(*uniforms);
        Ok(())
    }

    fn upload_and_draw(
        &mut self,
        positions: &[PositionAttr],
        shades: &[ShadeAttr],
        textures: &[TextureHandle],
    ) -> Result<(), SubmitError> {
        let index = self.batches.len();
        self.batches.push(SubmittedBatch {
            positions: positions.to_vec(),
            shades: shades.to_vec(),
            textures: textures.to_vec(),
        });

        match self.fail_from {
            Some(from) if index >= from => {
                Err(SubmitError::Backend("injected submission failure".into()))
            }
            _ => Ok(()),
        }
    }
}

/// Discards every submission; useful for benchmarks of the CPU-side loop.
#[derive(Debug, Default)]
pub struct NullSubmitter;

impl GpuSubmitter for NullSubmitter {
    fn set_per_frame_uniforms(&mut self, _uniforms: &FrameUniforms) -> Result<(), SubmitError> {
        Ok(())
    }

    fn upload_and_draw(
        &mut self,
        _positions: &[PositionAttr],
        _shades: &[ShadeAttr],
        _textures: &[TextureHandle],
    ) -> Result<(), SubmitError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_batches_in_order() {
        let mut submitter = RecordingSubmitter::new();
        submitter
            .set_per_frame_uniforms(&FrameUniforms::default())
            .unwrap();
        submitter
            .upload_and_draw(&[], &[], &[TextureHandle::from_raw(1)])
            .unwrap();

        assert_eq!(submitter.uniforms().len(), 1);
        assert_eq!(submitter.draw_call_count(), 1);
        assert_eq!(submitter.batches()[0].textures, vec![TextureHandle::from_raw(1)]);
    }

    #[test]
    fn injected_failure_fires_from_index() {
        let mut submitter = RecordingSubmitter::failing_after(1);
        assert!(submitter.upload_and_draw(&[], &[], &[]).is_ok());
        assert!(submitter.upload_and_draw(&[], &[], &[]).is_err());
        // Failed calls are still recorded.
        assert_eq!(submitter.draw_call_count(), 2);
    }
}
