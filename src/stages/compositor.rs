// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::records::{CompositorInput, CompositorOutput};
use crate::stages::InFlight;
use crate::traits::Stage;

const NAME: &str = "volume_compositor";

/// Emission/absorption compositor.
///
/// For each sample: `alpha = 1 - exp(-max(density, 0) * step)`, the running
/// colour gains `T * alpha * emitted`, and transmittance `T` shrinks by
/// `1 - alpha`. The running colour is emitted after every sample. The ray
/// accumulator restarts every `samples_per_ray` samples (never when zero).
pub struct VolumeCompositor {
    samples_per_ray: usize,
    samples_seen: usize,
    color: [f32; 3],
    transmittance: f32,
    in_flight: InFlight<CompositorOutput>,
}

impl VolumeCompositor {
    pub fn new(samples_per_ray: usize, latency: u32) -> Self {
        Self {
            samples_per_ray,
            samples_seen: 0,
            color: [0.0; 3],
            transmittance: 1.0,
            in_flight: InFlight::new(latency),
        }
    }

    fn restart_ray(&mut self) {
        self.samples_seen = 0;
        self.color = [0.0; 3];
        self.transmittance = 1.0;
    }

    fn composite(&mut self, input: &CompositorInput) -> CompositorOutput {
        if self.samples_per_ray > 0 && self.samples_seen == self.samples_per_ray {
            self.restart_ray();
        }

        let alpha = 1.0 - (-input.density.max(0.0) * input.step_size).exp();
        let weight = self.transmittance * alpha;
        for (acc, emitted) in self.color.iter_mut().zip(input.emitted_color) {
            *acc += weight * emitted;
        }
        self.transmittance *= 1.0 - alpha;
        self.samples_seen += 1;

        CompositorOutput { color: self.color }
    }
}

impl Stage for VolumeCompositor {
    type Input = CompositorInput;
    type Output = CompositorOutput;

    fn name(&self) -> &'static str {
        NAME
    }

    fn push(&mut self, input: CompositorInput) -> Result<(), CompositorInput> {
        if self.in_flight.is_busy() {
            return Err(input);
        }
        let output = self.composite(&input);
        self.in_flight.start(output);
        Ok(())
    }

    fn try_pop(&mut self) -> Option<CompositorOutput> {
        self.in_flight.take_ready()
    }

    fn tick(&mut self) {
        self.in_flight.tick();
    }

    fn is_idle(&self) -> bool {
        !self.in_flight.is_busy()
    }

    fn reset(&mut self) {
        self.in_flight.clear();
        self.restart_ray();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StageConfigError;
    use crate::records::MemoryRequest;

    fn sample(color: [f32; 3], density: f32) -> CompositorInput {
        CompositorInput {
            emitted_color: color,
            density,
            step_size: 1.0,
        }
    }

    fn run(compositor: &mut VolumeCompositor, input: CompositorInput) -> [f32; 3] {
        compositor.push(input).unwrap();
        compositor.try_pop().unwrap().color
    }

    #[test]
    fn test_zero_density_contributes_nothing() {
        let mut compositor = VolumeCompositor::new(0, 0);
        assert_eq!(run(&mut compositor, sample([1.0, 1.0, 1.0], 0.0)), [0.0; 3]);
    }

    #[test]
    fn test_accumulates_with_transmittance() {
        let mut compositor = VolumeCompositor::new(0, 0);
        let density = std::f32::consts::LN_2; // alpha = 0.5 at step 1
        let first = run(&mut compositor, sample([1.0, 0.0, 0.0], density));
        assert!((first[0] - 0.5).abs() < 1e-6);

        let second = run(&mut compositor, sample([1.0, 0.0, 0.0], density));
        assert!((second[0] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_negative_density_is_clamped() {
        let mut compositor = VolumeCompositor::new(0, 0);
        assert_eq!(run(&mut compositor, sample([1.0, 1.0, 1.0], -3.0)), [0.0; 3]);
    }

    #[test]
    fn test_ray_restarts_after_samples_per_ray() {
        let mut compositor = VolumeCompositor::new(1, 0);
        let density = std::f32::consts::LN_2;
        let first = run(&mut compositor, sample([0.0, 1.0, 0.0], density));
        let second = run(&mut compositor, sample([0.0, 1.0, 0.0], density));
        assert_eq!(first, second);
    }

    #[test]
    fn test_compositor_is_not_configurable() {
        let mut compositor = VolumeCompositor::new(0, 0);
        assert_eq!(
            compositor.configure(MemoryRequest::encoder(0, 0, 1.0)),
            Err(StageConfigError::NotConfigurable { stage: NAME })
        );
    }
}
