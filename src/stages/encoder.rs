// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::f32::consts::PI;

use crate::errors::StageConfigError;
use crate::observability::messages::{stage::BatchEncoded, StructuredLog};
use crate::records::{EncoderOutput, MemoryRequest, PositionSample};
use crate::stages::{Bank, InFlight};
use crate::traits::Stage;

const NAME: &str = "position_encoder";

/// Sinusoidal position encoder.
///
/// Projects the position through a `3F x 3` matrix `A` and emits
/// `[sin(A·x) ‖ cos(A·x)]`. Row `i` of the default matrix picks axis `i % 3`
/// scaled by `2^(i/3) / π`, one octave per group of three rows. Memory bank
/// 0 overwrites entries of `A`.
pub struct PositionEncoder {
    projection: Bank,
    in_flight: InFlight<EncoderOutput>,
    samples_in_batch: u64,
}

impl PositionEncoder {
    pub fn new(frequencies: usize, latency: u32) -> Self {
        let rows = frequencies.max(1) * 3;
        let mut projection = Bank::zeros(rows, 3);
        for row in 0..rows {
            let octave = (row / 3) as i32;
            projection.set(row, row % 3, 2f32.powi(octave) / PI);
        }
        Self {
            projection,
            in_flight: InFlight::new(latency),
            samples_in_batch: 0,
        }
    }

    /// Length of every feature vector this encoder emits.
    pub fn output_width(&self) -> usize {
        self.projection.rows() * 2
    }

    fn encode(&self, sample: &PositionSample) -> EncoderOutput {
        let projected = self.projection.mul_vec(&sample.coordinates);
        let mut features = Vec::with_capacity(projected.len() * 2);
        features.extend(projected.iter().map(|p| p.sin()));
        features.extend(projected.iter().map(|p| p.cos()));
        EncoderOutput { features }
    }
}

impl Stage for PositionEncoder {
    type Input = PositionSample;
    type Output = EncoderOutput;

    fn name(&self) -> &'static str {
        NAME
    }

    fn configure(&mut self, request: MemoryRequest) -> Result<(), StageConfigError> {
        if request.bank != 0 {
            return Err(StageConfigError::UnknownBank {
                stage: NAME,
                bank: request.bank,
            });
        }
        let address = request.address;
        if self.projection.set(address.row, address.col, request.payload) {
            Ok(())
        } else {
            Err(StageConfigError::AddressOutOfRange {
                stage: NAME,
                bank: 0,
                address,
                rows: self.projection.rows(),
                cols: self.projection.cols(),
            })
        }
    }

    fn push(&mut self, input: PositionSample) -> Result<(), PositionSample> {
        if self.in_flight.is_busy() {
            return Err(input);
        }
        self.samples_in_batch += 1;
        if input.is_last_of_batch {
            BatchEncoded {
                stage: NAME,
                samples: self.samples_in_batch,
            }
            .log();
            self.samples_in_batch = 0;
        }
        let encoded = self.encode(&input);
        self.in_flight.start(encoded);
        Ok(())
    }

    fn try_pop(&mut self) -> Option<EncoderOutput> {
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
        self.samples_in_batch = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Address;

    #[test]
    fn test_output_width_and_origin_encoding() {
        let mut encoder = PositionEncoder::new(2, 0);
        assert_eq!(encoder.output_width(), 12);

        encoder
            .push(PositionSample::new([0.0, 0.0, 0.0], false))
            .unwrap();
        let out = encoder.try_pop().unwrap();
        assert_eq!(out.features.len(), 12);
        // sin(0) for the first half, cos(0) for the second.
        assert!(out.features[..6].iter().all(|v| *v == 0.0));
        assert!(out.features[6..].iter().all(|v| *v == 1.0));
    }

    #[test]
    fn test_configured_projection_is_used() {
        let mut encoder = PositionEncoder::new(1, 0);
        for row in 0..3 {
            for col in 0..3 {
                encoder
                    .configure(MemoryRequest::encoder(row, col, 0.0))
                    .unwrap();
            }
        }
        encoder
            .configure(MemoryRequest::encoder(0, 1, PI / 2.0))
            .unwrap();

        encoder
            .push(PositionSample::new([5.0, 1.0, 7.0], false))
            .unwrap();
        let out = encoder.try_pop().unwrap();
        assert!((out.features[0] - 1.0).abs() < 1e-6);
        assert_eq!(out.features[1], 0.0);
    }

    #[test]
    fn test_out_of_range_write_is_rejected() {
        let mut encoder = PositionEncoder::new(1, 0);
        let err = encoder
            .configure(MemoryRequest::encoder(3, 0, 1.0))
            .unwrap_err();
        assert_eq!(
            err,
            StageConfigError::AddressOutOfRange {
                stage: NAME,
                bank: 0,
                address: Address { row: 3, col: 0 },
                rows: 3,
                cols: 3,
            }
        );

        let mut request = MemoryRequest::encoder(0, 0, 1.0);
        request.bank = 1;
        assert!(matches!(
            encoder.configure(request),
            Err(StageConfigError::UnknownBank { bank: 1, .. })
        ));
    }

    #[test]
    fn test_busy_encoder_refuses_input() {
        let mut encoder = PositionEncoder::new(1, 3);
        let sample = PositionSample::new([1.0, 1.0, 1.0], false);
        encoder.push(sample).unwrap();
        assert_eq!(encoder.push(sample), Err(sample));

        for _ in 0..3 {
            assert!(encoder.try_pop().is_none());
            encoder.tick();
        }
        assert!(encoder.try_pop().is_some());
        assert!(encoder.push(sample).is_ok());
    }
}
