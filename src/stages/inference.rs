// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::INFERENCE_OUTPUT_WIDTH;
use crate::errors::StageConfigError;
use crate::records::{EncoderOutput, InferenceOutput, MemoryRequest};
use crate::stages::{Bank, InFlight};
use crate::traits::Stage;

const NAME: &str = "dense_inference";

/// Bank holding the hidden layer weights (`hidden x input`).
pub const HIDDEN_BANK: u8 = 0;
/// Bank holding the output layer weights (`4 x hidden`).
pub const OUTPUT_BANK: u8 = 1;

/// Two-layer dense network: `out = W1 · relu(W0 · x)`.
///
/// Weights start at zero and are filled through the configuration port.
pub struct DenseInference {
    hidden: Bank,
    output: Bank,
    in_flight: InFlight<InferenceOutput>,
}

impl DenseInference {
    pub fn new(input_width: usize, hidden_width: usize, latency: u32) -> Self {
        Self {
            hidden: Bank::zeros(hidden_width, input_width),
            output: Bank::zeros(INFERENCE_OUTPUT_WIDTH, hidden_width),
            in_flight: InFlight::new(latency),
        }
    }

    fn infer(&self, input: &EncoderOutput) -> InferenceOutput {
        let activations: Vec<f32> = self
            .hidden
            .mul_vec(&input.features)
            .into_iter()
            .map(|v| v.max(0.0))
            .collect();
        let result = self.output.mul_vec(&activations);

        let mut features = [0.0; INFERENCE_OUTPUT_WIDTH];
        features.copy_from_slice(&result[..INFERENCE_OUTPUT_WIDTH]);
        InferenceOutput { features }
    }
}

impl Stage for DenseInference {
    type Input = EncoderOutput;
    type Output = InferenceOutput;

    fn name(&self) -> &'static str {
        NAME
    }

    fn configure(&mut self, request: MemoryRequest) -> Result<(), StageConfigError> {
        let bank = match request.bank {
            HIDDEN_BANK => &mut self.hidden,
            OUTPUT_BANK => &mut self.output,
            other => {
                return Err(StageConfigError::UnknownBank {
                    stage: NAME,
                    bank: other,
                })
            }
        };
        let address = request.address;
        if bank.set(address.row, address.col, request.payload) {
            Ok(())
        } else {
            Err(StageConfigError::AddressOutOfRange {
                stage: NAME,
                bank: request.bank,
                address,
                rows: bank.rows(),
                cols: bank.cols(),
            })
        }
    }

    fn push(&mut self, input: EncoderOutput) -> Result<(), EncoderOutput> {
        if self.in_flight.is_busy() {
            return Err(input);
        }
        let result = self.infer(&input);
        self.in_flight.start(result);
        Ok(())
    }

    fn try_pop(&mut self) -> Option<InferenceOutput> {
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
    }
}
