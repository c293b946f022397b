// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::records::Address;

/// A memory write a stage refused to apply.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageConfigError {
    /// The stage has no memory bank with this index.
    #[error("Stage '{stage}' has no memory bank {bank}")]
    UnknownBank { stage: &'static str, bank: u8 },

    /// The address lies outside the bank's dimensions.
    #[error("Stage '{stage}' bank {bank}: address ({}, {}) outside {rows}x{cols}", .address.row, .address.col)]
    AddressOutOfRange {
        stage: &'static str,
        bank: u8,
        address: Address,
        rows: usize,
        cols: usize,
    },

    /// The stage takes no configuration.
    #[error("Stage '{stage}' is not configurable")]
    NotConfigurable { stage: &'static str },
}
