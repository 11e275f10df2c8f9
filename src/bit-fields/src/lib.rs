// Copyright 2022 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Small helpers for reading and writing sub-byte/sub-word ranges out of an
//! integer, plus the [`bitfield!`] macro for defining named bit-field structs.

mod bit_range;
mod errors;

pub use bit_fields_macros::bitfield;
pub use bit_range::{BitRange, BitRangeMut};
pub use errors::*;
