// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! VoxJob Recognizers — the adapter interface of spec §4.1 over the
//! heterogeneous ASR backend fleet, plus the scaffold and subprocess
//! adapters that stand in for the (out-of-scope) model code.

pub mod align;
pub mod backends;
pub mod error;
pub mod factory;
pub mod fast_conformer;
pub mod recognizer;
pub mod stub;

pub use align::{Aligner, NoopAligner};
pub use backends::BackendsConfig;
pub use error::RecognizerError;
pub use fast_conformer::FastConformerConfig;
pub use recognizer::{scoped, Recognizer};
