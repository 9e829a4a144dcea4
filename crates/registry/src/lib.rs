// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! VoxJob Registry — the recognizer cache of spec §4.2: at-most-one load
//! per key, keyed reuse across jobs, and explicit release.

pub mod error;
pub mod registry;

pub use error::RegistryError;
pub use registry::{RecognizerHandle, Registry, RegistryStats};
