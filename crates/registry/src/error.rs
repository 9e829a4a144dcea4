// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

use thiserror::Error;
use voxjob_recognizers::RecognizerError;

#[derive(Debug, Error, Clone)]
pub enum RegistryError {
    #[error(transparent)]
    Recognizer(#[from] RecognizerError),

    #[error("recognizer for {0} is not cached")]
    NotCached(String),

    #[error("recognizer for {0} is still in use and was not released")]
    StillInUse(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

impl From<RegistryError> for voxjob_core::VoxJobError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Recognizer(inner) => inner.into(),
            RegistryError::NotCached(key) | RegistryError::StillInUse(key) => Self::Validation(key),
        }
    }
}
