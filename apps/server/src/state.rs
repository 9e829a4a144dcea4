// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Shared application state handed to every axum handler, following the
//! teacher's `AppState` pattern.

use std::sync::Arc;

use voxjob_db::DbPool;
use voxjob_diarize::EmbeddingExtractor;
use voxjob_pipeline::JobRuntime;
use voxjob_registry::Registry;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub runtime: JobRuntime,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config, db: DbPool, embedding_extractor: Arc<dyn EmbeddingExtractor>) -> Self {
        let storage = voxjob_pipeline::StorageLayout::new(config.storage.root.clone());
        let registry = Arc::new(Registry::new(config.backends.to_runtime()));
        let job_semaphore = Arc::new(tokio::sync::Semaphore::new(config.jobs.max_concurrent));

        let runtime = JobRuntime {
            db,
            registry,
            embedding_extractor,
            aligner: Arc::new(voxjob_recognizers::NoopAligner),
            storage,
            write_options: voxjob_formats::WriteOptions::default(),
            clustering_params: voxjob_diarize::ClusteringParams::default(),
            retry_policy: voxjob_pipeline::RetryPolicy::default(),
            job_semaphore,
        };

        Self { config: Arc::new(config), runtime }
    }

    #[must_use]
    pub fn db(&self) -> &DbPool {
        &self.runtime.db
    }
}
