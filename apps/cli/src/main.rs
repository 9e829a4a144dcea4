// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

use clap::{Parser, Subcommand};
use tracing::{error, info};
use voxjob_client::TranscribeOptions;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

#[derive(Parser, Debug)]
#[command(author, version, about = "VoxJob client CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload one or more audio/video files
    Upload {
        /// Paths to files to upload
        files: Vec<String>,
        /// Server URL
        #[arg(short, long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Submit a transcription job over previously uploaded files
    Transcribe {
        /// File IDs returned by `upload`
        #[arg(long, value_delimiter = ',', required = true)]
        file_ids: Vec<String>,
        /// Recognizer backend (e.g. origin_whisper, faster_whisper, fast_conformer)
        #[arg(long)]
        model_type: String,
        /// Model size (e.g. base, large-v3)
        #[arg(long)]
        model_size: String,
        /// Language code, or "auto" to detect
        #[arg(long, default_value = "auto")]
        language: String,
        /// Device to run on
        #[arg(long, default_value = "cpu")]
        device: String,
        /// Enable speaker diarization
        #[arg(long)]
        diarization: bool,
        /// Minimum expected speaker count
        #[arg(long, default_value_t = 1)]
        min_speakers: u32,
        /// Maximum expected speaker count
        #[arg(long, default_value_t = 20)]
        max_speakers: u32,
        /// Output formats to produce, or "all"
        #[arg(long, value_delimiter = ',', default_value = "all")]
        output_formats: Vec<String>,
        /// Force word-level alignment
        #[arg(long)]
        force_alignment: bool,
        /// Named alignment provider to use for forced alignment
        #[arg(long)]
        alignment_provider: Option<String>,
        /// Request punctuation & capitalization post-processing
        #[arg(long)]
        pnc: bool,
        /// Request voice-activity-bounded recognition windows
        #[arg(long)]
        vad: bool,
        /// Server URL
        #[arg(short, long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Fetch a job's status
    Status {
        /// Job ID
        job_id: String,
        /// Server URL
        #[arg(short, long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// List enabled recognizer backends and supported model sizes
    Providers {
        /// Server URL
        #[arg(short, long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Fetch the results summary for a completed job
    Results {
        /// Job ID
        job_id: String,
        /// Server URL
        #[arg(short, long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Download one produced result format to a local file
    Download {
        /// Job ID
        job_id: String,
        /// Output format (vtt, srt, tsv, txt, json)
        format: String,
        /// Path to write the downloaded file to
        #[arg(short, long)]
        output: String,
        /// Server URL
        #[arg(short, long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Check server health
    Health {
        /// Server URL
        #[arg(short, long, default_value = DEFAULT_SERVER)]
        server: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload { files, server } => {
            info!("uploading {} file(s)", files.len());
            if let Err(e) = voxjob_client::upload(&files, &server).await {
                error!(error = %e, "upload failed");
                std::process::exit(1);
            }
        },
        Commands::Transcribe {
            file_ids,
            model_type,
            model_size,
            language,
            device,
            diarization,
            min_speakers,
            max_speakers,
            output_formats,
            force_alignment,
            alignment_provider,
            pnc,
            vad,
            server,
        } => {
            let options = TranscribeOptions {
                file_ids,
                model_type,
                model_size,
                language,
                device,
                diarization,
                min_speakers,
                max_speakers,
                output_formats,
                force_alignment,
                alignment_provider,
                pnc,
                vad,
            };
            if let Err(e) = voxjob_client::transcribe(&options, &server).await {
                error!(error = %e, "failed to submit transcription job");
                std::process::exit(1);
            }
        },
        Commands::Status { job_id, server } => {
            if let Err(e) = voxjob_client::job_status(&job_id, &server).await {
                error!(error = %e, "failed to fetch job status");
                std::process::exit(1);
            }
        },
        Commands::Providers { server } => {
            if let Err(e) = voxjob_client::providers(&server).await {
                error!(error = %e, "failed to fetch providers");
                std::process::exit(1);
            }
        },
        Commands::Results { job_id, server } => {
            if let Err(e) = voxjob_client::results_summary(&job_id, &server).await {
                error!(error = %e, "failed to fetch results summary");
                std::process::exit(1);
            }
        },
        Commands::Download { job_id, format, output, server } => {
            if let Err(e) = voxjob_client::download_result(&job_id, &format, &output, &server).await {
                error!(error = %e, "download failed");
                std::process::exit(1);
            }
        },
        Commands::Health { server } => {
            if let Err(e) = voxjob_client::health(&server).await {
                error!(error = %e, "health check failed");
                std::process::exit(1);
            }
        },
    }
}
