// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Passwerk: identity photos from ordinary portraits.
//
// Entry point. Initialises logging, resolves configuration, wires the rembg
// segmenter into the photo pipeline and renders one file. Ctrl-C cancels an
// in-flight segmentation request.

mod cli;
mod services;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use passwerk_core::human_errors::{HumanError, humanize_error};
use passwerk_image::PhotoPipeline;
use passwerk_segment::{CancelToken, RembgHttpSegmenter, SegmentationClient};
use tracing::{error, info, warn};

use cli::Cli;
use services::{config_dir, render};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(input = %cli.input.display(), "Passwerk starting");

    let config = match config_dir::resolve_config(cli.config.as_deref()) {
        Ok(config) => cli.apply_overrides(config),
        Err(e) => {
            error!(error = %e, "configuration failed");
            report(&humanize_error(&e));
            return ExitCode::from(2);
        }
    };

    let segmenter = match RembgHttpSegmenter::new(&cli.segmenter_url) {
        Ok(seg) => match &cli.model {
            Some(model) => seg.with_model(model.clone()),
            None => seg,
        },
        Err(e) => {
            error!(error = %e, "segmenter setup failed");
            report(&humanize_error(&e));
            return ExitCode::from(2);
        }
    };
    let client = SegmentationClient::new(segmenter).with_timeout(Duration::from_secs(cli.timeout.max(1)));
    let pipeline = PhotoPipeline::new(&config, client);
    let target = cli.output_target(pipeline.config());

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    match render::render_file(&pipeline, &cli.input, &target, &cancel).await {
        Ok(summary) => {
            if let Some(path) = &cli.report {
                if let Err(e) = render::write_report(path, &summary) {
                    warn!(error = %e, "could not write render report");
                }
            }
            println!("{}", target.path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "render failed");
            report(&e.humanize());
            ExitCode::FAILURE
        }
    }
}

fn report(human: &HumanError) {
    eprintln!("{}", human.message);
    eprintln!("  {}", human.suggestion);
    if human.retriable {
        eprintln!("  (This may work if you try again.)");
    }
}
