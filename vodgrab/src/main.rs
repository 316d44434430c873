mod cli;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use platforms_parser::extractor::platforms::vimeo::{normalize_url, video_id_from_url};
use platforms_parser::media::VideoDescriptor;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use vodgrab::config::AppConfig;
use vodgrab::downloader::{
    Acquirer, AcquisitionJob, DownloadEngine, FfmpegEngine, ProgressEvent,
};
use vodgrab::logging::{LOG_RETENTION_DAYS, LogOptions, cleanup_old_logs, init_logging};
use vodgrab::utils::default_output_path;

use crate::cli::{Args, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config =
        AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    let _log_guard = init_logging(&LogOptions {
        verbose: args.verbose,
        quiet: args.quiet,
        filter: config.log.filter.as_deref(),
        dir: config.log.dir.as_deref(),
    })?;

    if let Some(dir) = config.log.dir.as_deref()
        && let Err(e) = cleanup_old_logs(dir, LOG_RETENTION_DAYS).await
    {
        warn!(error = %e, "Failed to clean up old log files");
    }

    let token = CancellationToken::new();
    tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling");
                token.cancel();
            }
        }
    });

    match args.command {
        Commands::Download {
            url,
            output,
            filename,
            duration,
            auto_duration,
            referer,
            json,
        } => {
            let output = output.unwrap_or_else(|| {
                default_output_path(
                    &config.output_dir,
                    filename.as_deref(),
                    video_id_from_url(&normalize_url(&url)),
                    || Utc::now().timestamp_millis().to_string(),
                )
            });

            let mut job = AcquisitionJob::new(url, output)
                .with_expected_duration(duration.unwrap_or(config.default_duration_secs))
                .with_descriptor_duration(auto_duration);
            if let Some(referer) = referer {
                job = job.with_referer(referer);
            }

            download(&config, job, json, &token).await
        }
        Commands::Info { url, referer, json } => {
            describe(&config, &url, referer.as_deref(), json, &token).await
        }
        Commands::Check => check(&config).await,
        Commands::Config { show } => {
            if show {
                println!("{}", config.show()?);
            } else {
                let path = args
                    .config
                    .or_else(AppConfig::default_path)
                    .unwrap_or_else(|| PathBuf::from("config.toml"));
                println!("Configuration file: {}", path.display());
                println!("Use --show to display the effective configuration");
            }
            Ok(())
        }
    }
}

async fn download(
    config: &AppConfig,
    job: AcquisitionJob,
    json: bool,
    token: &CancellationToken,
) -> anyhow::Result<()> {
    let acquirer = Acquirer::new(config)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let renderer = tokio::spawn(render_progress(rx, json));

    let result = acquirer.acquire(job, &tx, token).await;
    drop(tx);
    renderer.await.context("Progress renderer failed")?;

    let report = result?;
    info!(
        id = report.descriptor.id(),
        attempts = report.extraction_attempts,
        output = %report.output_path.display(),
        "Acquisition complete"
    );
    if !json {
        println!(
            "{} {} {}",
            "Saved".green().bold(),
            report.descriptor.title().cyan(),
            report.output_path.display()
        );
    }
    Ok(())
}

async fn render_progress(mut rx: mpsc::UnboundedReceiver<ProgressEvent>, json: bool) {
    if json {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "Failed to serialize progress event"),
            }
        }
        return;
    }

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Extracting media information...");

    while let Some(event) = rx.recv().await {
        match event {
            ProgressEvent::Progress {
                percentage,
                elapsed,
                size,
                ..
            } => {
                pb.set_position(u64::from(percentage.min(100)));
                pb.set_message(format!("{elapsed} {size}"));
            }
            ProgressEvent::Complete => pb.finish_with_message("Done"),
            ProgressEvent::Error { message } => {
                pb.abandon_with_message(message.red().to_string());
            }
        }
    }
}

async fn describe(
    config: &AppConfig,
    url: &str,
    referer: Option<&str>,
    json: bool,
    token: &CancellationToken,
) -> anyhow::Result<()> {
    let acquirer = Acquirer::new(config)?;

    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&[
                "▹▹▹▹▹",
                "▸▹▹▹▹",
                "▹▸▹▹▹",
                "▹▹▸▹▹",
                "▹▹▹▸▹",
                "▹▹▹▹▸",
                "▪▪▪▪▪",
            ]),
    );
    pb.set_message("Extracting media information...");

    let descriptor = acquirer
        .describe(url, referer, token)
        .await
        .with_context(|| format!("Failed to extract {url}"));
    pb.finish_and_clear();
    let descriptor = descriptor?;

    if json {
        println!("{}", descriptor.to_json_pretty()?);
    } else {
        print_descriptor(&descriptor);
    }
    Ok(())
}

fn print_descriptor(descriptor: &VideoDescriptor) {
    println!("\n{}", "Video Information:".green().bold());
    println!("{} {}", "Id:".green(), descriptor.id().to_string().cyan());
    println!("{} {}", "Title:".green(), descriptor.title().cyan());
    println!(
        "{} {}",
        "Owner:".green(),
        descriptor.owner().name.as_str().cyan()
    );
    println!(
        "{} {}s",
        "Duration:".green(),
        descriptor.duration_secs().to_string().cyan()
    );
    println!(
        "{} {}x{}",
        "Resolution:".green(),
        descriptor.width(),
        descriptor.height()
    );
    if !descriptor.qualities().is_empty() {
        println!(
            "{} {}",
            "Qualities:".green(),
            descriptor.qualities().join(", ").cyan()
        );
    }

    println!("\n{}", "Streams:".green().bold());
    match descriptor.preferred_stream() {
        Some((protocol, variant, url)) => println!(
            "  {} {} ({:?}) {}",
            "Preferred:".green(),
            protocol,
            variant,
            url.blue()
        ),
        None => println!("  {}", "No stream available".red()),
    }
    for (label, urls) in [("HLS", &descriptor.streams().hls), ("DASH", &descriptor.streams().dash)] {
        for url in [&urls.primary, &urls.alternate].into_iter().flatten() {
            println!("  {} {}", format!("{label}:").green(), url.blue());
        }
    }
}

async fn check(config: &AppConfig) -> anyhow::Result<()> {
    let engine = FfmpegEngine::with_config(config.ffmpeg.clone());
    let version = engine
        .version()
        .await
        .with_context(|| format!("{} is not usable", config.ffmpeg.binary_path))?;
    println!("{} {}", "ffmpeg:".green().bold(), version);
    Ok(())
}
