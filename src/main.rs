//! errshot CLI - Normalize OS error screenshots and query the analysis service.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use errshot::api::{ChatClient, ChatResponse, InferenceClient};
use errshot::image::{encode_file_base64, encode_png_base64, random_noise, save_sample, solid_color};
use errshot::{ClientConfig, ImageNormalizer, ResampleFilter, TargetSize};

/// Normalize OS error screenshots and query the error analysis service.
#[derive(Parser, Debug)]
#[command(name = "errshot")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to the user config directory).
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the prediction server URL.
    #[arg(long, global = true, value_name = "URL")]
    server: Option<String>,

    /// Override the chat WebSocket URL.
    #[arg(long, global = true, value_name = "URL")]
    chat_url: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the normalized tensor of an image as a JSON array.
    Normalize {
        /// Image to normalize.
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Target height (defaults to the configured size).
        #[arg(long, value_name = "INT")]
        height: Option<u32>,

        /// Target width (defaults to the configured size).
        #[arg(long, value_name = "INT")]
        width: Option<u32>,

        /// Resampling filter.
        #[arg(long, value_enum)]
        filter: Option<ResampleFilter>,

        /// Write the JSON to a file instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Classify the OS error shown in a screenshot.
    Predict {
        /// Screenshot of the error.
        #[arg(value_name = "SCREENSHOT")]
        screenshot: PathBuf,
    },

    /// Run the general 32x32 classifier on an image.
    Classify {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },

    /// Send one message to the chat assistant.
    Chat {
        /// Question or description of the problem.
        #[arg(value_name = "MESSAGE")]
        message: String,

        /// Attach a screenshot.
        #[arg(short, long, value_name = "FILE", conflicts_with = "sample_image")]
        image: Option<PathBuf>,

        /// Attach a generated 100x100 blue test image.
        #[arg(long)]
        sample_image: bool,
    },

    /// Write a synthetic test image.
    Sample {
        /// Output image path (format from extension).
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Side length in pixels.
        #[arg(long, default_value = "32", value_name = "INT")]
        size: u32,

        /// Fill with a solid colour instead of noise, as R,G,B.
        #[arg(long, value_parser = parse_color, value_name = "R,G,B", conflicts_with = "seed")]
        color: Option<[u8; 3]>,

        /// Random seed for reproducible noise.
        #[arg(long, value_name = "INT")]
        seed: Option<u64>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("errshot={log_level}").into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;

    match &args.command {
        Command::Normalize {
            image,
            height,
            width,
            filter,
            output,
        } => {
            let target = TargetSize::new(
                height.unwrap_or(config.normalize.height),
                width.unwrap_or(config.normalize.width),
            )?;
            let normalizer =
                ImageNormalizer::new(target, filter.unwrap_or(config.normalize.filter))?;
            let tensor = normalizer
                .normalize_path(image)
                .with_context(|| format!("Failed to normalize {}", image.display()))?;

            let json = serde_json::to_string(&tensor)?;
            match output {
                Some(path) => {
                    fs::write(path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!("Wrote {} values to {}", tensor.len(), path.display());
                }
                None => writeln!(std::io::stdout().lock(), "{json}")?,
            }
        }
        Command::Predict { screenshot } => {
            ensure_exists(screenshot)?;
            let tensor = ImageNormalizer::new(TargetSize::SCREENSHOT, config.normalize.filter)?
                .normalize_path(screenshot)
                .context("Failed to normalize screenshot")?;

            let prediction = InferenceClient::new(&config)?
                .predict_os_error(&tensor)
                .context("OS error prediction failed")?;

            println!("Error type: {}", prediction.error_type);
            println!("Operating system: {}", prediction.os_type);
            println!("Confidence: {:.2}%", prediction.confidence * 100.0);
            println!("Description: {}", prediction.description);
        }
        Command::Classify { image } => {
            ensure_exists(image)?;
            let tensor = ImageNormalizer::new(TargetSize::CLASSIFIER, config.normalize.filter)?
                .normalize_path(image)
                .context("Failed to normalize image")?;

            let prediction = InferenceClient::new(&config)?
                .predict_class(&tensor)
                .context("Classification failed")?;

            println!("Class: {}", prediction.class);
            println!("Confidence: {:.2}%", prediction.confidence * 100.0);
        }
        Command::Chat {
            message,
            image,
            sample_image,
        } => {
            let image_data = match image {
                Some(path) => Some(encode_file_base64(path)?),
                None if *sample_image => Some(encode_png_base64(&solid_color(100, 100, [0, 0, 255]))?),
                None => None,
            };

            let mut client = ChatClient::connect(&config.chat_url)
                .with_context(|| format!("Failed to connect to {}", config.chat_url))?;
            let response = match &image_data {
                Some(data) => client.ask_with_image(message, data),
                None => client.ask(message),
            }
            .context("Chat exchange failed")?;
            client.close().context("Failed to close chat session")?;

            print_chat_response(&response);
        }
        Command::Sample {
            output,
            size,
            color,
            seed,
        } => {
            let img = match color {
                Some(rgb) => solid_color(*size, *size, *rgb),
                None => random_noise(*size, *size, *seed),
            };
            save_sample(&img, output)?;
            println!("Sample image written to {}", output.display());
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::discover()?,
    };

    if let Some(server) = &args.server {
        config.server_url.clone_from(server);
    }
    if let Some(chat_url) = &args.chat_url {
        config.chat_url.clone_from(chat_url);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Input file does not exist: {}", path.display());
    }
    Ok(())
}

fn print_chat_response(response: &ChatResponse) {
    println!("{}", response.response);

    if let Some(analysis) = &response.analysis {
        println!();
        println!("Error type: {}", analysis.error_type);
        println!("Operating system: {}", analysis.os_type);
        println!("Confidence: {:.2}%", analysis.confidence * 100.0);
        println!("{}", analysis.detailed_description);
        for cause in &analysis.possible_causes {
            println!("  cause: {cause}");
        }
        for solution in &analysis.solutions {
            println!("  fix: {solution}");
        }
    }

    for suggestion in &response.suggestions {
        println!("- {suggestion}");
    }
}

fn parse_color(value: &str) -> std::result::Result<[u8; 3], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err("expected three comma-separated values".to_string());
    };

    Ok([parse_channel(r)?, parse_channel(g)?, parse_channel(b)?])
}

fn parse_channel(value: &str) -> std::result::Result<u8, String> {
    value
        .parse()
        .map_err(|e| format!("invalid channel {value:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("0, 0,255"), Ok([0, 0, 255]));
        assert!(parse_color("1,2").is_err());
        assert!(parse_color("1,2,300").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let args = Args::try_parse_from([
            "errshot",
            "normalize",
            "shot.png",
            "--height",
            "64",
            "--filter",
            "nearest",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Normalize { height: Some(64), filter: Some(ResampleFilter::Nearest), .. }
        ));

        let args = Args::try_parse_from(["errshot", "sample", "out.png", "--color", "0,0,255"]).unwrap();
        assert!(matches!(args.command, Command::Sample { color: Some([0, 0, 255]), .. }));
    }

    #[test]
    fn test_chat_image_flags_conflict() {
        let result = Args::try_parse_from(["errshot", "chat", "hi", "--image", "a.png", "--sample-image"]);
        assert!(result.is_err());
    }
}
