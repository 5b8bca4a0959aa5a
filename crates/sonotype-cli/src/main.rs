//! Sonotype CLI - trait profiles rendered as sound.
//!
//! Subcommands cover the whole pipeline: list the catalog, render the
//! additive signal, compose the music layer, colorize user audio,
//! analyze any WAV and round-trip share tokens.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use sonotype_cli::commands;
use sonotype_cli::input::ValueArgs;

/// Working sample rate used when none is given.
const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Additive signal length used when none is given.
const DEFAULT_SIGNAL_SECONDS: f64 = 6.0;

/// Sonotype - personality traits as signal and song
#[derive(Parser)]
#[command(name = "sonotype")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the trait catalog
    Traits,

    /// Render the additive signal to a WAV file
    Signal {
        #[command(flatten)]
        values: ValueArgs,

        /// Output WAV path
        #[arg(short, long)]
        out: String,

        /// Duration in seconds
        #[arg(long, default_value_t = DEFAULT_SIGNAL_SECONDS)]
        duration: f64,

        /// Sample rate in Hz
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,

        /// Dither seed
        #[arg(long, default_value_t = 0)]
        seed: u32,

        /// Print metrics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compose the music layer to a stereo WAV file
    Music {
        #[command(flatten)]
        values: ValueArgs,

        /// Output WAV path
        #[arg(short, long)]
        out: String,

        /// Duration in seconds
        #[arg(long, default_value_t = sonotype_backend_music::DEFAULT_DURATION)]
        duration: f64,

        /// Sample rate in Hz
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,

        /// Seed for percussion timbre and dither
        #[arg(long, default_value_t = 0)]
        seed: u32,

        /// Print metrics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply the trait profile to a user WAV file
    Colorize {
        #[command(flatten)]
        values: ValueArgs,

        /// Input WAV path
        #[arg(short, long)]
        input: String,

        /// Output WAV path
        #[arg(short, long)]
        out: String,

        /// Working sample rate in Hz
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,

        /// Dither seed
        #[arg(long, default_value_t = 0)]
        seed: u32,
    },

    /// Analyze a WAV file: levels, spectrum, spectrogram shape
    Analyze {
        /// Input WAV path
        #[arg(short, long)]
        input: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encode or decode a shareable state token
    Share {
        #[command(subcommand)]
        action: ShareAction,
    },
}

#[derive(Subcommand)]
enum ShareAction {
    /// Print the token for the given values
    Encode {
        #[command(flatten)]
        values: ValueArgs,
    },

    /// Decode a token and print the values
    Decode {
        /// The token to decode
        #[arg(long)]
        token: String,

        /// Print values as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Traits => {
            commands::traits::run();
            Ok(())
        }
        Commands::Signal {
            values,
            out,
            duration,
            sample_rate,
            seed,
            json,
        } => commands::signal::run(values, out, *duration, *sample_rate, *seed, *json),
        Commands::Music {
            values,
            out,
            duration,
            sample_rate,
            seed,
            json,
        } => commands::music::run(values, out, *duration, *sample_rate, *seed, *json),
        Commands::Colorize {
            values,
            input,
            out,
            sample_rate,
            seed,
        } => commands::colorize::run(values, input, out, *sample_rate, *seed),
        Commands::Analyze { input, json } => commands::analyze::run(input, *json),
        Commands::Share { action } => match action {
            ShareAction::Encode { values } => commands::share::encode(values),
            ShareAction::Decode { token, json } => commands::share::decode(token, *json),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
