//! wavconv: convolve a mono WAV file with an impulse response
//!
//! ```text
//! wavconv <input.wav> <ir.wav> <output.wav> [options]
//! ```
//!
//! The output has `M + N - 1` samples, is peak-normalized to `[-1, 1]`
//! unless `--no-normalize` is given, and keeps the input file's sample rate
//! and encoding unless overridden.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use tracing::{debug, error, info};
use wavconv_core::config::WavconvConfig;
use wavconv_core::normalize::normalize_in_place;
use wavconv_core::observe::{init_logging, LogFormat, LogLevel};
use wavconv_core::wav_source_sink::{read_signal, write_signal};
use wavconv_core::{Convolver, SizingPolicy};

const USAGE: &str = "\
Usage: wavconv <input.wav> <ir.wav> <output.wav> [options]

Options:
  --config PATH          Load configuration from PATH
  --sizing POLICY        Transform sizing: linear | reference
  --no-normalize         Write the raw convolution result
  --bits N               Output bits per sample: 8 | 16 | 24 | 32
  --log-level LEVEL      trace | debug | info | warn | error
  --log-format FORMAT    pretty | compact | json
  -h, --help             Show this message";

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
struct Args {
    input: PathBuf,
    impulse: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    sizing: Option<SizingPolicy>,
    no_normalize: bool,
    bits: Option<u16>,
    log_level: Option<LogLevel>,
    log_format: Option<LogFormat>,
}

#[derive(Debug, PartialEq)]
enum Command {
    Run(Args),
    Help,
}

fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut parsed = Args::default();
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| format!("{} requires a value", flag))
        };
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
            "--sizing" => parsed.sizing = Some(value("--sizing")?.parse()?),
            "--no-normalize" => parsed.no_normalize = true,
            "--bits" => {
                let raw = value("--bits")?;
                let bits = raw
                    .parse::<u16>()
                    .map_err(|_| format!("invalid bit depth '{}'", raw))?;
                parsed.bits = Some(bits);
            }
            "--log-level" => parsed.log_level = Some(value("--log-level")?.parse()?),
            "--log-format" => parsed.log_format = Some(value("--log-format")?.parse()?),
            flag if flag.starts_with("--") => return Err(format!("unknown option '{}'", flag)),
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    match <[PathBuf; 3]>::try_from(positional) {
        Ok([input, impulse, output]) => {
            parsed.input = input;
            parsed.impulse = impulse;
            parsed.output = output;
            Ok(Command::Run(parsed))
        }
        Err(found) => Err(format!(
            "expected <input.wav> <ir.wav> <output.wav>, got {} path(s)",
            found.len()
        )),
    }
}

/// Config file (explicit or searched) with command-line overrides applied
fn resolve_config(args: &Args) -> Result<WavconvConfig, Box<dyn std::error::Error>> {
    let mut config = match args.config {
        Some(ref path) => WavconvConfig::load_from(path)?,
        None => WavconvConfig::load()?,
    };

    if let Some(sizing) = args.sizing {
        config.convolution.sizing = sizing;
    }
    if args.no_normalize {
        config.convolution.normalize = false;
    }
    if let Some(bits) = args.bits {
        config.output.bits_per_sample = Some(bits);
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }

    config.validate()?;
    Ok(config)
}

/// What a successful run produced
#[derive(Debug)]
struct RunSummary {
    output_samples: usize,
    divisor: f64,
}

fn run(args: &Args, config: &WavconvConfig) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let started = Instant::now();

    let stage = Instant::now();
    let (input_spec, x) = read_signal(&args.input)?;
    info!(
        path = %args.input.display(),
        samples = x.len(),
        sample_rate = input_spec.sample_rate,
        bits = input_spec.bits_per_sample,
        elapsed_ms = stage.elapsed().as_secs_f64() * 1e3,
        "Read input"
    );

    let stage = Instant::now();
    let (ir_spec, h) = read_signal(&args.impulse)?;
    info!(
        path = %args.impulse.display(),
        samples = h.len(),
        elapsed_ms = stage.elapsed().as_secs_f64() * 1e3,
        "Read impulse response"
    );
    if ir_spec.sample_rate != input_spec.sample_rate {
        debug!(
            input_rate = input_spec.sample_rate,
            impulse_rate = ir_spec.sample_rate,
            "Sample rates differ; impulse response is used as-is"
        );
    }

    let stage = Instant::now();
    let convolver = Convolver::new(config.convolution.sizing);
    let plan = convolver.plan(x.len(), h.len())?;
    let mut y = convolver.convolve(&x, &h)?;
    info!(
        k = plan.k,
        output_len = y.len(),
        elapsed_ms = stage.elapsed().as_secs_f64() * 1e3,
        "Convolved"
    );

    let divisor = if config.convolution.normalize {
        let stage = Instant::now();
        let divisor = normalize_in_place(&mut y);
        info!(
            divisor,
            elapsed_ms = stage.elapsed().as_secs_f64() * 1e3,
            "Normalized"
        );
        divisor
    } else {
        1.0
    };

    let stage = Instant::now();
    let output_spec = config.output.resolve(&input_spec);
    write_signal(&args.output, &output_spec, &y)?;
    info!(
        path = %args.output.display(),
        bits = output_spec.bits_per_sample,
        elapsed_ms = stage.elapsed().as_secs_f64() * 1e3,
        "Wrote output"
    );

    info!(
        total_ms = started.elapsed().as_secs_f64() * 1e3,
        "Done"
    );

    Ok(RunSummary {
        output_samples: y.len(),
        divisor,
    })
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            println!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("error: {}\n\n{}", msg, USAGE);
            return ExitCode::from(2);
        }
    };

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.logging);

    match run(&args, &config) {
        Ok(summary) => {
            debug!(
                output_samples = summary.output_samples,
                divisor = summary.divisor,
                "Run summary"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Convolution failed");
            ExitCode::FAILURE
        }
    }
}
