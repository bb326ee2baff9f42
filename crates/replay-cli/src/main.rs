//! CLI entry point for the `cia-replay` binary.

use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, IsTerminal, Write};
use std::path::PathBuf;

use replay_core::{replay, CiaModel, ReplayConfig, SoftCia};
#[cfg(test)]
use tempfile as _;

const DEFAULT_OUTPUT: &str = "cia_sim.log";
const MAX_TOD_FREQUENCY: u64 = 1_000_000;

const USAGE_TEXT: &str = "\
Usage: cia-replay [options]

Reads lines of CIA bus communication (cycles R/W/I register/port/pin value)
and writes a normalized trace to diff against a golden file.

Options:
  -i, --input <file>           Read trace from file (default: standard input)
  -o, --output <file>          Write log to file (default: cia_sim.log)
  -m, --cia-model {6526|8521}  Specify CIA model (default: 8521)
  -f, --tod-frequency <hz>     Generate internal TOD signal (1 - 1M)Hz
  -h, --help                   Display this information
";

#[derive(Debug, PartialEq, Eq)]
struct ReplayArgs {
    input: Option<PathBuf>,
    output: PathBuf,
    model: CiaModel,
    tod_frequency: u64,
}

impl Default for ReplayArgs {
    fn default() -> Self {
        Self {
            input: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            model: CiaModel::default(),
            tod_frequency: 0,
        }
    }
}

#[derive(Debug)]
enum ParseResult {
    Args(ReplayArgs),
    Help,
}

#[allow(clippy::while_let_on_iterator)]
fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut parsed = ReplayArgs::default();

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Ok(ParseResult::Help);
        }

        if arg == "-i" || arg == "--input" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --input".to_string())?;
            parsed.input = Some(PathBuf::from(value));
            continue;
        }

        if arg == "-o" || arg == "--output" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --output".to_string())?;
            parsed.output = PathBuf::from(value);
            continue;
        }

        if arg == "-m" || arg == "--cia-model" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --cia-model".to_string())?;
            let name = value.to_string_lossy();
            parsed.model = CiaModel::from_name(&name)
                .ok_or_else(|| format!("invalid CIA model: {name}"))?;
            continue;
        }

        if arg == "-f" || arg == "--tod-frequency" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --tod-frequency".to_string())?;
            let text = value.to_string_lossy();
            let frequency: u64 = text
                .parse()
                .map_err(|_| format!("invalid TOD frequency: {text}"))?;
            if frequency > MAX_TOD_FREQUENCY {
                return Err(format!("invalid TOD frequency: {text}"));
            }
            parsed.tod_frequency = frequency;
            continue;
        }

        return Err(format!("unknown option: {}", arg.to_string_lossy()));
    }

    Ok(ParseResult::Args(parsed))
}

fn run(args: &ReplayArgs) -> Result<(), i32> {
    let config = ReplayConfig {
        model: args.model,
        tod_frequency_hz: args.tod_frequency,
    };

    if args.input.is_none() && io::stdin().is_terminal() {
        eprintln!("error: standard input is a terminal");
        return Err(1);
    }

    let output = File::create(&args.output).map_err(|e| {
        eprintln!("error: failed to create {}: {e}", args.output.display());
        1
    })?;
    let mut output = BufWriter::new(output);

    let result = match &args.input {
        Some(path) => {
            let input = File::open(path).map_err(|e| {
                eprintln!("error: failed to open {}: {e}", path.display());
                1
            })?;
            replay_stream(BufReader::new(input), &config, &mut output)
        }
        None => {
            let stdin = io::stdin();
            replay_stream(stdin.lock(), &config, &mut output)
        }
    };

    // Flush before acting on a replay failure: partial output stays on
    // disk for forensic diffing.
    let flushed = output.flush();

    result?;
    flushed.map_err(|e| {
        eprintln!("error: failed to write output: {e}");
        1
    })
}

fn replay_stream<R: BufRead, W: Write>(
    input: R,
    config: &ReplayConfig,
    output: &mut W,
) -> Result<(), i32> {
    let mut device = SoftCia::new();
    replay(&mut device, config, input, output).map_err(|e| {
        eprintln!("error: {e}");
        1
    })
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Args(args)) => match run(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{USAGE_TEXT}");
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<ParseResult, String> {
        parse_args(args.iter().copied().map(OsString::from))
    }

    #[test]
    fn defaults_read_stdin_and_write_the_fixed_filename() {
        let Ok(ParseResult::Args(args)) = parse(&[]) else {
            panic!("empty args must parse");
        };
        assert_eq!(args, ReplayArgs::default());
        assert_eq!(args.output, PathBuf::from("cia_sim.log"));
    }

    #[test]
    fn parses_all_options() {
        let Ok(ParseResult::Args(args)) = parse(&[
            "-i",
            "gold.log",
            "-o",
            "sim.log",
            "-m",
            "6526",
            "-f",
            "50",
        ]) else {
            panic!("valid args must parse");
        };

        assert_eq!(
            args,
            ReplayArgs {
                input: Some(PathBuf::from("gold.log")),
                output: PathBuf::from("sim.log"),
                model: CiaModel::Mos6526,
                tod_frequency: 50,
            }
        );
    }

    #[test]
    fn parses_long_options() {
        let Ok(ParseResult::Args(args)) = parse(&["--cia-model", "8521", "--tod-frequency", "0"])
        else {
            panic!("valid args must parse");
        };
        assert_eq!(args.model, CiaModel::Mos8521);
        assert_eq!(args.tod_frequency, 0);
    }

    #[test]
    fn parses_help_flag() {
        let result = parse(&["--help"]).expect("help must parse");
        assert!(matches!(result, ParseResult::Help));
    }

    #[test]
    fn rejects_unknown_options() {
        let error = parse(&["--frobnicate"]).expect_err("unknown option must fail");
        assert!(error.contains("unknown option"));
    }

    #[test]
    fn rejects_invalid_models() {
        let error = parse(&["-m", "6522"]).expect_err("invalid model must fail");
        assert!(error.contains("invalid CIA model"));
    }

    #[test]
    fn rejects_out_of_range_tod_frequencies() {
        let error = parse(&["-f", "2000000"]).expect_err("over-limit frequency must fail");
        assert!(error.contains("invalid TOD frequency"));

        let error = parse(&["-f", "many"]).expect_err("textual frequency must fail");
        assert!(error.contains("invalid TOD frequency"));
    }

    #[test]
    fn rejects_missing_option_values() {
        let error = parse(&["-i"]).expect_err("missing value must fail");
        assert!(error.contains("missing value"));
    }
}
