use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;

use native_frame::{CallingConvention, FrameCalculator, Shorty, abi};

#[derive(Parser)]
#[command(name = "native-frame")]
#[command(about = "Frame sizes for fast (critical) native calls")]
struct Cli {
    #[command(flatten)]
    convention: ConventionArgs,

    #[arg(long, global = true, help = "Print one JSON object per result")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConventionArgs {
    #[arg(
        long,
        global = true,
        default_value_t = abi::MAX_FLOAT_OR_DOUBLE_REGISTER_ARGUMENTS,
        help = "Float/double arguments passed in registers"
    )]
    fp_regs: usize,

    #[arg(
        long,
        global = true,
        default_value_t = abi::MAX_INT_LIKE_REGISTER_ARGUMENTS,
        help = "Integer-like arguments passed in registers"
    )]
    int_regs: usize,

    #[arg(
        long,
        global = true,
        default_value_t = abi::FRAME_POINTER_SIZE,
        help = "Machine word size in bytes"
    )]
    word_size: usize,

    #[arg(
        long,
        global = true,
        default_value_t = abi::AAPCS64_STACK_ALIGNMENT,
        help = "Stack alignment in bytes"
    )]
    stack_alignment: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Stub and direct-call frame sizes for shorty signatures.
    Frame {
        #[arg(required = true, help = "Shorty signatures, return type first (e.g. ZIJF)")]
        shorties: Vec<String>,
    },
    /// Stack size of outgoing arguments for the given argument counts.
    OutArgs {
        #[arg(long, default_value_t = 0, help = "Number of float/double arguments")]
        fp: usize,

        #[arg(long = "int", default_value_t = 0, help = "Number of integer-like arguments")]
        non_fp: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let convention = CallingConvention::new(
        cli.convention.fp_regs,
        cli.convention.int_regs,
        cli.convention.word_size,
        cli.convention.stack_alignment,
    )
    .context("Invalid calling convention")?;
    let calc = FrameCalculator::new(convention);

    match cli.command {
        Commands::Frame { shorties } => {
            for raw in &shorties {
                let shorty =
                    Shorty::parse(raw).with_context(|| format!("Invalid shorty '{raw}'"))?;
                print_frame(&calc, shorty, cli.json);
            }
        }
        Commands::OutArgs { fp, non_fp } => {
            let size = out_args_size(&calc, fp, non_fp)?;
            if cli.json {
                println!("{}", json!({ "fp": fp, "int": non_fp, "out_args_size": size }));
            } else {
                println!("{size}");
            }
        }
    }

    Ok(())
}

fn out_args_size(calc: &FrameCalculator, fp: usize, non_fp: usize) -> Result<usize> {
    calc.checked_native_out_args_size(fp, non_fp)
        .with_context(|| format!("Cannot size outgoing args for --fp {fp} --int {non_fp}"))
}

fn print_frame(calc: &FrameCalculator, shorty: Shorty<'_>, as_json: bool) {
    let layout = calc.stub_frame_layout(shorty);
    let direct = calc.direct_call_frame_size(shorty.as_str());

    if as_json {
        println!(
            "{}",
            json!({
                "shorty": shorty.as_str(),
                "out_args_size": layout.out_args_size,
                "stub_frame_size": layout.frame_size,
                "direct_call_frame_size": direct,
                "tail_call": layout.is_tail_call(),
            })
        );
    } else {
        let stub_kind = if layout.is_tail_call() {
            "tail call"
        } else {
            "saves return address"
        };
        println!(
            "{shorty}: out args {} bytes, stub frame {} bytes ({stub_kind}), direct call frame {direct} bytes",
            layout.out_args_size, layout.frame_size
        );
    }
}
