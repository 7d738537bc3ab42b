#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use fpga_tool_perf::run_cmd::{self, RunArgs};
use fpga_tool_perf::list_cmd;

#[derive(Parser, Debug)]
#[command(name = "fpga-tool-perf")]
#[command(about = "Build designs with FPGA toolchains and record runtime, Fmax and utilization", long_about = None)]
struct Cli {
    /// Enable verbose logging (or set FPGA_TOOL_PERF_LOG)
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build one project with one toolchain and record its metrics
    Run {
        /// Project description (JSON with name, srcs, top)
        #[arg(long)]
        project: PathBuf,
        /// Toolchain id (see list-toolchains)
        #[arg(long)]
        toolchain: String,
        /// Device family
        #[arg(long, default_value = "ice40")]
        family: String,
        #[arg(long, default_value = "hx8k")]
        device: String,
        #[arg(long, default_value = "ct256")]
        package: String,
        /// Vendor optimization strategy
        #[arg(long)]
        strategy: Option<String>,
        /// PnR seed, decimal or 0x hex
        #[arg(long)]
        seed: Option<String>,
        /// Force carry chains on or off
        #[arg(long)]
        carry: Option<bool>,
        /// Pin constraints (iCE40)
        #[arg(long)]
        pcf: Option<PathBuf>,
        /// Timing constraints
        #[arg(long)]
        sdc: Option<PathBuf>,
        /// Xilinx constraints
        #[arg(long)]
        xdc: Option<PathBuf>,
        /// Output directory (default: <out-prefix>/<design>)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        out_prefix: Option<PathBuf>,
        /// Clear a non-empty output directory
        #[arg(long)]
        overwrite: bool,
        /// Build identifier stored in the report
        #[arg(long)]
        build: Option<String>,
        /// Tool location config (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Append the report to this JSONL history
        #[arg(long)]
        jsonl: Option<PathBuf>,
        /// Also write the report to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// List toolchain ids
    ListToolchains,

    /// List toolchains that accept --seed
    ListSeedable,

    /// Show which external tools each toolchain finds
    CheckEnv {
        #[arg(long)]
        toolchain: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Export a JSONL history to CSV
    ExportCsv {
        #[arg(long)]
        jsonl: PathBuf,
        /// Output file (stdout if omitted)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Only reports for this toolchain
        #[arg(long)]
        toolchain: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let env = std::env::var("FPGA_TOOL_PERF_LOG").unwrap_or_else(|_| {
        if verbose { "fpga_tool_perf=debug".to_string() } else { "fpga_tool_perf=info".to_string() }
    });
    let _ = tracing_subscriber::fmt()
        .with_span_events(FmtSpan::ACTIVE)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_env_filter(EnvFilter::new(env))
        .try_init();
}

fn main() {
    color_eyre::install().ok();
    let cli_args: Vec<String> = std::env::args().collect();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            project, toolchain, family, device, package, strategy, seed, carry, pcf, sdc, xdc,
            out_dir, out_prefix, overwrite, build, config, jsonl, json,
        } => run_cmd::run(RunArgs {
            project,
            toolchain,
            family,
            device,
            package,
            strategy,
            seed,
            carry,
            pcf,
            sdc,
            xdc,
            out_dir,
            out_prefix,
            overwrite,
            build,
            config,
            jsonl,
            json,
            cli_args,
        }),
        Commands::ListToolchains => list_cmd::list_toolchains(),
        Commands::ListSeedable => list_cmd::list_seedable(),
        Commands::CheckEnv { toolchain, config } => {
            list_cmd::check_env(config.as_deref(), toolchain.as_deref())
        }
        Commands::ExportCsv { jsonl, out, toolchain } => list_cmd::export_csv(jsonl, out, toolchain),
    };

    if let Err(e) = result {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
