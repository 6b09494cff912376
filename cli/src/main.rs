use std::{fs, path::PathBuf};

use anyhow::Context;
use cache_sim::{eval, geometry::Geometry, sim::Simulator, trace};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// replay a memory trace through an LRU cache
    Sim(SimArgs),
    /// count cache misses of the registered matrix transposes
    Trans(TransArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct SimArgs {
    #[command(flatten)]
    delegate: CommonArgs,
    /// Number of set index bits (S = 2^s sets)
    #[arg(short = 's', value_name = "num")]
    set_bits: u32,
    /// Number of lines per set
    #[arg(short = 'E', value_name = "num")]
    associativity: usize,
    /// Number of block offset bits (B = 2^b bytes per block)
    #[arg(short = 'b', value_name = "num")]
    block_bits: u32,
    /// File path to valgrind trace
    #[arg(short = 't', value_name = "file")]
    trace: PathBuf,
    /// File path to write "<hits> <misses> <evictions>" to
    #[arg(long)]
    results: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TransArgs {
    #[command(flatten)]
    delegate: CommonArgs,
    /// Number of columns of the source matrix
    #[arg(short = 'M', value_name = "num")]
    m: usize,
    /// Number of rows of the source matrix
    #[arg(short = 'N', value_name = "num")]
    n: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    match args.command {
        Command::Sim(SimArgs {
            delegate: CommonArgs { verbose, json },
            set_bits,
            associativity,
            block_bits,
            trace: trace_path,
            results,
        }) => {
            init_logger(verbose);
            let geometry = Geometry::new(set_bits, associativity, block_bits)?;
            let text = fs::read_to_string(&trace_path)
                .with_context(|| format!("failed to read trace {}", trace_path.display()))?;
            let accesses = trace::parse_trace(&text)?;
            log::info!("finished parsing trace. # of records: {}", accesses.len());

            let mut sim = Simulator::new(geometry);
            log::info!("simulating {geometry}");
            for access in &accesses {
                let step = sim.step(access);
                if verbose && !step.is_skipped() {
                    println!("{step}");
                }
            }
            log::info!("finished simulation.");
            output_stat(&sim);

            let summary = sim.summary();
            if json {
                println!("{}", serde_json::to_string(&summary)?);
            } else {
                println!("{summary}");
            }
            if let Some(path) = results {
                let file = fs::File::create(&path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                summary.write_results(file)?;
            }
            Ok(())
        }
        Command::Trans(TransArgs {
            delegate: CommonArgs { verbose, json },
            m,
            n,
        }) => {
            init_logger(verbose);
            log::info!(
                "evaluating transposes of a {n}x{m} matrix on {}",
                Geometry::REFERENCE_DIRECT_MAPPED
            );
            let reports = eval::evaluate_all(m, n)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for r in &reports {
                    println!("{r}");
                }
            }
            Ok(())
        }
    }
}

fn init_logger(verbose: bool) {
    if verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::init();
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "stat")] {
        use terminal_size::terminal_size;

        fn output_stat(sim: &Simulator) {
            let max_width = get_terminal_width().unwrap_or(120) as usize;
            log::info!("statistics:\n{}", sim.collect_stat().view(max_width));
        }

        fn get_terminal_width() -> Option<u16> {
            terminal_size().map(|(w, _)| w.0.saturating_sub(20))
        }
    } else {
        fn output_stat(_: &Simulator) {}
    }
}
