use clap::Parser;
use predk::domain::PriceField;
use predk::evaluation::search::{ExecutionMode, SearchConfig};
use predk::forecast::MaSeedPolicy;
use predk::pipeline::TrainConfig;

#[derive(Parser)]
#[command(name = "predk", about = "K-nearest-neighbor price forecaster")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Train per-target models on a CSV history and forecast future prices
    Predict {
        /// Path to the OHLCV history CSV
        file: String,
        /// Comma-separated price fields to model (close, open, high, low)
        #[arg(short, long, default_value = "close")]
        targets: String,
        /// Number of calendar days to forecast
        #[arg(short, long, default_value = "7")]
        days: usize,
        #[arg(long, default_value = "1")]
        k_min: usize,
        #[arg(long, default_value = "20")]
        k_max: usize,
        #[arg(long, default_value = "5")]
        folds: usize,
        /// Evaluate hyperparameter candidates on a worker pool
        #[arg(short, long)]
        parallel: bool,
        /// Worker count for --parallel; 0 uses all available cores
        #[arg(short, long, default_value = "0")]
        workers: usize,
        #[arg(short, long, default_value = "forecast.csv")]
        output: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Predict {
            file,
            targets,
            days,
            k_min,
            k_max,
            folds,
            parallel,
            workers,
            output,
        } => {
            let config = TrainConfig {
                search: SearchConfig {
                    k_range: (k_min..=k_max).collect(),
                    folds,
                    mode: if parallel {
                        ExecutionMode::Parallel { workers }
                    } else {
                        ExecutionMode::Sequential
                    },
                },
                ..Default::default()
            };
            run_predict(&file, &targets, days, &config, &output)?;
        }
    }

    Ok(())
}

fn run_predict(
    file: &str,
    targets_str: &str,
    days: usize,
    config: &TrainConfig,
    output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let targets = parse_targets(targets_str)?;
    let records = predk::data::load_records(file)?;
    println!("Loaded {} rows from {}", records.len(), file);

    let mut forecasts = Vec::with_capacity(targets.len());
    for target in targets {
        let (model, report) = predk::pipeline::train_and_evaluate(&records, target, config)?;
        report.print_summary();

        let points = predk::forecast::forecast(&model, &records, days, MaSeedPolicy::default())?;
        println!("\n  {}-day {} forecast:", days, target);
        for p in &points {
            println!("    {}  {:.4}", p.date, p.value);
        }
        forecasts.push((target, points));
    }

    predk::data::save_forecast(output, &forecasts)?;
    println!("\nSaved forecast to {}", output);
    Ok(())
}

fn parse_targets(list: &str) -> Result<Vec<PriceField>, Box<dyn std::error::Error>> {
    let mut targets = Vec::new();
    for part in list.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        targets.push(part.parse::<PriceField>()?);
    }
    if targets.is_empty() {
        return Err("no targets given".into());
    }
    Ok(targets)
}
