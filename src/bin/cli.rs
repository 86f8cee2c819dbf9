//! Tansho CLI - Command-line interface for win-bet allocation

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use tansho::backtesting::{metrics, BacktestConfig, BacktestSimulator, SyntheticOddsGenerator};
use tansho::core::allocator::{Allocator, AllocatorConfig, WinBetAllocator};
use tansho::core::stakes::RESERVE;
use tansho::data::{load_win_odds, PredictionBook};

/// Default data locations (relative to project root)
const DEFAULT_PRED_PATH: &str = "data/pred.json";
const DEFAULT_ODDS_DIR: &str = "data/odds";
const DEFAULT_RACES_DIR: &str = "data/races";

#[derive(Parser)]
#[command(name = "tansho")]
#[command(author, version, about = "Win-bet allocation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the prediction book JSON
    #[arg(long, default_value = DEFAULT_PRED_PATH)]
    pred: PathBuf,

    /// Path to the odds directory
    #[arg(long, default_value = DEFAULT_ODDS_DIR)]
    odds_dir: PathBuf,
}

#[derive(Args)]
struct ConfigArgs {
    /// Budget per race
    #[arg(long, default_value = "1000")]
    budget: i64,

    /// Stake denomination
    #[arg(long, default_value = "100")]
    unit: i64,

    /// Minimum predicted win probability for eligibility
    #[arg(long, default_value = "0.0")]
    pred_threshold: f64,

    /// Minimum market odds for eligibility
    #[arg(long, default_value = "1.0")]
    odds_threshold: f64,

    /// Minimum target payout ratio
    #[arg(long, default_value = "1.1")]
    target_rate: f64,
}

impl ConfigArgs {
    fn to_config(&self) -> AllocatorConfig {
        AllocatorConfig {
            budget: self.budget,
            pred_threshold: self.pred_threshold,
            odds_threshold: self.odds_threshold,
            exceed_profit_rate: self.target_rate,
            unit: self.unit,
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate the budget for one race
    Allocate {
        /// Race date (YYYYMMDD format, default: today)
        #[arg(short, long)]
        date: Option<u32>,

        /// Post time (HHMM format)
        #[arg(short, long)]
        time: String,

        #[command(flatten)]
        config: ConfigArgs,

        /// Use synthetic odds when no market snapshot is on disk
        #[arg(long)]
        synthetic_odds: bool,
    },

    /// List races with predictions for a date
    List {
        /// Race date (YYYYMMDD format, default: today)
        #[arg(short, long)]
        date: Option<u32>,
    },

    /// Run backtesting simulation
    Backtest {
        /// Directory of historical race record JSON files
        #[arg(long, default_value = DEFAULT_RACES_DIR)]
        races: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,

        /// Use synthetic odds for records without a market snapshot
        #[arg(long)]
        synthetic_odds: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    println!("{}", "Tansho CLI v0.2.0".cyan().bold());
    println!();

    match cli.command {
        Commands::Allocate {
            date,
            time,
            config,
            synthetic_odds,
        } => {
            let date = date.unwrap_or_else(today);
            run_allocate(&cli.pred, &cli.odds_dir, date, &time, &config, synthetic_odds)?;
        }
        Commands::List { date } => {
            let date = date.unwrap_or_else(today);
            run_list(&cli.pred, date)?;
        }
        Commands::Backtest {
            races,
            config,
            synthetic_odds,
        } => {
            run_backtest(&races, &config, synthetic_odds)?;
        }
    }

    Ok(())
}

/// Today's date as YYYYMMDD
fn today() -> u32 {
    let now = Local::now();
    now.year() as u32 * 10000 + now.month() * 100 + now.day()
}

/// Split a YYYYMMDD date into the prediction book's year and monthday keys
fn split_date(date: u32) -> (String, String) {
    (format!("{:04}", date / 10000), format!("{:04}", date % 10000))
}

/// Format date as YYYY-MM-DD
fn format_date(date: u32) -> String {
    let year = date / 10000;
    let month = (date / 100) % 100;
    let day = date % 100;
    format!("{}-{:02}-{:02}", year, month, day)
}

fn run_allocate(
    pred_path: &Path,
    odds_dir: &Path,
    date: u32,
    time: &str,
    config: &ConfigArgs,
    synthetic_odds: bool,
) -> Result<()> {
    let book = PredictionBook::load(pred_path)
        .with_context(|| format!("Failed to load predictions from {:?}", pred_path))?;

    let (year, monthday) = split_date(date);
    let race = book
        .get_race(&year, &monthday, time)
        .with_context(|| format!("No prediction for {} ({}) at {}", date, format_date(date), time))?;

    println!(
        "{}: {} ({}) {}",
        "Allocating".green(),
        date,
        format_date(date),
        race.label()
    );
    println!();

    // Load the odds snapshot, or synthesize one from the predictions
    let odds = match load_win_odds(odds_dir, date, race.track_code, race.race_no) {
        Some(odds) => odds,
        None if synthetic_odds => {
            println!(
                "{}",
                "(オッズデータがないため予測確率から合成します)".dimmed()
            );
            SyntheticOddsGenerator::default().win_odds(&race.pred)
        }
        None => anyhow::bail!(
            "No odds snapshot for {}/{:02}/{:02} in {:?}; pass --synthetic-odds to synthesize",
            date,
            race.track_code,
            race.race_no,
            odds_dir
        ),
    };

    let allocator = WinBetAllocator::new(config.to_config());
    let plan = allocator
        .allocate(&race.pred, &odds)
        .context("Allocation failed")?;

    println!("{}", "購入プラン (Stake Plan):".yellow().bold());
    println!("{:>6} {:>8} {:>8} {:>10}", "馬番", "確率", "オッズ", "購入額");
    println!("{}", "-".repeat(40));

    for (id, stake) in plan.iter() {
        if id == RESERVE {
            continue;
        }
        let probability = race.pred.get(id).copied().unwrap_or(0.0);
        let o = odds.get(id).copied().unwrap_or(0.0);
        let stake_str = if stake > 0 {
            format!("¥{}", stake).green()
        } else {
            "-".normal()
        };
        println!(
            "{:>6} {:>7.1}% {:>8.1} {:>10}",
            id,
            probability * 100.0,
            o,
            stake_str
        );
    }

    println!("{}", "-".repeat(40));
    println!(
        "{:>6} {:>28}",
        "見送り",
        format!("¥{}", plan.reserve())
    );
    println!(
        "合計: ¥{} / 予算 ¥{}",
        plan.total(),
        config.budget
    );

    Ok(())
}

fn run_list(pred_path: &Path, date: u32) -> Result<()> {
    println!(
        "{}: {} ({})",
        "Listing races for".green(),
        date,
        format_date(date)
    );
    println!();

    let book = PredictionBook::load(pred_path)
        .with_context(|| format!("Failed to load predictions from {:?}", pred_path))?;

    let (year, monthday) = split_date(date);
    let races = book.races_on(&year, &monthday);

    if races.is_empty() {
        println!("{}", "No races found for this date.".yellow());
        return Ok(());
    }

    println!("{:>6} {:<24} {:>8}", "発走", "レース", "頭数");
    println!("{}", "-".repeat(42));

    for (time, race) in &races {
        println!("{:>6} {:<24} {:>8}", time, race.label(), race.pred.len());
    }

    println!();
    println!("Total: {} races", races.len());

    Ok(())
}

fn run_backtest(races_dir: &Path, config: &ConfigArgs, synthetic_odds: bool) -> Result<()> {
    println!("{}", "Running backtest...".green());

    let backtest_config = BacktestConfig {
        allocator: config.to_config(),
        use_synthetic_odds: synthetic_odds,
        takeout_margin: None,
    };

    println!("Budget per race: {}", config.budget);
    println!("Unit: {}", config.unit);
    println!("Probability threshold: {}", config.pred_threshold);
    println!("Odds threshold: {}", config.odds_threshold);
    println!("Target payout ratio: {}", config.target_rate);
    if synthetic_odds {
        println!("Synthetic odds: enabled");
    }
    println!();

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message("Loading race records and replaying the allocator...");

    let simulator = BacktestSimulator::new(backtest_config);
    let result = simulator
        .run(races_dir)
        .with_context(|| format!("Backtest failed reading {:?}", races_dir))?;

    pb.finish_and_clear();

    simulator.print_summary(&result);

    // Additional analysis
    if !result.plans.is_empty() {
        println!("\n{}", "Analysis by Track:".yellow().bold());
        let track_analysis = metrics::analyze_by_track(&result.plans);
        println!(
            "{:>8} {:>8} {:>8} {:>10} {:>12} {:>10}",
            "Track", "Races", "Wins", "Hit Rate", "Profit", "ROI"
        );
        println!("{}", "-".repeat(60));
        for a in &track_analysis {
            println!(
                "{:>8} {:>8} {:>8} {:>9.1}% {:>12} {:>9.1}%",
                a.key,
                a.races,
                a.wins,
                a.hit_rate * 100.0,
                a.profit,
                a.roi * 100.0
            );
        }

        println!("\n{}", "Analysis by Winner Odds Range:".yellow().bold());
        let odds_analysis = metrics::analyze_by_odds_range(&result.plans);
        println!(
            "{:>12} {:>8} {:>8} {:>10} {:>12} {:>10}",
            "Range", "Races", "Wins", "Hit Rate", "Profit", "ROI"
        );
        println!("{}", "-".repeat(65));
        for a in &odds_analysis {
            println!(
                "{:>12} {:>8} {:>8} {:>9.1}% {:>12} {:>9.1}%",
                a.key,
                a.races,
                a.wins,
                a.hit_rate * 100.0,
                a.profit,
                a.roi * 100.0
            );
        }
    }

    Ok(())
}
