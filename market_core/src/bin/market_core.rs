use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use market_core::{
    calendar::{overrides::load_overrides_path, validate_holiday_policy},
    config::CoreConfig,
    live_archive::LiveArchive,
    timeframe::Timeframe,
    timestamps::now_ms,
};

#[derive(Parser)]
#[command(version, about = "Market core operator CLI")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    Calendar(CalendarCmd),
    Cache(CacheCmd),
    Archive(ArchiveCmd),
}

#[derive(Args)]
struct CalendarCmd {
    #[command(subcommand)]
    sub: CalendarSub,
}

#[derive(Subcommand)]
enum CalendarSub {
    /// Market state at an instant (defaults to now).
    State {
        #[arg(long, value_name = "EPOCH_MS")]
        ts: Option<i64>,
    },
    /// Closed-reason codes at an instant (defaults to now).
    Explain {
        #[arg(long, value_name = "EPOCH_MS")]
        ts: Option<i64>,
    },
    /// Validate the holiday policy of every profile in the overrides file.
    CheckPolicy,
}

#[derive(Args)]
struct CacheCmd {
    #[command(subcommand)]
    sub: CacheSub,
}

#[derive(Subcommand)]
enum CacheSub {
    Summary {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        tf: Timeframe,
    },
    Tail {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        tf: Timeframe,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Args)]
struct ArchiveCmd {
    #[command(subcommand)]
    sub: ArchiveSub,
}

#[derive(Subcommand)]
enum ArchiveSub {
    Count {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        tf: Timeframe,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = CoreConfig::from_env()?;

    match cli.cmd {
        Cmd::Calendar(CalendarCmd { sub }) => match sub {
            CalendarSub::State { ts } => {
                let cal = cfg.build_calendar()?;
                let state = cal.market_state(ts.unwrap_or_else(now_ms));
                println!("{}", serde_json::to_string_pretty(&state)?);
            }
            CalendarSub::Explain { ts } => {
                let cal = cfg.build_calendar()?;
                let reasons = cal.explain(ts.unwrap_or_else(now_ms));
                println!("{}", serde_json::to_string(&reasons)?);
            }
            CalendarSub::CheckPolicy => {
                let now = now_ms();
                let mut failed = 0usize;
                for (tag, profile) in load_overrides_path(&cfg.calendar_overrides_path)? {
                    match validate_holiday_policy(&profile, now) {
                        Ok(()) => println!("OK {tag}"),
                        Err(e) => {
                            failed += 1;
                            println!("FAIL {tag}: {e}");
                        }
                    }
                }
                if failed > 0 {
                    bail!("{failed} calendar profile(s) failed the holiday policy");
                }
            }
        },
        Cmd::Cache(CacheCmd { sub }) => match sub {
            CacheSub::Summary { symbol, tf } => {
                let mut cache = cfg.file_cache(&symbol, tf)?;
                cache.load()?;
                println!("{}", serde_json::to_string_pretty(&cache.summary())?);
            }
            CacheSub::Tail { symbol, tf, limit } => {
                let mut cache = cfg.file_cache(&symbol, tf)?;
                cache.load()?;
                println!("{}", serde_json::to_string_pretty(&cache.query(limit, None, None))?);
            }
        },
        Cmd::Archive(ArchiveCmd { sub: ArchiveSub::Count { symbol, tf } }) => {
            let mut archive = cfg.open_archive()?;
            println!("{}", archive.count(&symbol, tf.as_str())?);
        }
    }

    Ok(())
}
