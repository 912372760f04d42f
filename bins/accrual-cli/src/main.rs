//! accrual-cli: operator tool for the accrual ledger.
//!
//! Runs the reference accrual scenario, demonstrates the zero-balance rate
//! re-pin, and replays JSON operation logs against an in-memory vault.

mod replay;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use accrual_core::constants::SCALE;
use accrual_core::types::{Address, Amount};
use accrual_ledger::{AccrualLedger, LedgerConfig, ManualClock, MemoryPrincipalStore, RoleTable};

use crate::replay::{Replay, ReplayOp};

/// One whole claim token in base units.
const TOKEN: u128 = SCALE as u128;
/// Mint/burn identity used by `scenario`, `exploit` and `replay`.
const POOL: Address = Address([0xB0; 20]);
const ALICE: Address = Address([0x01; 20]);
const BOB: Address = Address([0x02; 20]);
const CAROL: Address = Address([0x03; 20]);

/// Accrual ledger operator CLI.
#[derive(Parser)]
#[command(name = "accrual-cli")]
#[command(version, about = "Interest-accruing claim ledger tools")]
struct Cli {
    /// Path to a JSON config file (default: <config dir>/accrual/config.json if present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter override (e.g. "debug", "accrual_ledger=trace").
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format override: "text" or "json".
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deposit, sample the balance at fixed steps, lower the rate, transfer.
    Scenario(ScenarioArgs),
    /// Show a drained account being re-pinned to an older, higher rate.
    Exploit,
    /// Replay a JSON list of operations and print final balances.
    Replay(ReplayArgs),
}

#[derive(Args)]
struct ScenarioArgs {
    /// Seconds between balance samples.
    #[arg(long, default_value = "7200")]
    step: u64,

    /// Number of samples after the deposit.
    #[arg(long, default_value = "3")]
    samples: u32,

    /// Global rate after the sampling phase.
    #[arg(long, default_value = "40000000000")]
    lower_to: u64,
}

#[derive(Args)]
struct ReplayArgs {
    /// JSON file with the operation list.
    file: PathBuf,

    /// Write a bincode snapshot of the final ledger here.
    #[arg(long)]
    snapshot_out: Option<PathBuf>,

    /// Log failed operations and continue instead of aborting.
    #[arg(long)]
    keep_going: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    init_logging(&config.log_level, &config.log_format);

    info!(
        rate = config.initial_global_rate,
        admin = %config.admin,
        minters = config.minters.len(),
        "configuration loaded"
    );

    match cli.command {
        Commands::Scenario(args) => run_scenario(&config, args),
        Commands::Exploit => run_exploit(&config),
        Commands::Replay(args) => run_replay(&config, args),
    }
}

/// Explicit file, else the per-user default file if it exists, else env only.
fn load_config(explicit: Option<&Path>) -> Result<LedgerConfig> {
    if let Some(path) = explicit {
        return LedgerConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    match default_config_path() {
        Some(path) if path.exists() => LedgerConfig::from_json_file(&path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        _ => LedgerConfig::from_env().context("Invalid ACCRUAL_* environment"),
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("accrual").join("config.json"))
}

fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}

fn scenario_ledger(
    config: &LedgerConfig,
    clock: &ManualClock,
) -> AccrualLedger<MemoryPrincipalStore, RoleTable, ManualClock> {
    AccrualLedger::in_memory(
        config.role_table().with_minter(POOL),
        clock.clone(),
        config.initial_global_rate,
    )
}

fn run_scenario(config: &LedgerConfig, args: ScenarioArgs) -> Result<()> {
    let clock = ManualClock::new(0);
    let mut ledger = scenario_ledger(config, &clock);

    ledger.mint(&POOL, &ALICE, TOKEN)?;
    println!("global rate: {}", ledger.global_rate());
    println!("t={:<8} balance={}", 0, format_units(ledger.effective_balance_of(&ALICE)?));

    let mut previous = TOKEN;
    let mut deltas = Vec::with_capacity(args.samples as usize);
    for _ in 0..args.samples {
        let now = clock.advance(args.step);
        let balance = ledger.effective_balance_of(&ALICE)?;
        let delta = balance.saturating_sub(previous);
        println!("t={:<8} balance={}  delta={}", now, format_units(balance), delta);
        deltas.push(delta);
        previous = balance;
    }
    let linear = deltas.windows(2).all(|w| w[0].abs_diff(w[1]) <= 1);
    println!("linear within 1 unit: {linear}");

    let change = ledger.set_global_rate(&config.admin, args.lower_to)?;
    println!(
        "global rate lowered {} -> {} (version {})",
        change.old, change.new, change.version
    );

    ledger.transfer(&ALICE, &ALICE, &BOB, Amount::Exact(TOKEN / 10))?;
    println!("alice rate: {}", ledger.rate_of(&ALICE));
    println!("bob rate:   {} (inherited from alice)", ledger.rate_of(&BOB));
    Ok(())
}

fn run_exploit(config: &LedgerConfig) -> Result<()> {
    let clock = ManualClock::new(0);
    let mut ledger = scenario_ledger(config, &clock);
    let original = ledger.global_rate();
    let lowered = original / 2;
    if lowered == original {
        bail!("initial global rate {original} cannot be lowered");
    }

    ledger.mint(&POOL, &ALICE, TOKEN)?;
    ledger.mint(&POOL, &BOB, TOKEN)?;
    println!("alice and bob deposit at rate {original}");

    clock.advance(3_600);
    let change = ledger.set_global_rate(&config.admin, lowered)?;
    println!("global rate lowered {} -> {}", change.old, change.new);

    ledger.mint(&POOL, &CAROL, TOKEN)?;
    println!("carol deposits now and gets rate {}", ledger.rate_of(&CAROL));

    let drained = ledger.transfer(&CAROL, &CAROL, &BOB, Amount::All)?;
    println!(
        "carol drains {} to bob; carol principal {}",
        format_units(drained),
        ledger.principal_of(&CAROL)
    );

    ledger.transfer(&ALICE, &ALICE, &CAROL, Amount::Exact(1))?;
    println!(
        "alice sends carol 1 unit; carol is re-pinned to {} while the global rate is {}",
        ledger.rate_of(&CAROL),
        ledger.global_rate()
    );

    ledger.transfer(&BOB, &BOB, &CAROL, Amount::Exact(drained))?;
    println!(
        "bob returns the funds; carol now earns {} on {}",
        ledger.rate_of(&CAROL),
        format_units(ledger.effective_balance_of(&CAROL)?)
    );
    Ok(())
}

fn run_replay(config: &LedgerConfig, args: ReplayArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let ops = ReplayOp::parse_list(&raw)?;

    let mut replay = Replay::new(config, POOL);
    let failed = replay.run(&ops, args.keep_going)?;
    info!(ops = ops.len(), failed, "replay finished");

    println!("t={} global rate {}", replay.now(), replay.ledger().lock().global_rate());
    println!("reserve: {}", format_units(replay.reserve_balance()));
    for row in replay.balances()? {
        println!(
            "{}  principal={}  rate={}  effective={}",
            row.account,
            row.principal,
            row.rate,
            format_units(row.effective)
        );
    }

    if let Some(path) = args.snapshot_out {
        let bytes = replay.snapshot().encode()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        println!("snapshot written to {} ({} bytes)", path.display(), bytes.len());
    }
    Ok(())
}

/// Base units as a decimal number of whole tokens.
fn format_units(units: u128) -> String {
    format!("{}.{:018}", units / TOKEN, units % TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use accrual_ledger::LedgerSnapshot;
    use std::io::Write;

    const ADMIN: Address = Address([0xA0; 20]);

    fn config() -> LedgerConfig {
        LedgerConfig {
            admin: ADMIN,
            ..LedgerConfig::default()
        }
    }

    #[test]
    fn format_units_pads_fraction() {
        assert_eq!(format_units(TOKEN), "1.000000000000000000");
        assert_eq!(format_units(TOKEN + 5), "1.000000000000000005");
        assert_eq!(format_units(0), "0.000000000000000000");
        assert_eq!(format_units(20 * TOKEN + 7), "20.000000000000000007");
    }

    #[test]
    fn scenario_runs_with_defaults() {
        let args = ScenarioArgs {
            step: 7_200,
            samples: 3,
            lower_to: 40_000_000_000,
        };
        run_scenario(&config(), args).unwrap();
    }

    #[test]
    fn scenario_rejects_rate_increase() {
        let args = ScenarioArgs {
            step: 60,
            samples: 1,
            lower_to: 60_000_000_000,
        };
        assert!(run_scenario(&config(), args).is_err());
    }

    #[test]
    fn exploit_runs() {
        run_exploit(&config()).unwrap();
    }

    #[test]
    fn replay_writes_decodable_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let ops_path = dir.path().join("ops.json");
        let snap_path = dir.path().join("out").join("ledger.snap");
        let mut f = std::fs::File::create(&ops_path).unwrap();
        write!(
            f,
            r#"[{{"op": "deposit", "account": "{ALICE}", "amount": 77}}]"#
        )
        .unwrap();

        run_replay(
            &config(),
            ReplayArgs {
                file: ops_path,
                snapshot_out: Some(snap_path.clone()),
                keep_going: false,
            },
        )
        .unwrap();

        let snap = LedgerSnapshot::decode(&std::fs::read(&snap_path).unwrap()).unwrap();
        assert_eq!(snap.accounts, vec![(ALICE, snap.accounts[0].1)]);
        assert_eq!(snap.accounts[0].1.principal, 77);
    }

    #[test]
    fn explicit_config_file_is_used() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"initial_global_rate": 123}}"#).unwrap();
        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.initial_global_rate, 123);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/accrual.json"))).is_err());
    }
}
