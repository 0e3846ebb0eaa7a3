//! Tradedesk
//!
//! Crypto trading desk tools: risk-based position sizing for leveraged trades,
//! a per-user trade journal with performance statistics, and candle analytics
//! over a live market data feed.

mod analysis;
mod api;
mod config;
mod db;
mod exchange;
mod journal;
mod metrics;
mod models;
mod trading;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::analysis::{
    fibonacci_levels, identify_pattern, price_action, snapshot_structure, support_resistance,
};
use crate::api::{FeedState, MarketClient, PriceWatcher};
use crate::config::AppConfig;
use crate::db::{Database, SessionStore, VerifyOutcome, CODE_TTL_MINUTES};
use crate::exchange::{AccountType, ExchangeTable};
use crate::journal::{TradeFilter, TradeJournal};
use crate::models::{parse_tags, Direction, Interval, NewTrade, QuantityType, Trade, TradePatch};
use crate::trading::{CalculationInput, PositionCalculator, RiskConfig};

/// Crypto trading desk CLI.
#[derive(Parser)]
#[command(name = "tradedesk")]
#[command(about = "Position sizing, trade journal and candle analytics for crypto traders", long_about = None)]
struct Cli {
    /// Database URL (overrides TRADEDESK_DATABASE_URL)
    #[arg(short, long)]
    database: Option<String>,

    /// Market data base URL (overrides TRADEDESK_FEED_URL)
    #[arg(long)]
    feed_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Journal owner; defaults to the signed-in user
    #[arg(short, long, global = true, env = "TRADEDESK_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Size a position from account risk
    Calc {
        /// Account balance in quote currency
        #[arg(short, long, default_value = "10000")]
        balance: String,

        /// Percent of the balance to risk
        #[arg(short, long, default_value = "1")]
        risk: String,

        /// Entry price
        #[arg(short, long)]
        entry: String,

        /// Stop-loss price
        #[arg(short, long)]
        stop: String,

        /// Take-profit price (repeat up to three times)
        #[arg(short, long = "tp")]
        take_profits: Vec<String>,

        #[arg(short = 'D', long, value_enum, default_value = "long")]
        direction: Direction,

        /// Leverage multiplier; omit for an unleveraged position
        #[arg(short = 'x', long)]
        leverage: Option<String>,

        /// Exchange id (see `tradedesk exchanges`)
        #[arg(long)]
        exchange: Option<String>,

        #[arg(short, long, value_enum, default_value = "futures")]
        account: AccountType,
    },

    /// List supported exchanges with fees and leverage caps
    Exchanges {
        /// Show only this account type
        #[arg(short, long, value_enum)]
        account: Option<AccountType>,
    },

    /// Manage journal trades
    Trade {
        #[command(subcommand)]
        action: TradeCommand,
    },

    /// Show journal performance statistics
    Stats,

    /// Export the journal as CSV
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import trades from a CSV export
    Import {
        path: PathBuf,
    },

    /// Show 24h tickers
    Price {
        /// Pairs such as BTC/USDT
        #[arg(required = true)]
        pairs: Vec<String>,
    },

    /// Analyse the last two candles of a pair
    Candles {
        pair: String,

        #[arg(short, long, value_enum, default_value = "15m")]
        interval: Interval,
    },

    /// Trend, range position and key levels of a pair
    Structure {
        pair: String,

        #[arg(short, long, value_enum, default_value = "15m")]
        interval: Interval,
    },

    /// Poll a pair's price until interrupted
    Watch {
        pair: String,

        /// Polling interval in seconds (overrides TRADEDESK_POLL_INTERVAL_SECS)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Request a sign-in verification code
    Login {
        email: String,
    },

    /// Complete sign-in with the verification code
    Verify {
        code: String,

        /// Address the code was issued for (defaults to the pending one)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Show the signed-in user
    Whoami,

    /// Sign out
    Logout,

    /// Show effective configuration
    Config,
}

#[derive(Subcommand)]
enum TradeCommand {
    /// Record a trade; with --exit it is stored closed
    Add {
        /// Pair such as BTC/USDT
        pair: String,

        #[arg(value_enum)]
        direction: Direction,

        #[arg(short, long)]
        entry: Decimal,

        #[arg(short, long)]
        quantity: Decimal,

        /// Quantity is in quote currency instead of base units
        #[arg(long)]
        quote: bool,

        #[arg(long)]
        exit: Option<Decimal>,

        #[arg(short, long)]
        stop: Option<Decimal>,

        #[arg(short, long)]
        take_profit: Option<Decimal>,

        #[arg(short = 'x', long, default_value = "1")]
        leverage: u32,

        #[arg(long)]
        exchange: Option<String>,

        #[arg(long, default_value = "0")]
        fees: Decimal,

        #[arg(short, long, default_value = "")]
        notes: String,

        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,

        /// Entry time, RFC 3339 (defaults to now)
        #[arg(long)]
        date: Option<DateTime<Utc>>,
    },

    /// Edit fields of a trade
    Edit {
        id: String,

        #[arg(long)]
        pair: Option<String>,

        #[arg(long, value_enum)]
        direction: Option<Direction>,

        #[arg(short, long)]
        entry: Option<Decimal>,

        #[arg(long)]
        exit: Option<Decimal>,

        #[arg(short, long)]
        quantity: Option<Decimal>,

        #[arg(short, long)]
        stop: Option<Decimal>,

        #[arg(short, long)]
        take_profit: Option<Decimal>,

        #[arg(short = 'x', long)]
        leverage: Option<u32>,

        #[arg(long)]
        exchange: Option<String>,

        #[arg(long)]
        fees: Option<Decimal>,

        #[arg(short, long)]
        notes: Option<String>,

        #[arg(long)]
        tags: Option<String>,
    },

    /// Close an open trade at an exit price
    Close {
        id: String,

        exit: Decimal,

        /// Exit time, RFC 3339 (defaults to now)
        #[arg(long)]
        date: Option<DateTime<Utc>>,
    },

    /// Delete a trade
    Delete {
        id: String,
    },

    /// List trades
    List {
        #[arg(short, long, value_enum, default_value = "all")]
        filter: TradeFilter,
    },

    /// Show one trade in full
    Show {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins over --log-level
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(log_level).into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = AppConfig::from_env()?;
    if let Some(url) = cli.database {
        config.database_url = url;
    }
    if let Some(url) = cli.feed_url {
        config.feed_url = url;
    }

    let exchanges = ExchangeTable::builtin_with_default(&config.default_exchange)?;

    match cli.command {
        Commands::Calc {
            balance,
            risk,
            entry,
            stop,
            take_profits,
            direction,
            leverage,
            exchange,
            account,
        } => {
            let input = CalculationInput {
                account_balance: balance,
                risk_percent: risk,
                entry_price: entry,
                stop_price: stop,
                take_profits,
                direction,
                use_leverage: leverage.is_some(),
                leverage: leverage.unwrap_or_else(|| "1".to_string()),
                exchange: exchange.unwrap_or_else(|| exchanges.default_exchange().id.clone()),
                account_type: account,
            };
            run_calc(&exchanges, &input);
        }

        Commands::Exchanges { account } => {
            let accounts = account.map(|a| vec![a]).unwrap_or_else(|| AccountType::ALL.to_vec());

            println!(
                "\n{:<12} {:<10} {:>9} {:>9} {:>10} {:>8}",
                "EXCHANGE", "ACCOUNT", "MAKER%", "TAKER%", "FUNDING%", "MAX LEV"
            );
            println!("{}", "-".repeat(63));

            for venue in exchanges.iter() {
                for account_type in venue
                    .available_account_types()
                    .into_iter()
                    .filter(|a| accounts.contains(a))
                {
                    let fees = venue.fees(account_type);
                    println!(
                        "{:<12} {:<10} {:>9.3} {:>9.3} {:>10.4} {:>7}x",
                        venue.id,
                        account_type,
                        fees.maker,
                        fees.taker,
                        fees.funding,
                        venue.max_leverage(account_type)
                    );
                }
            }
        }

        Commands::Trade { action } => {
            let db = Database::new(&config.database_url).await?;
            let user = resolve_user(cli.user, &db.sessions()).await?;
            let journal = TradeJournal::new(db.trades());
            let default_exchange = exchanges.default_exchange().id.clone();
            run_trade_command(&journal, &user, action, default_exchange).await?;
        }

        Commands::Stats => {
            let db = Database::new(&config.database_url).await?;
            let user = resolve_user(cli.user, &db.sessions()).await?;
            let stats = TradeJournal::new(db.trades()).stats(&user).await?;

            println!("\n=== Journal: {} ===", user);
            println!("Total Trades:   {} ({} open, {} closed)", stats.total_trades, stats.open_trades, stats.closed_trades);

            if !stats.has_closed_trades() {
                println!("\nNo closed trades yet.");
                return Ok(());
            }

            println!("\n--- Win/Loss ---");
            println!("Wins / Losses:  {} / {}", stats.wins, stats.losses);
            println!("Win Rate:       {:.1}%", stats.win_rate);
            println!("Total P&L:      ${:.2}", stats.total_profit_loss);
            println!("Avg Win:        ${:.2}", stats.avg_win);
            println!("Avg Loss:       ${:.2}", stats.avg_loss);
            println!("Largest Win:    ${:.2}", stats.largest_win);
            println!("Largest Loss:   ${:.2}", stats.largest_loss);

            println!("\n--- Edge ---");
            println!("Profit Factor:  {}", stats.profit_factor_label());
            println!("Expectancy:     ${:.2}", stats.expectancy);
            println!("P&L Std Dev:    ${:.2}", stats.pnl_std_dev);

            println!("\n--- Rankings ---");
            println!("Best Pair:      {}", stats.best_pair);
            println!("Worst Pair:     {}", stats.worst_pair);
            println!("Best Exchange:  {}", stats.best_exchange);
        }

        Commands::Export { output } => {
            let db = Database::new(&config.database_url).await?;
            let user = resolve_user(cli.user, &db.sessions()).await?;
            let csv = TradeJournal::new(db.trades()).export_csv(&user).await?;

            match output {
                Some(path) => {
                    std::fs::write(&path, format!("{csv}\n"))
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!(path = %path.display(), "Journal exported");
                }
                None => println!("{csv}"),
            }
        }

        Commands::Import { path } => {
            let db = Database::new(&config.database_url).await?;
            let user = resolve_user(cli.user, &db.sessions()).await?;
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;

            let count = TradeJournal::new(db.trades()).import_csv(&user, &text).await?;
            println!("Imported {} trades", count);
        }

        Commands::Price { pairs } => {
            let client = MarketClient::new(&config.feed_url, config.feed_timeout())?;
            let tickers = client.tickers(&pairs).await;

            if tickers.is_empty() {
                println!("No prices available. Check the pairs and your connection.");
                return Ok(());
            }

            println!(
                "\n{:<12} {:>14} {:>9} {:>14} {:>14} {:>16}",
                "PAIR", "PRICE", "24H%", "HIGH", "LOW", "VOLUME"
            );
            println!("{}", "-".repeat(84));
            for t in tickers {
                println!(
                    "{:<12} {:>14.4} {:>8.2}% {:>14.4} {:>14.4} {:>16.2}",
                    t.symbol, t.price, t.price_change_percent, t.high_24h, t.low_24h, t.volume_24h
                );
            }
        }

        Commands::Candles { pair, interval } => {
            let client = MarketClient::new(&config.feed_url, config.feed_timeout())?;
            let Some(snapshot) = client.ohlcv(&pair, interval).await else {
                println!("No candle data for {} ({}). Try again.", pair, interval.label());
                return Ok(());
            };

            let current = &snapshot.current;
            println!("\n=== {} {} ===", snapshot.symbol, interval.label());
            println!(
                "O {:.4}  H {:.4}  L {:.4}  C {:.4}  V {:.2}",
                current.open, current.high, current.low, current.close, current.volume
            );
            println!(
                "Change: {:+.4} ({:+.2}%)   Volume change: {:+.2}%",
                snapshot.price_change, snapshot.price_change_percent, snapshot.volume_change_percent
            );
            let pattern = identify_pattern(current);
            println!("Pattern: {} ({})", pattern, pattern.bias().as_str());

            let report = price_action(&snapshot);
            println!(
                "\nBody {:.1}%  Upper wick {:.1}%  Lower wick {:.1}%",
                report.candle.body_percent, report.candle.upper_wick_percent, report.candle.lower_wick_percent
            );
            for pattern in &report.candle.patterns {
                println!("  * {}", pattern.label());
            }
            println!("Volume: {}", report.volume.band.label());

            println!("\nSignals:");
            for signal in &report.signals {
                println!("  - {}", signal);
            }

            let levels = support_resistance(&snapshot);
            println!("\nResistance:");
            for level in levels.resistance_levels() {
                println!("  {:.4} ({}, {} touches)", level.price, level.strength.as_str(), level.touches);
            }
            println!("Support:");
            for level in levels.support_levels() {
                println!("  {:.4} ({}, {} touches)", level.price, level.strength.as_str(), level.touches);
            }
        }

        Commands::Structure { pair, interval } => {
            let client = MarketClient::new(&config.feed_url, config.feed_timeout())?;
            let Some(snapshot) = client.ohlcv(&pair, interval).await else {
                println!("No candle data for {} ({}). Try again.", pair, interval.label());
                return Ok(());
            };

            let read = snapshot_structure(&snapshot);
            println!("\n=== {} {} ===", snapshot.symbol, interval.label());
            println!("Trend: {} - {}", read.trend, read.trend.description());

            match read.range_position {
                Some(position) => {
                    println!("Range position: {:.1}%", position);
                    if let Some(zone) = read.zone {
                        println!("  {}", zone.description());
                    }
                }
                None => println!("Range position: n/a (flat candle)"),
            }

            println!("\nFibonacci ({:.4} - {:.4}):", snapshot.current.low, snapshot.current.high);
            for level in fibonacci_levels(snapshot.current.high, snapshot.current.low) {
                println!("  {:>6}  {:.4}", level.label(), level.price);
            }
        }

        Commands::Watch { pair, interval } => {
            let client = Arc::new(MarketClient::new(&config.feed_url, config.feed_timeout())?);
            let period = interval
                .map(std::time::Duration::from_secs)
                .unwrap_or_else(|| config.poll_interval());

            // Retries on a failed tick stop well before the next one is due
            let watcher = PriceWatcher::new(client, &pair, period).with_refresh_budget(period / 2);
            let handle = watcher.spawn(|state| match state {
                FeedState::Loading => println!("Loading..."),
                FeedState::Ready(t) => println!(
                    "{} {} {:.4} ({:+.2}%)",
                    t.fetched_at.format("%H:%M:%S"),
                    t.symbol,
                    t.price,
                    t.price_change_percent
                ),
                FeedState::Failed { last } => match last {
                    Some(t) => println!("Fetch failed; last price {:.4} at {}", t.price, t.fetched_at.format("%H:%M:%S")),
                    None => println!("Fetch failed; retrying on next tick"),
                },
            });

            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
            handle.abort();

            if let Some(last) = watcher.state().await.latest() {
                println!("Last price {} {:.4} at {}", last.symbol, last.price, last.fetched_at.format("%H:%M:%S"));
            }
        }

        Commands::Login { email } => {
            let db = Database::new(&config.database_url).await?;
            let pending = db.sessions().request_code(&email).await?;

            println!("Verification code for {}: {}", pending.email, pending.code);
            println!("Valid for {} minutes. Run `tradedesk verify <code>`.", CODE_TTL_MINUTES);
        }

        Commands::Verify { code, email } => {
            let db = Database::new(&config.database_url).await?;
            let sessions = db.sessions();

            let email = match email {
                Some(email) => email,
                None => match sessions.pending_code().await? {
                    Some(pending) => pending.email,
                    None => {
                        println!("No verification pending. Run `tradedesk login <email>` first.");
                        return Ok(());
                    }
                },
            };

            match sessions.verify(&email, &code).await? {
                VerifyOutcome::SignedIn(user) => println!("Signed in as {}", user.email),
                VerifyOutcome::NoPendingCode => println!("No verification pending. Run `tradedesk login <email>` first."),
                VerifyOutcome::Mismatch => println!("Invalid code."),
                VerifyOutcome::Expired => println!("Code expired. Run `tradedesk login {}` again.", email),
            }
        }

        Commands::Whoami => {
            let db = Database::new(&config.database_url).await?;
            match db.sessions().active_user().await? {
                Some(user) => println!(
                    "{} (since {}, last login {})",
                    user.email,
                    user.created_at.format("%Y-%m-%d"),
                    user.last_login.format("%Y-%m-%d %H:%M")
                ),
                None => println!("Not signed in."),
            }
        }

        Commands::Logout => {
            let db = Database::new(&config.database_url).await?;
            if db.sessions().sign_out().await? {
                println!("Signed out.");
            } else {
                println!("Not signed in.");
            }
        }

        Commands::Config => {
            let risk = RiskConfig::default();

            println!("\n=== Configuration ===\n");
            println!("  Database:             {}", config.database_url);
            println!("  Feed URL:             {}", config.feed_url);
            println!("  Feed Timeout:         {}s", config.feed_timeout_secs);
            println!("  Poll Interval:        {}s", config.poll_interval_secs);
            println!("  Default Exchange:     {}", exchanges.default_exchange().id);

            println!("\n=== Risk Warnings ===\n");
            println!("  Max Risk / Trade:     {}%", risk.max_risk_percent);
            println!("  Min Reward Ratio:     {}:1", risk.min_reward_ratio);
            println!("  Large Position:       {}% of balance", risk.large_position_fraction * 100.0);
            println!(
                "  Leverage Bands:       {}x / {}x / {}x",
                risk.elevated_leverage, risk.high_leverage, risk.extreme_leverage
            );
            println!("  Liquidation Buffer:   {}%", risk.liquidation_buffer_percent);
            println!("  Funding Horizon:      {}h", risk.funding_hours);
        }
    }

    Ok(())
}

/// Explicit `--user`, otherwise the signed-in identity.
async fn resolve_user(explicit: Option<String>, sessions: &SessionStore) -> Result<String> {
    if let Some(user) = explicit {
        return Ok(user);
    }
    match sessions.active_user().await? {
        Some(user) => Ok(user.email),
        None => bail!("Not signed in. Run `tradedesk login <email>` or pass --user"),
    }
}

fn run_calc(exchanges: &ExchangeTable, input: &CalculationInput) {
    let calculator = PositionCalculator::new(exchanges, RiskConfig::default());

    let result = match calculator.calculate(input) {
        Ok(result) => Some(result),
        Err(e) => {
            println!("Complete the inputs to see results ({}).", e);
            None
        }
    };

    if let Some(r) = &result {
        println!("\n=== Position ({} on {} {}) ===\n", input.direction, input.exchange, input.account_type);
        println!("Risk Amount:          ${:.2}", r.risk_amount);
        println!("Stop Distance:        {:.2}%", r.stop_loss_distance);
        println!("Position Size:        ${:.2}", r.position_size);
        println!("Quantity:             {:.6}", r.quantity);

        if input.use_leverage {
            println!("\n--- Leverage ({}x, max {}x) ---", r.leverage, r.max_leverage);
            println!("Leveraged Size:       ${:.2}", r.leveraged_position_size);
            println!("Margin Required:      ${:.2}", r.margin_required);
            println!("Liquidation Price:    {:.4} ({:.2}% away)", r.liquidation_price, r.distance_to_liquidation);
            println!(
                "Maintenance Margin:   ${:.2} ({:.2}%)",
                r.maintenance_margin,
                r.maintenance_margin_rate * 100.0
            );
            println!("Funding (est.):       ${:.2}", r.funding_cost);
        }

        println!("\n--- Costs ---");
        println!("Fees (round trip):    ${:.2}", r.total_fees);
        println!("Breakeven Price:      {:.4}", r.breakeven_price);

        if !r.take_profits.is_empty() {
            println!("\n--- Targets ---");
            for tp in &r.take_profits {
                println!(
                    "{:<4} {:>12.4}  {:>+7.2}%  ${:>10.2}  {:.2}R",
                    tp.name, tp.price, tp.percent_gain, tp.profit, tp.reward_ratio
                );
            }
            println!("Reward Ratio:         {:.2}:1", r.reward_ratio);
            println!("Win Rate Needed:      {:.1}%", r.win_rate_needed);
        }
    }

    let warnings = calculator.validate(input, result.as_ref());
    if !warnings.is_empty() {
        println!("\n--- Warnings ---");
        for warning in warnings {
            println!("{}", warning);
        }
    }
}

async fn run_trade_command<R: journal::TradeRepository>(
    journal: &TradeJournal<R>,
    user: &str,
    action: TradeCommand,
    default_exchange: String,
) -> Result<()> {
    match action {
        TradeCommand::Add {
            pair,
            direction,
            entry,
            quantity,
            quote,
            exit,
            stop,
            take_profit,
            leverage,
            exchange,
            fees,
            notes,
            tags,
            date,
        } => {
            let mut new = NewTrade::new(&pair, direction, entry, quantity);
            new.quantity_type = if quote { QuantityType::Quote } else { QuantityType::Base };
            new.exit_price = exit;
            new.stop_loss = stop;
            new.take_profit = take_profit;
            new.leverage = leverage;
            new.exchange = exchange.unwrap_or(default_exchange);
            new.fees = fees;
            new.notes = notes;
            new.tags = parse_tags(&tags);
            if let Some(date) = date {
                new.entry_date = date;
            }

            let trade = journal.add(user, new).await?;
            println!("Added trade {}", trade.id);
            print_trade(&trade);
        }

        TradeCommand::Edit {
            id,
            pair,
            direction,
            entry,
            exit,
            quantity,
            stop,
            take_profit,
            leverage,
            exchange,
            fees,
            notes,
            tags,
        } => {
            let patch = TradePatch {
                pair,
                direction,
                entry_price: entry,
                exit_price: exit,
                quantity,
                stop_loss: stop,
                take_profit,
                leverage,
                exchange,
                fees,
                notes,
                tags: tags.as_deref().map(parse_tags),
                ..Default::default()
            };
            if patch.is_empty() {
                println!("Nothing to change.");
                return Ok(());
            }

            match journal.update(user, &id, patch).await? {
                Some(trade) => print_trade(&trade),
                None => println!("Trade {} not found", id),
            }
        }

        TradeCommand::Close { id, exit, date } => {
            match journal.close(user, &id, exit, date.unwrap_or_else(Utc::now)).await? {
                Some(trade) => print_trade(&trade),
                None => println!("Trade {} not found or already closed", id),
            }
        }

        TradeCommand::Delete { id } => {
            if journal.delete(user, &id).await? {
                println!("Deleted trade {}", id);
            } else {
                println!("Trade {} not found", id);
            }
        }

        TradeCommand::List { filter } => {
            let trades = journal.list_filtered(user, filter).await?;
            if trades.is_empty() {
                println!("No trades. Use 'tradedesk trade add' to record one.");
                return Ok(());
            }

            println!(
                "\n{:<36} {:<10} {:<5} {:>12} {:>12} {:>4} {:<7} {:>12}",
                "ID", "PAIR", "SIDE", "ENTRY", "EXIT", "LEV", "STATUS", "P&L"
            );
            println!("{}", "-".repeat(106));
            for t in trades {
                println!(
                    "{:<36} {:<10} {:<5} {:>12} {:>12} {:>3}x {:<7} {:>12}",
                    t.id,
                    t.pair,
                    t.direction,
                    t.entry_price.normalize(),
                    t.exit_price.map(|p| p.normalize().to_string()).unwrap_or_else(|| "-".to_string()),
                    t.leverage,
                    t.status.as_str(),
                    format!("{:.2}", t.profit_loss)
                );
            }
        }

        TradeCommand::Show { id } => match journal.get(user, &id).await? {
            Some(trade) => print_trade(&trade),
            None => println!("Trade {} not found", id),
        },
    }

    Ok(())
}

fn print_trade(t: &Trade) {
    println!("\n=== {} {} ({}) ===", t.pair, t.direction, t.status.as_str());
    println!("Id:          {}", t.id);
    println!("Exchange:    {}", t.exchange);
    println!("Entry:       {} at {}", t.entry_price.normalize(), t.entry_date.to_rfc3339());
    if let Some(exit) = t.exit_price {
        let date = t.exit_date.map(|d| d.to_rfc3339()).unwrap_or_default();
        println!("Exit:        {} at {}", exit.normalize(), date);
    }
    println!(
        "Quantity:    {} {} ({} {})",
        t.quantity.normalize(),
        t.quantity_type.as_str(),
        t.base_quantity()
            .map(|q| q.round_dp(8).normalize().to_string())
            .unwrap_or_else(|| "-".to_string()),
        t.base_currency()
    );
    println!("Leverage:    {}x", t.leverage);
    if let Some(stop) = t.stop_loss {
        println!("Stop Loss:   {}", stop.normalize());
    }
    if let Some(tp) = t.take_profit {
        println!("Take Profit: {}", tp.normalize());
    }
    if !t.is_open() {
        println!(
            "P&L:         {:.2} ({:.2}%) {}",
            t.profit_loss,
            t.profit_loss_percent,
            t.outcome.as_str()
        );
    }
    if t.fees > Decimal::ZERO {
        println!("Fees:        {}", t.fees.normalize());
    }
    if !t.tags.is_empty() {
        println!("Tags:        {}", t.tags.join(", "));
    }
    if !t.notes.is_empty() {
        println!("Notes:       {}", t.notes);
    }
}
