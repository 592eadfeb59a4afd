//! Command Line Interface for rbn-lens.
use anyhow::{Result, bail};
use chrono::{NaiveDate, NaiveTime, TimeDelta, Utc};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use prettytable::{Table, row};
use rbn_lens_data::providers::{
    AirtableProvider, CredoraProvider, DeribitProvider, EtherscanProvider, GasPrices,
    LidoProvider,
};
use rbn_lens_data::{
    BatchFetcher, GasOracle, LatestValue, PollEvent, PollOutcome, Poller, ProviderConfig,
    default_fetcher,
};
use rbn_lens_domain::boost::{BoostInputs, compute_boost, required_voting_power_for_max_boost};
use rbn_lens_domain::entities::{LockPosition, Token};
use rbn_lens_domain::payoff::{CurveResolution, PayoffRegistry, PayoffTerms, ProductId};
use rbn_lens_domain::value_objects::{PLACEHOLDER, format_or_placeholder};
use rbn_lens_domain::voting_power::compute_voting_power;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "rbn-lens")]
#[command(about = "Voting power, payoff curves and market data for Ribbon vaults", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Voting power of a lock
    VotingPower {
        /// Locked RBN (e.g., 1000 or 12.5)
        #[arg(short, long)]
        amount: String,

        /// Hours until the lock expires
        #[arg(long, conflicts_with = "expiry", allow_negative_numbers = true)]
        hours: Option<i64>,

        /// Lock expiry date (YYYY-MM-DD)
        #[arg(long)]
        expiry: Option<NaiveDate>,
    },
    /// Validate a new lock and preview its voting power
    Lock {
        /// RBN to lock
        #[arg(short, long)]
        amount: String,

        /// Lock duration in days
        #[arg(short, long)]
        days: i64,
    },
    /// Gauge reward boost for a deposit
    Boost {
        /// Gauge deposit
        #[arg(long)]
        deposit: Decimal,

        /// Total gauge deposits
        #[arg(long)]
        total_liquidity: Decimal,

        /// Your voting power
        #[arg(long, default_value = "0")]
        voting_power: Decimal,

        /// Total voting power supply
        #[arg(long)]
        voting_power_supply: Decimal,
    },
    /// Print a payoff curve for a product
    Payoff {
        /// Product (rEARN or rEARN-stETH)
        #[arg(short, long, default_value = "rEARN")]
        product: String,

        #[arg(long)]
        base_yield: Decimal,

        #[arg(long)]
        max_yield: Decimal,

        #[arg(long, allow_negative_numbers = true)]
        lower_barrier: Decimal,

        #[arg(long, allow_negative_numbers = true)]
        upper_barrier: Decimal,

        #[arg(long, default_value = "0")]
        participation_rate: Decimal,

        /// Points per curve segment
        #[arg(long, default_value_t = 5)]
        points: usize,

        /// Performance range shown beyond each barrier
        #[arg(long, default_value = "10")]
        padding: Decimal,
    },
    /// Earn-vault schedule from Airtable
    Schedule {
        /// Only show this product
        #[arg(short, long)]
        product: Option<String>,
    },
    /// List active option instruments on Deribit
    Instruments {
        #[arg(short, long, default_value = "ETH")]
        currency: String,
    },
    /// Mark prices for Deribit option instruments
    OptionPrices {
        /// Instrument names (e.g., ETH-27DEC24-2000-C)
        #[arg(required = true)]
        instruments: Vec<String>,
    },
    /// Current stETH staking APR
    StethApr,
    /// Current gas prices
    Gas,
    /// Poll gas prices on an interval
    WatchGas {
        /// Seconds between polls
        #[arg(short, long, default_value_t = 10)]
        interval: u64,

        /// Stop after this many polls
        #[arg(short, long)]
        count: Option<u64>,
    },
    /// Credora risk assessment for borrowers
    Risk {
        #[arg(required = true)]
        entities: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ProviderConfig::from_env()?;
    let fetcher = Arc::new(default_fetcher(config.retry));

    match &cli.command {
        Commands::VotingPower {
            amount,
            hours,
            expiry,
        } => {
            let rbn = Token::rbn();
            let locked = rbn.parse_amount(amount)?;
            let time_to_expiry = match (hours, expiry) {
                (Some(h), _) => hours_delta(*h)?,
                (None, Some(date)) => {
                    date.and_time(NaiveTime::MIN).and_utc() - Utc::now()
                }
                (None, None) => bail!("pass either --hours or --expiry"),
            };

            let vp = compute_voting_power(locked, time_to_expiry);
            println!("Locked:       {} {}", locked.format_display(4), rbn.symbol);
            println!("Hours left:   {}", time_to_expiry.num_hours());
            println!("Voting power: {} veRBN", format_or_placeholder(Some(&vp), 4));
        }
        Commands::Lock { amount, days } => {
            let rbn = Token::rbn();
            let now = Utc::now();
            let amount = rbn.parse_amount(amount)?;
            let lock = LockPosition::new_lock(amount, days_delta(*days)?, now)?;

            println!("✅ Lock is valid");
            println!("Amount:       {} {}", lock.amount.format_display(4), rbn.symbol);
            println!("Expires:      {}", lock.lock_expiry.format("%Y-%m-%d %H:%M UTC"));
            println!(
                "Voting power: {} veRBN",
                lock.voting_power_at(now).format_display(4)
            );
        }
        Commands::Boost {
            deposit,
            total_liquidity,
            voting_power,
            voting_power_supply,
        } => {
            let result = compute_boost(&BoostInputs {
                deposit: *deposit,
                total_liquidity: *total_liquidity,
                voting_power: *voting_power,
                voting_power_supply: *voting_power_supply,
            });
            let needed =
                required_voting_power_for_max_boost(*deposit, *total_liquidity, *voting_power_supply);

            println!("Working balance: {:.4}", result.working_balance);
            println!("Boost:           {:.2}x", result.boost);
            println!("veRBN for max:   {:.4}", needed);
        }
        Commands::Payoff {
            product,
            base_yield,
            max_yield,
            lower_barrier,
            upper_barrier,
            participation_rate,
            points,
            padding,
        } => {
            let product: ProductId = product.parse()?;
            let terms = PayoffTerms {
                base_yield: *base_yield,
                max_yield: *max_yield,
                lower_barrier: *lower_barrier,
                upper_barrier: *upper_barrier,
                participation_rate: *participation_rate,
            };
            print_curve(product, &terms, *points, *padding)?;
        }
        Commands::Schedule { product } => {
            let provider = AirtableProvider::from_config(&config, fetcher.clone())?;
            let filter = product.as_deref().map(str::parse::<ProductId>).transpose()?;

            println!("📡 Fetching earn schedule...");
            let entries = provider.schedule().await?;

            let mut table = Table::new();
            table.add_row(row![
                "Product", "Expiry", "Base %", "Max %", "Lower", "Upper", "Participation"
            ]);
            for entry in entries
                .iter()
                .filter(|e| filter.is_none_or(|p| e.product == p))
            {
                table.add_row(row![
                    entry.product,
                    entry.expiry,
                    entry.terms.base_yield,
                    entry.terms.max_yield,
                    entry.terms.lower_barrier,
                    entry.terms.upper_barrier,
                    entry.terms.participation_rate
                ]);
            }
            table.printstd();
        }
        Commands::Instruments { currency } => {
            let provider = DeribitProvider::from_config(&config, fetcher.clone());
            let instruments = provider.instruments(currency).await?;

            println!("✅ {} active instruments", instruments.len());
            let mut table = Table::new();
            table.add_row(row!["Instrument", "Strike", "Kind", "Expiry"]);
            for i in instruments {
                table.add_row(row![
                    i.name,
                    i.strike,
                    format!("{:?}", i.kind),
                    i.expiry.format("%Y-%m-%d")
                ]);
            }
            table.printstd();
        }
        Commands::OptionPrices { instruments } => {
            let provider = DeribitProvider::from_config(&config, fetcher.clone());

            println!(
                "🔍 Fetching {} quotes (rate limited)...",
                instruments.len()
            );
            let quotes = provider.tickers(instruments.clone()).await;

            let mut table = Table::new();
            table.add_row(row!["Instrument", "Mark", "Mark USD", "IV %"]);
            for (name, quote) in quotes {
                match quote {
                    Ok(q) => table.add_row(row![
                        name,
                        q.mark_price.round_dp(6),
                        q.mark_price_usd().round_dp(2),
                        q.mark_iv.map_or_else(|| PLACEHOLDER.to_string(), |iv| iv.to_string())
                    ]),
                    Err(e) => {
                        tracing::warn!(instrument = %name, error = %e, "Quote unavailable");
                        table.add_row(row![name, PLACEHOLDER, PLACEHOLDER, PLACEHOLDER])
                    }
                };
            }
            table.printstd();
            print_bucket_stats(&fetcher, rbn_lens_data::providers::deribit::BUCKET);
        }
        Commands::StethApr => {
            let provider = LidoProvider::from_config(&config, fetcher.clone());
            let apr = provider.steth_apr().await?;
            println!("stETH APR (7d SMA): {apr}%");
        }
        Commands::Gas => {
            let provider = EtherscanProvider::from_config(&config, fetcher.clone())?;
            print_gas(&provider.gas_oracle().await?);
        }
        Commands::WatchGas { interval, count } => {
            let oracle: Arc<dyn GasOracle> =
                Arc::new(EtherscanProvider::from_config(&config, fetcher.clone())?);
            let mut poller = Poller::every_secs("gas", *interval);
            if let Some(count) = count {
                poller = poller.with_max_polls(*count);
            }
            let handle = poller.handle();
            let latest = Arc::new(LatestValue::new());
            let (tx, mut rx) = mpsc::channel::<PollEvent<GasPrices>>(16);

            let printer = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    match event.outcome {
                        PollOutcome::Updated(gas) => {
                            println!("#{} ", event.sequence);
                            print_gas(&gas);
                        }
                        PollOutcome::Failed(reason) => {
                            println!("#{} {PLACEHOLDER} ({reason})", event.sequence);
                        }
                    }
                }
            });

            tokio::select! {
                _ = poller.run(latest.clone(), Some(tx), || {
                    let oracle = oracle.clone();
                    async move { oracle.gas_prices().await }
                }) => {}
                _ = tokio::signal::ctrl_c() => {
                    handle.stop();
                }
            }
            printer.await?;

            let last = latest.get().await;
            println!(
                "Last fast gas: {}",
                last.map_or_else(|| PLACEHOLDER.to_string(), |g| format!("{} gwei", g.fast_gwei))
            );
        }
        Commands::Risk { entities } => {
            let provider = CredoraProvider::from_config(&config, fetcher.clone())?;
            let assessments = provider.risk(entities).await?;

            let mut table = Table::new();
            table.add_row(row!["Borrower", "Rating", "PD %"]);
            for a in &assessments {
                table.add_row(row![
                    a.entity,
                    a.rating,
                    a.probability_of_default_pct().round_dp(4)
                ]);
            }
            table.printstd();
        }
    }

    Ok(())
}

fn hours_delta(hours: i64) -> Result<TimeDelta> {
    match TimeDelta::try_hours(hours) {
        Some(delta) => Ok(delta),
        None => bail!("--hours {hours} is out of range"),
    }
}

fn days_delta(days: i64) -> Result<TimeDelta> {
    match TimeDelta::try_days(days) {
        Some(delta) => Ok(delta),
        None => bail!("--days {days} is out of range"),
    }
}

fn print_curve(
    product: ProductId,
    terms: &PayoffTerms,
    points: usize,
    padding: Decimal,
) -> Result<()> {
    let registry = PayoffRegistry::default();
    let profile = registry.get(product)?;
    let resolution = CurveResolution {
        points_per_segment: points,
        padding,
    };
    let curve = registry.curve(product, terms, &resolution)?;

    println!("\n📊 {} payoff ({})", product, profile.name());
    println!("Peak yield: {}%", profile.peak_yield(terms).round_dp(4));
    let mut table = Table::new();
    table.add_row(row!["Performance %", "Yield %"]);
    for point in curve {
        table.add_row(row![
            point.performance_percent.round_dp(2),
            point.yield_percent.round_dp(4)
        ]);
    }
    table.printstd();
    Ok(())
}

fn print_gas(gas: &GasPrices) {
    println!("Block {}", gas.last_block);
    println!("  Safe:    {} gwei", gas.safe_gwei);
    println!("  Propose: {} gwei", gas.propose_gwei);
    println!("  Fast:    {} gwei", gas.fast_gwei);
    if let Some(base) = gas.base_fee_gwei {
        println!("  Base:    {} gwei", base.round_dp(3));
    }
}

fn print_bucket_stats(fetcher: &BatchFetcher, bucket: &str) {
    match fetcher.stats(bucket) {
        Some(s) => println!(
            "Requests: {} dispatched, {} retried, {} failed",
            s.dispatched, s.retried, s.exhausted
        ),
        None => println!("Requests: {PLACEHOLDER}"),
    }
}
