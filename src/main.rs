use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{error, info};

use zset_bench::bench::{Bench, Keys};
use zset_bench::config::Config;
use zset_bench::mem::CountingAlloc;
use zset_bench::store::{MemoryStore, RedisStore, Store};

#[global_allocator]
static GLOBAL_TRACKER: CountingAlloc = CountingAlloc::new();

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// A redis server at the configured host
    Redis,
    /// In-process hashes and sorted sets, for dry runs
    Memory,
}

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    rename_all = "kebab-case",
)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
    /// Override redis.host (host:port)
    #[arg(long)]
    host: Option<String>,
    /// Override redis.key
    #[arg(long)]
    key: Option<String>,
    /// Override files.csv
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Send each record's hset and zadd as one MULTI/EXEC transaction
    #[arg(long)]
    atomic_insert: bool,
    #[arg(long, value_enum, default_value_t = Backend::Redis)]
    store: Backend,
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::from_path(&cli.config)
        .with_context(|| format!("failed load config {}", cli.config.display()))?;
    if let Some(host) = &cli.host {
        config.redis.host = host.clone();
    }
    if let Some(key) = &cli.key {
        config.redis.key = key.clone();
    }
    if let Some(csv) = &cli.csv {
        config.files.csv = csv.clone();
    }
    config.redis.atomic_insert |= cli.atomic_insert;
    config.validate().context("invalid config")?;
    Ok(config)
}

fn connect(backend: Backend, config: &Config) -> anyhow::Result<Box<dyn Store>> {
    Ok(match backend {
        Backend::Redis => Box::new(
            RedisStore::connect(&config.redis.host)
                .with_context(|| format!("failed to init redis at {}", config.redis.host))?,
        ),
        Backend::Memory => Box::new(MemoryStore::new()),
    })
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    info!(
        "store {:?} at {}, buffer {} (records are sent one at a time)",
        cli.store, config.redis.host, config.redis.buffer
    );
    let store = connect(cli.store, &config)?;
    let mut bench =
        Bench::new(store, Keys::new(&config.redis.key)).atomic_insert(config.redis.atomic_insert);

    let start = Instant::now();
    bench.load_csv(&config.files.csv);
    info!("load csv finished in {:?}", start.elapsed());

    let start = Instant::now();
    let inserted = bench.insert();
    info!(
        "insert into redis finished in {:?} ({})",
        start.elapsed(),
        inserted
    );

    let start = Instant::now();
    let updated = bench.update();
    info!("redis update finished in {:?} ({})", start.elapsed(), updated);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = run(cli);
    info!("{}", GLOBAL_TRACKER.usage());
    if let Err(err) = result {
        error!("{:#}", err);
        std::process::exit(1);
    }
}
