//! Sugar Nail Art CLI - drives the offline cache worker and the booking cart.
//!
//! The worker runs against the configured origin with a disk-backed cache, so
//! installed assets stay available to later runs.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sugarnail_core::booking::{
    format_date, format_rupiah, whatsapp_link, Cart, LocalStorage, OrderHistory,
};
use sugarnail_core::store::{CacheStore, DiskCacheStore};
use sugarnail_core::worker::{ServiceWorker, WorkerEvent, WorkerState};
use sugarnail_core::{AssetManifest, Config, HttpFetcher, Request};

// ============================================================================
// Constants
// ============================================================================

/// Worker script path, relative to the origin
const WORKER_SCRIPT: &str = "./service-worker.js";

/// Subdirectory of the cache dir holding response generations
const RESPONSES_DIR: &str = "responses";

/// Subdirectory of the cache dir holding log files
const LOGS_DIR: &str = "logs";

const LOG_FILE_PREFIX: &str = "sugarnail.log";

const USAGE: &str = "\
Usage: sugarnail <command>

Commands:
  install                    Install and activate the offline cache
  fetch <path>               Fetch a path through the worker (body to stdout)
  status                     Show cache generations
  cart package <name> <price>
  cart addon <name> <price>
  cart notes <text>
  cart show
  checkout                   Save the order and print the WhatsApp link
  orders                     List past orders";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr and, when the log directory is usable, to a daily file.
/// The returned guard flushes the file writer on drop.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = log_dir.filter(|dir| std::fs::create_dir_all(dir).is_ok());
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?.with_env_overrides();
    let _guard = init_tracing(config.cache_dir().ok().map(|dir| dir.join(LOGS_DIR)));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(|s| s.as_str()).collect();

    match args.as_slice() {
        ["install"] => install(&config).await,
        ["fetch", path] => fetch(&config, path).await,
        ["status"] => status(&config).await,
        ["cart", "package", name, price] => {
            cart(&config)?.add_package(name, parse_price(price)?);
            show_cart(&config)
        }
        ["cart", "addon", name, price] => {
            cart(&config)?.add_addon(name, parse_price(price)?);
            show_cart(&config)
        }
        ["cart", "notes", notes @ ..] if !notes.is_empty() => {
            cart(&config)?.set_notes(&notes.join(" "));
            show_cart(&config)
        }
        ["cart", "show"] => show_cart(&config),
        ["checkout"] => checkout(&config),
        ["orders"] => orders(&config),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

// ============================================================================
// Worker commands
// ============================================================================

fn build_worker(config: &Config) -> Result<(ServiceWorker, UnboundedReceiver<WorkerEvent>)> {
    let worker_config = config.worker_config()?;
    let cache_dir = config.cache_dir()?.join(RESPONSES_DIR);
    let store = DiskCacheStore::new(cache_dir.clone())
        .with_context(|| format!("Failed to open cache at {}", cache_dir.display()))?;
    let fetcher = HttpFetcher::new(worker_config.origin.clone(), worker_config.request_timeout)?;

    Ok(ServiceWorker::new(
        worker_config,
        AssetManifest::default(),
        Arc::new(store),
        Arc::new(fetcher),
    ))
}

fn report_events(events: &mut UnboundedReceiver<WorkerEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            WorkerEvent::StateChanged { version, state } => {
                eprintln!("{}: {}", version, state);
            }
            WorkerEvent::GenerationDeleted { generation } => {
                eprintln!("Deleted old cache {}", generation);
            }
            WorkerEvent::ClientsClaimed { version, count } => {
                eprintln!("{} now controls {} page(s)", version, count);
            }
        }
    }
}

async fn install(config: &Config) -> Result<()> {
    let (worker, mut events) = build_worker(config)?;
    let registration = worker.register(WORKER_SCRIPT)?;
    info!(scope = %registration.scope, "Worker registered");

    worker.install().await?;
    if worker.state().await == WorkerState::Waiting {
        worker.activate().await?;
    }
    report_events(&mut events);

    println!(
        "Installed {} ({} assets) for {}",
        worker.config().version,
        worker.manifest().len(),
        registration.scope
    );
    Ok(())
}

async fn fetch(config: &Config, path: &str) -> Result<()> {
    let (worker, mut events) = build_worker(config)?;
    if !worker.resume().await? {
        eprintln!("Cache not installed, fetching from network");
    }

    let url = worker.config().origin.join(path)?;
    let outcome = worker.fetch(&Request::get(url)).await?;
    worker.settle().await;
    report_events(&mut events);

    eprintln!(
        "{} {} ({:?})",
        outcome.response.status, outcome.response.status_text, outcome.source
    );
    let mut stdout = io::stdout().lock();
    stdout.write_all(&outcome.response.body)?;
    stdout.flush()?;
    Ok(())
}

async fn status(config: &Config) -> Result<()> {
    let worker_config = config.worker_config()?;
    let store = DiskCacheStore::new(config.cache_dir()?.join(RESPONSES_DIR))?;
    let generations = store.generations().await?;

    println!("Origin:  {}", worker_config.origin);
    println!("Version: {}", worker_config.version);
    if generations.is_empty() {
        println!("No cache installed");
        return Ok(());
    }

    for generation in generations {
        let keys = store.keys(&generation).await?;
        let mut entries = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Some(entry) = store.load_entry(&generation, key).await? {
                entries.push(entry);
            }
        }
        let newest = entries.into_iter().max_by_key(|e| e.cached_at);

        let marker = if generation == worker_config.version.as_str() { "*" } else { " " };
        let updated = newest.map(|n| n.age_display()).unwrap_or_else(|| "-".to_string());
        println!("{} {:<24} {:>4} entries  updated {}", marker, generation, keys.len(), updated);
    }
    Ok(())
}

// ============================================================================
// Booking commands
// ============================================================================

fn storage(config: &Config) -> Result<LocalStorage> {
    LocalStorage::new(config.storage_dir()?)
}

fn cart(config: &Config) -> Result<Cart> {
    Ok(Cart::new(storage(config)?))
}

fn parse_price(price: &str) -> Result<u64> {
    price
        .replace('.', "")
        .parse()
        .with_context(|| format!("Invalid price: {}", price))
}

fn show_cart(config: &Config) -> Result<()> {
    let cart = cart(config)?;
    let Some(package) = cart.package() else {
        println!("Cart is empty");
        return Ok(());
    };

    println!("Paket: {} ({})", package.name, format_rupiah(package.price));
    let addons = cart.addons();
    for addon in &addons {
        println!("  + {} ({})", addon.name, format_rupiah(addon.price));
    }
    if let Some(notes) = cart.notes() {
        println!("Catatan: {}", notes);
    }
    let total = package.price + addons.iter().map(|a| a.price).sum::<u64>();
    println!("Total: {}", format_rupiah(total));
    Ok(())
}

fn checkout(config: &Config) -> Result<()> {
    let storage = storage(config)?;
    let cart = Cart::new(storage.clone());
    let order = cart.checkout()?;

    let link = whatsapp_link(&order, &config.admin_number);
    println!("Order {} - {}", order.id, format_rupiah(order.total));
    println!("{}", link);

    OrderHistory::new(storage).save(order);
    cart.clear();
    Ok(())
}

fn orders(config: &Config) -> Result<()> {
    let orders = OrderHistory::new(storage(config)?).all();
    if orders.is_empty() {
        println!("No orders yet");
        return Ok(());
    }
    for order in orders {
        println!(
            "{:<9} {:<18} {:<20} {}",
            order.id,
            format_date(&order.created_at),
            order.package_name,
            format_rupiah(order.total)
        );
    }
    Ok(())
}
