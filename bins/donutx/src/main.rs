//! donutx CLI and process entry point.
//!
//! Wires the Store, Ledger, Exchange, Broadcaster and the three periodic
//! agents into one monolithic process (§5) and runs it until Ctrl+C.

mod bootstrap;

use agents::{CustomerConfig, CustomerSimulator, PurchasingAgent, PurchasingConfig, QuantityRange, Supplier, SupplierConfig};
use anyhow::{Context, Result};
use broadcaster::{Broadcaster, LoggingSink};
use cli::{Cli, Commands};
use common::ShutdownController;
use config::{generate_default_config, load_config, save_config, validate_config, EngineConfig};
use ledger::{Ledger, LedgerConfig};
use matching_engine::Exchange;
use observability::{init_logging, init_metrics, EngineMetrics, LogFormat};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use storage::{InMemoryStore, Store};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("donutx", LogFormat::Pretty)?;

    let cli = Cli::parse_args();
    match cli.command {
        Commands::Start { config } => start(config).await,
        Commands::Validate { config } => validate(config).await,
        Commands::Init { output } => init(output).await,
    }
}

async fn init(output: std::path::PathBuf) -> Result<()> {
    let config = generate_default_config();
    save_config(&config, &output)?;
    println!("Wrote default configuration to {:?}", output);
    Ok(())
}

async fn validate(config_path: std::path::PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    let report = validate_config(&config);
    if report.is_valid() {
        println!("Configuration is valid.");
        Ok(())
    } else {
        for err in &report.errors {
            eprintln!("error: {err}");
        }
        anyhow::bail!("configuration is invalid ({} error(s))", report.errors.len());
    }
}

async fn start<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = load_config(&config_path).with_context(|| "failed to load configuration")?;
    let report = validate_config(&config);
    if !report.is_valid() {
        for err in &report.errors {
            tracing::error!("{err}");
        }
        anyhow::bail!("cannot start with invalid configuration");
    }

    init_metrics(config.metrics_port).context("failed to install metrics exporter")?;

    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    seed_if_empty(&store, &config).await?;

    let metrics = Arc::new(EngineMetrics::new());

    let broadcaster = Arc::new(Broadcaster::new().with_metrics(metrics.clone()));
    broadcaster.register(Arc::new(LoggingSink::new("log"))).await;

    let ledger = Arc::new(Ledger::new(
        store.clone(),
        broadcaster.clone(),
        LedgerConfig {
            base_donut_price: config.base_donut_price,
            initial_outlet_balance: config.initial_outlet_balance,
            supplier_outlet_id: config.supplier_outlet_id.clone(),
        },
    ));
    ledger.rehydrate().await.context("ledger rehydration failed")?;

    let products: HashSet<String> = bootstrap::product_catalogue()
        .into_iter()
        .map(|p| p.donut_type_id)
        .collect();

    let exchange = Arc::new(
        Exchange::new(products.clone(), ledger.clone(), ledger.clone(), store.clone(), broadcaster.clone())
            .with_metrics(metrics.clone()),
    );

    let product_list: Vec<String> = products.into_iter().collect();

    let shutdown = ShutdownController::with_ctrl_c();

    let supplier = Arc::new(Supplier::new(
        exchange.clone(),
        ledger.clone(),
        product_list.clone(),
        SupplierConfig {
            supplier_outlet_id: config.supplier_outlet_id.clone(),
            base_donut_price: config.base_donut_price,
            price_variance_percent: config.supplier_price_variance_percent,
            order_quantity: QuantityRange::new(config.supplier_order_quantity.min, config.supplier_order_quantity.max),
            tick_interval: Duration::from_millis(config.supplier_tick_ms),
        },
    ));
    let purchaser = Arc::new(PurchasingAgent::new(
        exchange.clone(),
        ledger.clone(),
        product_list.clone(),
        PurchasingConfig {
            supplier_outlet_id: config.supplier_outlet_id.clone(),
            order_quantity: QuantityRange::new(config.purchaser_order_quantity.min, config.purchaser_order_quantity.max),
            tick_interval: Duration::from_millis(config.purchaser_tick_ms),
        },
    ));
    let customers = Arc::new(CustomerSimulator::new(
        ledger.clone(),
        product_list,
        CustomerConfig {
            supplier_outlet_id: config.supplier_outlet_id.clone(),
            base_donut_price: config.base_donut_price,
            purchase_quantity: QuantityRange::new(config.customer_purchase_quantity.min, config.customer_purchase_quantity.max),
            shopping_list_size: QuantityRange::new(config.customer_shopping_list_size.min, config.customer_shopping_list_size.max),
            tick_interval: Duration::from_millis(config.customer_tick_ms),
        },
    ));

    let supplier_handle = tokio::spawn({
        let supplier = supplier.clone();
        let token = shutdown.child_token();
        async move { supplier.run(token).await }
    });
    let purchaser_handle = tokio::spawn({
        let purchaser = purchaser.clone();
        let token = shutdown.child_token();
        async move { purchaser.run(token).await }
    });
    let customer_handle = tokio::spawn({
        let customers = customers.clone();
        let token = shutdown.child_token();
        async move { customers.run(token).await }
    });

    info!("donutx engine running, press Ctrl+C to stop");
    shutdown.wait_for_shutdown().await;

    let _ = tokio::join!(supplier_handle, purchaser_handle, customer_handle);
    broadcaster.shutdown().await;

    info!("donutx engine stopped");
    Ok(())
}

async fn seed_if_empty(store: &Arc<dyn Store>, config: &EngineConfig) -> Result<()> {
    if !store.find_all_outlets().await?.is_empty() {
        return Ok(());
    }
    info!("seeding store with initial outlet roster");
    for outlet in bootstrap::initial_outlets(config) {
        store.insert_outlet(outlet).await?;
    }
    Ok(())
}
