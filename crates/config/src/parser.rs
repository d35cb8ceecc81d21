use crate::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());

    let config: EngineConfig = serde_yaml::from_str(&content)
        .with_context(|| "Failed to parse YAML configuration")?;

    info!("Configuration loaded successfully");
    Ok(config)
}

#[instrument]
pub fn generate_default_config() -> EngineConfig {
    use defaults::*;

    EngineConfig {
        base_donut_price: default_base_donut_price(),
        initial_outlet_balance: default_initial_outlet_balance(),
        supplier_outlet_id: default_supplier_outlet_id(),
        supplier_tick_ms: default_supplier_tick_ms(),
        purchaser_tick_ms: default_purchaser_tick_ms(),
        customer_tick_ms: default_customer_tick_ms(),
        default_margin_percent: default_margin_percent(),
        supplier_order_quantity: default_supplier_order_quantity(),
        supplier_price_variance_percent: default_supplier_price_variance_percent(),
        purchaser_order_quantity: default_purchaser_order_quantity(),
        customer_purchase_quantity: default_customer_purchase_quantity(),
        customer_shopping_list_size: default_customer_shopping_list_size(),
        metrics_port: default_metrics_port(),
    }
}

#[instrument]
pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(config: &EngineConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    let yaml = serde_yaml::to_string(config)
        .with_context(|| "Failed to serialize configuration to YAML")?;

    fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    info!("Configuration saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_yaml() {
        let config = generate_default_config();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.base_donut_price, config.base_donut_price);
        assert_eq!(parsed.supplier_outlet_id, config.supplier_outlet_id);
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let partial: EngineConfig = serde_yaml::from_str("base_donut_price: 3.5\n").unwrap();
        assert_eq!(partial.base_donut_price, 3.5);
        assert_eq!(partial.supplier_tick_ms, defaults::default_supplier_tick_ms());
    }
}
