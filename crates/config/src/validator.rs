use crate::*;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("{field} must be positive, got: {value}")]
    NotPositive { field: String, value: f64 },

    #[error("{field} range is empty: min {min} > max {max}")]
    InvalidRange { field: String, min: i64, max: i64 },

    #[error("supplier_outlet_id must not be empty")]
    MissingSupplierOutletId,

    #[error("default_margin_percent must be between 0 and 100, got: {0}")]
    InvalidMarginPercent(f64),

    #[error("metrics_port must not be 0")]
    InvalidMetricsPort,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigError>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn add(&mut self, error: ConfigError) {
        self.errors.push(error);
    }
}

fn validate_positive(field: &str, value: f64, report: &mut ValidationReport) {
    if value <= 0.0 {
        report.add(ConfigError::NotPositive {
            field: field.to_string(),
            value,
        });
    }
}

fn validate_range(field: &str, range: QuantityRange, report: &mut ValidationReport) {
    if range.min > range.max || range.min <= 0 {
        report.add(ConfigError::InvalidRange {
            field: field.to_string(),
            min: range.min,
            max: range.max,
        });
    }
}

pub fn validate_config(config: &EngineConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_positive("base_donut_price", config.base_donut_price, &mut report);
    validate_positive(
        "initial_outlet_balance",
        config.initial_outlet_balance,
        &mut report,
    );

    if config.supplier_outlet_id.trim().is_empty() {
        report.add(ConfigError::MissingSupplierOutletId);
    }

    if !(0.0..=100.0).contains(&config.default_margin_percent) {
        report.add(ConfigError::InvalidMarginPercent(config.default_margin_percent));
    }

    validate_range(
        "supplier_order_quantity",
        config.supplier_order_quantity,
        &mut report,
    );
    validate_range(
        "purchaser_order_quantity",
        config.purchaser_order_quantity,
        &mut report,
    );
    validate_range(
        "customer_purchase_quantity",
        config.customer_purchase_quantity,
        &mut report,
    );
    validate_range(
        "customer_shopping_list_size",
        config.customer_shopping_list_size,
        &mut report,
    );

    if config.metrics_port == 0 {
        report.add(ConfigError::InvalidMetricsPort);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::generate_default_config;

    #[test]
    fn default_config_is_valid() {
        let report = validate_config(&generate_default_config());
        assert!(report.is_valid());
    }

    #[test]
    fn negative_base_price_is_rejected() {
        let mut config = generate_default_config();
        config.base_donut_price = -1.0;
        let report = validate_config(&config);
        assert!(!report.is_valid());
    }

    #[test]
    fn inverted_quantity_range_is_rejected() {
        let mut config = generate_default_config();
        config.supplier_order_quantity = QuantityRange::new(10, 2);
        let report = validate_config(&config);
        assert!(!report.is_valid());
    }

    #[test]
    fn empty_supplier_outlet_id_is_rejected() {
        let mut config = generate_default_config();
        config.supplier_outlet_id = "  ".to_string();
        let report = validate_config(&config);
        assert!(!report.is_valid());
    }

    #[test]
    fn zero_metrics_port_is_rejected() {
        let mut config = generate_default_config();
        config.metrics_port = 0;
        let report = validate_config(&config);
        assert!(!report.is_valid());
    }
}
