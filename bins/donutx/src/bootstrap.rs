//! Static bootstrap data: the donut catalogue and the initial outlet
//! roster. Out of the engine's own concerns (§1) — the core crates only
//! ever see `ProductId`/`OutletId` strings and whatever the `Store` hands
//! back — but something has to seed a fresh store the first time the
//! binary runs against it.

use chrono::Utc;
use common::{DonutType, Outlet};
use config::EngineConfig;

pub fn product_catalogue() -> Vec<DonutType> {
    vec![
        DonutType {
            donut_type_id: "glazed".to_string(),
            name: "Glazed".to_string(),
            description: "Classic yeast donut with a sugar glaze".to_string(),
        },
        DonutType {
            donut_type_id: "sprinkled".to_string(),
            name: "Sprinkled".to_string(),
            description: "Glazed donut topped with rainbow sprinkles".to_string(),
        },
        DonutType {
            donut_type_id: "chocolate".to_string(),
            name: "Chocolate Frosted".to_string(),
            description: "Cake donut with chocolate frosting".to_string(),
        },
        DonutType {
            donut_type_id: "jelly".to_string(),
            name: "Jelly Filled".to_string(),
            description: "Raised donut filled with raspberry jelly".to_string(),
        },
    ]
}

/// The sentinel supplier factory plus a handful of retail donut huts.
pub fn initial_outlets(config: &EngineConfig) -> Vec<Outlet> {
    let now = Utc::now();
    let mut outlets = vec![Outlet {
        outlet_id: config.supplier_outlet_id.clone(),
        name: "Supplier Factory".to_string(),
        location: "central depot".to_string(),
        balance: 0.0,
        margin_percent: 0.0,
        is_open: true,
        created_at: now,
    }];

    for (id, name, location) in [
        ("donut-hut-1", "Donut Hut #1", "Main St"),
        ("donut-hut-2", "Donut Hut #2", "Market Square"),
        ("donut-hut-3", "Donut Hut #3", "Riverside"),
    ] {
        outlets.push(Outlet {
            outlet_id: id.to_string(),
            name: name.to_string(),
            location: location.to_string(),
            balance: config.initial_outlet_balance,
            margin_percent: config.default_margin_percent,
            is_open: true,
            created_at: now,
        });
    }

    outlets
}
