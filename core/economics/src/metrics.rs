// o2ul/core/economics/src/metrics.rs

// Metrics for supply adjustments and update cycles
use once_cell::sync::Lazy;
use prometheus::{
    register_gauge, register_histogram, register_int_counter_vec, Gauge, Histogram, IntCounterVec,
};

pub static ADJUSTMENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "o2ul_adjustments_total",
        "Supply adjustment attempts by kind and outcome",
        &["kind", "outcome"]
    )
    .expect("register o2ul_adjustments_total")
});

pub static UPDATE_CYCLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "o2ul_update_cycles_total",
        "UltraStable update cycles by result",
        &["status"]
    )
    .expect("register o2ul_update_cycles_total")
});

pub static UPDATE_CYCLE_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "o2ul_update_cycle_seconds",
        "Wall time of an UltraStable update cycle"
    )
    .expect("register o2ul_update_cycle_seconds")
});

/// Stable supply in whole tokens, as last written by the engine
pub static STABLE_SUPPLY: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("o2ul_stable_supply", "Current UltraStable supply in whole tokens")
        .expect("register o2ul_stable_supply")
});
