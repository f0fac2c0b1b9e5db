use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, IntCounter, IntGauge, TextEncoder, opts, register_int_counter, register_int_gauge,
};

pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "godo_ws_connections_total",
        "Total number of chat connections that joined a conversation"
    ))
    .expect("metric can be registered")
});

pub static WS_CONNECTIONS_REJECTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "godo_ws_connections_rejected_total",
        "Total number of chat connections rejected before joining"
    ))
    .expect("metric can be registered")
});

pub static WS_ACTIVE_CONNECTIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(opts!(
        "godo_ws_active_connections",
        "Number of currently joined chat connections"
    ))
    .expect("metric can be registered")
});

pub static MESSAGES_SENT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "godo_messages_sent_total",
        "Total number of chat messages persisted"
    ))
    .expect("metric can be registered")
});

pub static MESSAGES_FILTERED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "godo_messages_filtered_total",
        "Total number of chat messages altered by the content filter"
    ))
    .expect("metric can be registered")
});

pub fn gather_metrics() -> Result<String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode(&metric_families, &mut buffer)?;

    Ok(String::from_utf8(buffer)?)
}
