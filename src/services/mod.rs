//! services/mod.rs
//! Módulo que agrupa los servicios: persistencia, simulación y despacho.

pub mod campaign_dispatcher;
pub mod campaign_store;
pub mod clock;
pub mod direct_send;
pub mod random_source;
pub mod shutdown;
pub mod status_simulator;
