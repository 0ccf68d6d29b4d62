//! config/dispatcher_config.rs
//! Tiempos y probabilidades de la simulación de estados.

use serde::{Deserialize, Serialize};

/// Rango de espera en milisegundos, ambos extremos incluidos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }
}

/// Configuración del despachador, con valores por defecto
/// (podría venir de un .toml, .env, etc.)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Mensajes por minuto cuando la campaña no define uno válido
    pub default_rate_limit: u32,
    pub delivered_delay: DelayRange,
    pub read_probability: f64,
    pub read_delay: DelayRange,
    /// Se evalúa aparte de `read_probability`
    pub reply_probability: f64,
    pub reply_delay: DelayRange,

    // Envío individual (fuera de campaña)
    pub ad_hoc_delivered_delay: DelayRange,
    pub ad_hoc_read_delay: DelayRange,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            default_rate_limit: 30,
            delivered_delay: DelayRange::new(1000, 3000),
            read_probability: 0.5,
            read_delay: DelayRange::new(3000, 8000),
            reply_probability: 0.2,
            reply_delay: DelayRange::new(8000, 15000),
            ad_hoc_delivered_delay: DelayRange::fixed(1000),
            ad_hoc_read_delay: DelayRange::fixed(2000),
        }
    }
}
