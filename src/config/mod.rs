//! config/mod.rs
//! Configuración de la app (entorno) y del despachador de campañas.

pub mod app_config;
pub mod dispatcher_config;
