//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod campaign_model;
pub mod message_model;
