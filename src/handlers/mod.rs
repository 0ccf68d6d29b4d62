//! handlers/mod.rs
//! Módulo que agrupa los handlers HTTP (campañas y mensajes).
pub mod campaign_handler;
pub mod message_handler;
