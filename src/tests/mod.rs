//! tests/mod.rs
//! Pruebas unitarias y de integración del despachador.

mod support;

mod direct_send_tests;
