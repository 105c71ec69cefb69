//! Credential and cursor storage ports

pub mod ports;
