//! Satoyama DB - Datamodels and persistence for sensor network inventories
//!
//! Nodes host sensors of a given sensor type; sensors accumulate timestamped
//! readings. Records are built from validated drafts and persisted through
//! [`services::Gateway`], one transaction per creation.

pub mod config;
pub mod drafts;
pub mod entity;
pub mod error;
pub mod services;
pub mod views;
