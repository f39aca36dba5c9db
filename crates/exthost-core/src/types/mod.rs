//! Core type definitions used across the Exthost workspace.

pub mod kind;

pub use kind::PluginKind;
