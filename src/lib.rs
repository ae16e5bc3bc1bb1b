//! Chalkmark: a terminal study tutor with circle-to-ask annotation.

pub mod annotate;
pub mod api;
pub mod app;
pub mod attachments;
pub mod audio;
pub mod chat;
pub mod clipboard;
pub mod component_context;
pub mod components;
pub mod config;
pub mod constants;
pub mod drivers;
pub mod event_loop;
pub mod geometry;
pub mod keybindings;
pub mod notes;
pub mod runner;
pub mod state;
pub mod theme;
pub mod tracing_sub;
pub mod ui;
