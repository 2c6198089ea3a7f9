//! Core of yagostatus: aggregates widget output into an i3bar stream and
//! routes click events back to the widgets (and their event commands).

pub mod block;
pub mod config;
pub mod error;
pub mod event;
pub mod namespace;
pub mod registry;
pub mod status;
pub mod widget;
pub mod widgets;
