//! A virtual record deck: one looped track, play/pause, pitch, scratching
//! by dragging the disc, and two synthesized sound effects.
//!
//! [`audio::transport::Transport`] owns the decoded track and the output
//! device; [`gesture::GestureMapper`] turns pointer motion into playback rate.

pub mod app;
pub mod audio;
pub mod config;
pub mod error;
pub mod gesture;
pub mod ui;
