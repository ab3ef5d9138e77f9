//! Core engine-facing contracts.
//!
//! This module defines the interface between the window runtime and the
//! application: lifecycle callbacks plus a per-frame context.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
