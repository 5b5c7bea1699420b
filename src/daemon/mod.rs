//! # Daemon Module
//!
//! The daemon module runs and manages the background tasks of the teleinfo
//! daemon: frame processing, periodic aggregation and a heartbeat.
//!
//! ## Components
//!
//! * **Launch Daemon**: starting, monitoring, and gracefully shutting down
//!   background tasks
//!
//! ## Usage
//!
//! ```no_run
//! use rust_teleinfo::{config::Config, daemon::Daemon};
//!
//! async fn run() -> anyhow::Result<()> {
//!     let config = Config::from_file("config.yaml")?;
//!
//!     let mut daemon = Daemon::new();
//!     daemon.launch(&config)?;
//!
//!     tokio::signal::ctrl_c().await?;
//!
//!     daemon.shutdown();
//!     daemon.join().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod launch_daemon;

pub use launch_daemon::{build_sink, Daemon};
pub use crate::utility::ShutdownSignal;
