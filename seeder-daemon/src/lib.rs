//! Timer-driven watch loop and one-shot check run over configured seeds.

mod error;
mod runtime;

pub use error::DaemonError;
pub use runtime::{
    check, check_blocking, init_tracing, run, run_check, start_blocking, watch, watch_loop,
    CheckReport, WatchReport,
};
