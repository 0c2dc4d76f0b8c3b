use clap::Parser;

use firesync::cli::SyncDataArgs;
use firesync::commands::sync_data;
use firesync::telemetry::{init_tracing, report_failure};

fn main() {
    init_tracing();

    let args = SyncDataArgs::parse();
    if let Err(err) = sync_data::run(args) {
        report_failure("firestore sync failed", &err);
        std::process::exit(1);
    }
}
