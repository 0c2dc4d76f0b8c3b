use clap::Parser;

use firesync::cli::UploadImagesArgs;
use firesync::commands::upload_images;
use firesync::telemetry::{init_tracing, report_failure};

fn main() {
    init_tracing();

    let args = UploadImagesArgs::parse();
    if let Err(err) = upload_images::run(args) {
        report_failure("image upload failed", &err);
        std::process::exit(1);
    }
}
