use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_BUCKET: &str = "arc-raiders-wiki.firebasestorage.app";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "sync-data",
    version,
    about = "Sync local JSON collections into Cloud Firestore"
)]
pub struct SyncDataArgs {
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Overrides the project named by the service account.
    #[arg(long)]
    pub project_id: Option<String>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "upload-images",
    version,
    about = "Upload the images/ tree to Firebase Storage"
)]
pub struct UploadImagesArgs {
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[arg(long, default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}
