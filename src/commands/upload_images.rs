use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::info;
use walkdir::WalkDir;

use crate::auth::ServiceAccount;
use crate::cli::UploadImagesArgs;
use crate::model::{UploadRunManifest, UploadedAsset};
use crate::storage::StorageClient;
use crate::store::{DryRunStore, ObjectStore, UploadRequest};
use crate::util::{now_utc_string, sha256_hex, utc_compact_string, write_json_pretty};
use crate::walk::{ImageFilter, content_type_for, remote_key};

pub const IMAGES_DIR: &str = "images";
pub const CACHE_CONTROL: &str = "public, max-age=31536000";

#[derive(Debug, Default)]
pub struct UploadOutcome {
    pub assets: Vec<UploadedAsset>,
    pub skipped_files: usize,
}

pub fn run(args: UploadImagesArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("upload-{}", utc_compact_string(started_ts));

    let account = ServiceAccount::from_env()?;

    let images_root = resolve_images_root(&args.root)?;

    info!(
        root = %images_root.display(),
        bucket = %args.bucket,
        dry_run = args.dry_run,
        run_id = %run_id,
        "starting image upload"
    );

    let outcome = if args.dry_run {
        let mut store = DryRunStore::default();
        let outcome = upload_directory(&mut store, &images_root, IMAGES_DIR)?;
        info!(uploads = store.uploads, "dry run skipped remote uploads");
        outcome
    } else {
        let mut store = StorageClient::new(account, args.bucket.clone())?;
        upload_directory(&mut store, &images_root, IMAGES_DIR)?
    };

    info!(
        uploaded = outcome.assets.len(),
        skipped = outcome.skipped_files,
        "all images uploaded to firebase storage"
    );

    if let Some(report_path) = &args.report_path {
        let manifest = UploadRunManifest {
            manifest_version: 1,
            run_id,
            started_at,
            completed_at: now_utc_string(),
            bucket: args.bucket.clone(),
            dry_run: args.dry_run,
            assets: outcome.assets,
            skipped_files: outcome.skipped_files,
        };
        write_json_pretty(report_path, &manifest)?;
        info!(path = %report_path.display(), "wrote upload report");
    }

    Ok(())
}

/// `root/images`, which must exist before anything is uploaded.
pub fn resolve_images_root(root: &Path) -> Result<PathBuf> {
    let images_root = root.join(IMAGES_DIR);
    if !images_root.is_dir() {
        bail!("images folder not found in {}", root.display());
    }
    Ok(images_root)
}

/// Uploads every image under `local_root` to `remote_prefix/<relative path>`, one at a time.
pub fn upload_directory(
    store: &mut dyn ObjectStore,
    local_root: &Path,
    remote_prefix: &str,
) -> Result<UploadOutcome> {
    let filter = ImageFilter::new()?;
    let mut outcome = UploadOutcome::default();

    for entry in WalkDir::new(local_root).min_depth(1).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("failed to walk {}", local_root.display()))?;

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str().filter(|name| filter.matches(name))
        else {
            outcome.skipped_files += 1;
            continue;
        };

        let relative = entry
            .path()
            .strip_prefix(local_root)
            .with_context(|| format!("{} is outside {}", entry.path().display(), local_root.display()))?;
        let remote_path = remote_key(remote_prefix, relative)?;
        let content_type = content_type_for(file_name);

        let body = fs::read(entry.path())
            .with_context(|| format!("failed to read {}", entry.path().display()))?;

        store
            .upload(&UploadRequest {
                remote_path: &remote_path,
                content_type,
                cache_control: CACHE_CONTROL,
                public: true,
                body: &body,
            })
            .with_context(|| format!("failed to upload {remote_path}"))?;

        info!(remote_path = %remote_path, bytes = body.len(), "uploaded asset");

        outcome.assets.push(UploadedAsset {
            remote_path,
            bytes: body.len() as u64,
            sha256: sha256_hex(&body),
            content_type: content_type.to_string(),
        });
    }

    Ok(outcome)
}
