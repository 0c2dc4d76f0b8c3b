use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::auth::ServiceAccount;
use crate::cli::SyncDataArgs;
use crate::firestore::FirestoreClient;
use crate::model::{CollectionSummary, SyncRunManifest};
use crate::store::{DocumentStore, DryRunStore};
use crate::util::{now_utc_string, read_json_file, utc_compact_string, write_json_pretty};
use crate::walk::{DATA_FOLDERS, is_manifest_file, json_stem, list_json_files};
use crate::writer::write_collection;

pub fn run(args: SyncDataArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("sync-{}", utc_compact_string(started_ts));

    let account = ServiceAccount::from_env()?;
    let project_id = args
        .project_id
        .clone()
        .unwrap_or_else(|| account.project_id.clone());

    info!(
        root = %args.root.display(),
        project_id = %project_id,
        dry_run = args.dry_run,
        run_id = %run_id,
        "starting firestore sync"
    );

    let collections = if args.dry_run {
        let mut store = DryRunStore::default();
        let collections = sync_directory(&mut store, &args.root)?;
        info!(commits = store.commits, "dry run skipped remote commits");
        collections
    } else {
        let mut store = FirestoreClient::new(account, project_id.clone())?;
        sync_directory(&mut store, &args.root)?
    };

    let written: usize = collections.iter().map(|summary| summary.written).sum();
    info!(
        collections = collections.len(),
        documents = written,
        "firestore sync completed successfully"
    );

    if let Some(report_path) = &args.report_path {
        let manifest = SyncRunManifest {
            manifest_version: 1,
            run_id,
            started_at,
            completed_at: now_utc_string(),
            project_id,
            dry_run: args.dry_run,
            collections,
        };
        write_json_pretty(report_path, &manifest)?;
        info!(path = %report_path.display(), "wrote sync report");
    }

    Ok(())
}

/// Root-level JSON files first, then the fixed data folders.
pub fn sync_directory(store: &mut dyn DocumentStore, root: &Path) -> Result<Vec<CollectionSummary>> {
    let mut summaries = sync_root_files(store, root)?;

    for folder in DATA_FOLDERS {
        summaries.extend(sync_folder(store, root, folder)?);
    }

    Ok(summaries)
}

/// Each root JSON file is one collection named after its stem.
pub fn sync_root_files(
    store: &mut dyn DocumentStore,
    root: &Path,
) -> Result<Vec<CollectionSummary>> {
    let mut summaries = Vec::new();

    for path in list_json_files(root)? {
        if is_manifest_file(&path) {
            continue;
        }

        let collection = json_stem(&path)?;
        let content = read_json_file(&path)?;

        let summary = write_collection(store, &collection, &path.display().to_string(), &content)?;
        log_uploaded(&summary);
        summaries.push(summary);
    }

    Ok(summaries)
}

/// Each file in `root/folder` becomes one document of the `folder` collection.
pub fn sync_folder(
    store: &mut dyn DocumentStore,
    root: &Path,
    folder: &str,
) -> Result<Vec<CollectionSummary>> {
    let folder_path = root.join(folder);
    if !folder_path.is_dir() {
        warn!(folder = %folder, "folder not found");
        return Ok(Vec::new());
    }

    let mut summaries = Vec::new();

    for path in list_json_files(&folder_path)? {
        let document_id = json_stem(&path)?;
        let content = read_json_file(&path)?;

        let mut wrapped = Map::new();
        wrapped.insert(document_id, content);

        let summary = write_collection(
            store,
            folder,
            &path.display().to_string(),
            &Value::Object(wrapped),
        )?;
        log_uploaded(&summary);
        summaries.push(summary);
    }

    Ok(summaries)
}

fn log_uploaded(summary: &CollectionSummary) {
    info!(
        collection = %summary.name,
        source = %summary.source,
        written = summary.written,
        skipped = summary.skipped,
        batches = summary.batches,
        "uploaded collection"
    );
}
