use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub name: String,
    pub source: String,
    pub written: usize,
    pub skipped: usize,
    pub batches: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub completed_at: String,
    pub project_id: String,
    pub dry_run: bool,
    pub collections: Vec<CollectionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub remote_path: String,
    pub bytes: u64,
    pub sha256: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub completed_at: String,
    pub bucket: String,
    pub dry_run: bool,
    pub assets: Vec<UploadedAsset>,
    pub skipped_files: usize,
}
