use anyhow::Result;
use serde_json::{Map, Value};
use tracing::debug;

/// One document write staged in a batch. The write replaces the whole document.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    pub document_id: String,
    pub fields: Map<String, Value>,
}

/// Document database accepting atomic multi-document writes into a collection.
pub trait DocumentStore {
    fn commit(&mut self, collection: &str, writes: &[PendingWrite]) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct UploadRequest<'a> {
    pub remote_path: &'a str,
    pub content_type: &'a str,
    pub cache_control: &'a str,
    pub public: bool,
    pub body: &'a [u8],
}

/// Object store keyed by slash-separated paths.
pub trait ObjectStore {
    fn upload(&mut self, request: &UploadRequest<'_>) -> Result<()>;
}

/// Accepts everything and sends nothing; backs `--dry-run`.
#[derive(Debug, Default)]
pub struct DryRunStore {
    pub commits: usize,
    pub uploads: usize,
}

impl DocumentStore for DryRunStore {
    fn commit(&mut self, collection: &str, writes: &[PendingWrite]) -> Result<()> {
        self.commits += 1;
        debug!(collection = %collection, writes = writes.len(), "dry-run commit");
        Ok(())
    }
}

impl ObjectStore for DryRunStore {
    fn upload(&mut self, request: &UploadRequest<'_>) -> Result<()> {
        self.uploads += 1;
        debug!(
            remote_path = %request.remote_path,
            bytes = request.body.len(),
            "dry-run upload"
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use anyhow::bail;

    use super::*;

    #[derive(Debug, Default)]
    pub struct RecordingDocumentStore {
        pub commits: Vec<(String, Vec<PendingWrite>)>,
    }

    impl RecordingDocumentStore {
        pub fn written_ids(&self, collection: &str) -> Vec<String> {
            self.commits
                .iter()
                .filter(|(name, _)| name == collection)
                .flat_map(|(_, writes)| writes.iter().map(|write| write.document_id.clone()))
                .collect()
        }
    }

    impl DocumentStore for RecordingDocumentStore {
        fn commit(&mut self, collection: &str, writes: &[PendingWrite]) -> Result<()> {
            self.commits.push((collection.to_string(), writes.to_vec()));
            Ok(())
        }
    }

    /// Fails every commit after the first `allowed` ones.
    #[derive(Debug, Default)]
    pub struct FailingDocumentStore {
        pub allowed: usize,
        pub attempts: usize,
    }

    impl DocumentStore for FailingDocumentStore {
        fn commit(&mut self, collection: &str, _writes: &[PendingWrite]) -> Result<()> {
            self.attempts += 1;
            if self.attempts > self.allowed {
                bail!("remote rejected commit for {collection}");
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedUpload {
        pub remote_path: String,
        pub content_type: String,
        pub cache_control: String,
        pub public: bool,
        pub bytes: usize,
    }

    #[derive(Debug, Default)]
    pub struct RecordingObjectStore {
        pub uploads: Vec<RecordedUpload>,
    }

    impl ObjectStore for RecordingObjectStore {
        fn upload(&mut self, request: &UploadRequest<'_>) -> Result<()> {
            self.uploads.push(RecordedUpload {
                remote_path: request.remote_path.to_string(),
                content_type: request.content_type.to_string(),
                cache_control: request.cache_control.to_string(),
                public: request.public,
                bytes: request.body.len(),
            });
            Ok(())
        }
    }
}
