use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use super::{FlowError, ValidationError};
use crate::api::RequestClient;
use crate::models::{UploadReceipt, UploadableFile};

/// Confirmation shown once the backend accepts the file
pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";

/// Message shown for a failed upload without a backend explanation
const UPLOAD_FAILED: &str = "Error uploading file";

/// Message shown when the backend rejects the session during an upload
const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    /// A valid markdown file is picked and ready to send
    Selecting(Arc<UploadableFile>),
    Uploading { file_name: String },
    Succeeded(UploadReceipt),
    Failed(FlowError),
}

impl UploadStatus {
    pub fn is_busy(&self) -> bool {
        matches!(self, UploadStatus::Uploading { .. })
    }

    pub fn selected_file(&self) -> Option<&UploadableFile> {
        match self {
            UploadStatus::Selecting(file) => Some(file),
            _ => None,
        }
    }

    /// Line to show the user for this status, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            UploadStatus::Idle => None,
            UploadStatus::Selecting(file) => Some(format!("Selected {}", file.name)),
            UploadStatus::Uploading { file_name } => Some(format!("Uploading {}...", file_name)),
            UploadStatus::Succeeded(_) => Some(UPLOAD_SUCCESS_MESSAGE.to_string()),
            UploadStatus::Failed(err) => Some(err.to_string()),
        }
    }
}

/// Single-file markdown upload state machine.
///
/// The picked file lives inside the status; once an attempt resolves the
/// status moves on and the file is dropped with it.
pub struct UploadFlow {
    client: Arc<RequestClient>,
    status: watch::Sender<UploadStatus>,
}

impl UploadFlow {
    pub fn new(client: Arc<RequestClient>) -> Self {
        let (status, _) = watch::channel(UploadStatus::Idle);
        Self { client, status }
    }

    pub fn status(&self) -> UploadStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadStatus> {
        self.status.subscribe()
    }

    /// Pick a file. Anything but markdown fails here without a request.
    pub fn select_file(&self, file: UploadableFile) -> Result<(), FlowError> {
        let mut outcome = Ok(());
        let applied = self.status.send_if_modified(|status| {
            if status.is_busy() {
                return false;
            }
            if file.is_markdown() {
                *status = UploadStatus::Selecting(Arc::new(file));
            } else {
                let err = FlowError::from(ValidationError::InvalidFileType {
                    name: file.name.clone(),
                    media_type: file.media_type.clone(),
                });
                warn!(file = %file.name, media_type = %file.media_type, "Rejected non-markdown file");
                *status = UploadStatus::Failed(err.clone());
                outcome = Err(err);
            }
            true
        });
        if !applied {
            return Err(FlowError::Busy);
        }
        outcome
    }

    /// Back to `Idle`, dropping any selection. Ignored while uploading.
    pub fn reset(&self) -> Result<(), FlowError> {
        let applied = self.status.send_if_modified(|status| {
            if status.is_busy() {
                return false;
            }
            *status = UploadStatus::Idle;
            true
        });
        if applied {
            Ok(())
        } else {
            Err(FlowError::Busy)
        }
    }

    /// Send the selected file.
    pub async fn submit(&self) -> Result<UploadReceipt, FlowError> {
        let mut taken: Option<Arc<UploadableFile>> = None;
        let mut busy = false;
        self.status.send_if_modified(|status| match status {
            UploadStatus::Uploading { .. } => {
                busy = true;
                false
            }
            UploadStatus::Selecting(file) => {
                let file = Arc::clone(file);
                *status = UploadStatus::Uploading {
                    file_name: file.name.clone(),
                };
                taken = Some(file);
                true
            }
            _ => {
                *status = UploadStatus::Failed(ValidationError::NoFileSelected.into());
                true
            }
        });

        if busy {
            warn!("Upload already in progress, ignoring submit");
            return Err(FlowError::Busy);
        }
        let Some(file) = taken else {
            return Err(ValidationError::NoFileSelected.into());
        };

        match self.client.upload(&file).await {
            Ok(receipt) => {
                info!(file = %file.name, "Upload succeeded");
                self.status.send_replace(UploadStatus::Succeeded(receipt.clone()));
                Ok(receipt)
            }
            Err(e) => {
                let err = FlowError::from_api(&e, SESSION_EXPIRED, UPLOAD_FAILED);
                error!(file = %file.name, error = %e, "Upload failed");
                self.status.send_replace(UploadStatus::Failed(err.clone()));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::config::Config;

    fn flow() -> UploadFlow {
        let config = Config {
            // Nothing listens here; these tests never reach the network
            backend_url: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        };
        let client = RequestClient::new(&config, Arc::new(MemoryTokenStore::with_token("t")))
            .unwrap();
        UploadFlow::new(Arc::new(client))
    }

    fn markdown(name: &str) -> UploadableFile {
        UploadableFile::new(name, "text/markdown", b"# Test".to_vec())
    }

    #[test]
    fn test_select_markdown() {
        let flow = flow();
        assert_eq!(flow.status(), UploadStatus::Idle);

        flow.select_file(markdown("test.md")).unwrap();
        assert_eq!(flow.status().selected_file().unwrap().name, "test.md");
        assert_eq!(flow.status().message().unwrap(), "Selected test.md");
    }

    #[test]
    fn test_select_non_markdown_fails() {
        let flow = flow();
        let err = flow
            .select_file(UploadableFile::new("test.txt", "text/plain", vec![]))
            .unwrap_err();
        assert!(matches!(
            err,
            FlowError::Validation(ValidationError::InvalidFileType { .. })
        ));
        assert_eq!(flow.status(), UploadStatus::Failed(err));
    }

    #[test]
    fn test_reselect_discards_previous() {
        let flow = flow();
        flow.select_file(markdown("first.md")).unwrap();
        flow.select_file(markdown("second.md")).unwrap();
        assert_eq!(flow.status().selected_file().unwrap().name, "second.md");

        // A rejected pick drops the earlier selection
        let _ = flow.select_file(UploadableFile::new("x.pdf", "application/pdf", vec![]));
        assert!(flow.status().selected_file().is_none());

        flow.select_file(markdown("third.md")).unwrap();
        assert_eq!(flow.status().selected_file().unwrap().name, "third.md");
    }

    #[test]
    fn test_reset() {
        let flow = flow();
        flow.select_file(markdown("test.md")).unwrap();
        flow.reset().unwrap();
        assert_eq!(flow.status(), UploadStatus::Idle);
        assert!(flow.status().message().is_none());
    }

    #[tokio::test]
    async fn test_submit_without_file() {
        let flow = flow();
        let err = flow.submit().await.unwrap_err();
        assert_eq!(err, FlowError::Validation(ValidationError::NoFileSelected));
        assert_eq!(flow.status(), UploadStatus::Failed(err));

        // Still no file after a failure
        assert!(flow.submit().await.is_err());
    }
}
