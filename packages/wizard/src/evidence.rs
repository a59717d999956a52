//! Evidence attachments and privacy toggles.
//!
//! At most [`MAX_EVIDENCE_FILES`] files may be attached. An addition that
//! would exceed the cap is dropped as a whole. Each file must be an image
//! or video no larger than [`MAX_EVIDENCE_FILE_BYTES`]; files failing those
//! checks are rejected individually before the cap is applied.

use galamsey_watch_report_models::{EvidenceFile, PrivacyFlags};

/// Maximum number of attached files.
pub const MAX_EVIDENCE_FILES: usize = 5;

/// Maximum size of a single file (5 MiB).
pub const MAX_EVIDENCE_FILE_BYTES: u64 = 5 * 1024 * 1024;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "heic", "heif", "bmp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "avi", "webm", "mkv", "3gp"];

/// Why a file was not attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// Larger than [`MAX_EVIDENCE_FILE_BYTES`].
    TooLarge {
        /// Actual size.
        size_bytes: u64,
    },
    /// Not recognisable as an image or video.
    UnsupportedType {
        /// Declared MIME type, if any.
        content_type: Option<String>,
    },
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooLarge { size_bytes } => write!(
                f,
                "file is {size_bytes} bytes, the limit is {MAX_EVIDENCE_FILE_BYTES} bytes"
            ),
            Self::UnsupportedType { content_type } => write!(
                f,
                "only photos and videos are accepted (got {})",
                content_type.as_deref().unwrap_or("unknown type")
            ),
        }
    }
}

/// A file that failed the per-file checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceRejection {
    /// File name.
    pub name: String,
    /// What was wrong with it.
    pub reason: RejectionReason,
}

/// Result of [`EvidenceCollector::add`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddOutcome {
    /// Number of files attached.
    pub added: usize,
    /// Files rejected by the per-file checks.
    pub rejected: Vec<EvidenceRejection>,
    /// The valid files were dropped because they would exceed the cap.
    pub over_capacity: bool,
}

/// Holds the attached files and privacy toggles of a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvidenceCollector {
    files: Vec<EvidenceFile>,
    privacy: PrivacyFlags,
}

impl EvidenceCollector {
    /// Attached files in the order they were added.
    #[must_use]
    pub fn files(&self) -> &[EvidenceFile] {
        &self.files
    }

    /// Current privacy toggles.
    #[must_use]
    pub const fn privacy(&self) -> PrivacyFlags {
        self.privacy
    }

    /// Attaches `new_files`.
    ///
    /// Invalid files are rejected one by one. If the remaining valid files
    /// would bring the total above [`MAX_EVIDENCE_FILES`], none of them are
    /// attached.
    pub fn add(&mut self, new_files: impl IntoIterator<Item = EvidenceFile>) -> AddOutcome {
        let mut outcome = AddOutcome::default();
        let mut accepted = Vec::new();

        for file in new_files {
            match check_file(&file) {
                Ok(()) => accepted.push(file),
                Err(reason) => outcome.rejected.push(EvidenceRejection {
                    name: file.name,
                    reason,
                }),
            }
        }

        if self.files.len() + accepted.len() > MAX_EVIDENCE_FILES {
            log::debug!(
                "Dropping {} evidence file(s): {} already attached, limit {MAX_EVIDENCE_FILES}",
                accepted.len(),
                self.files.len()
            );
            outcome.over_capacity = !accepted.is_empty();
            return outcome;
        }

        outcome.added = accepted.len();
        self.files.extend(accepted);
        outcome
    }

    /// Removes the file at `index`, keeping the others in order.
    ///
    /// Returns the removed file, or `None` if `index` is out of range.
    pub fn remove(&mut self, index: usize) -> Option<EvidenceFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    /// Records whether faces should be blurred.
    pub const fn set_blur_faces(&mut self, blur: bool) {
        self.privacy.blur_faces = blur;
    }

    /// Records whether location metadata should be stripped.
    pub const fn set_strip_location_metadata(&mut self, strip: bool) {
        self.privacy.strip_location_metadata = strip;
    }
}

fn check_file(file: &EvidenceFile) -> Result<(), RejectionReason> {
    if file.size_bytes > MAX_EVIDENCE_FILE_BYTES {
        return Err(RejectionReason::TooLarge {
            size_bytes: file.size_bytes,
        });
    }
    if !is_media(file) {
        return Err(RejectionReason::UnsupportedType {
            content_type: file.content_type.clone(),
        });
    }
    Ok(())
}

/// Whether a file is a photo or video, judged by its declared MIME type or,
/// failing that, its extension.
#[must_use]
pub fn is_media(file: &EvidenceFile) -> bool {
    if let Some(content_type) = file.content_type.as_deref() {
        let content_type = content_type.to_ascii_lowercase();
        return content_type.starts_with("image/") || content_type.starts_with("video/");
    }

    file.name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS.contains(&ext.as_str()) || VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(name: &str) -> EvidenceFile {
        EvidenceFile {
            name: name.to_string(),
            size_bytes: 200_000,
            content_type: Some("image/jpeg".to_string()),
        }
    }

    #[test]
    fn never_exceeds_five_files() {
        let mut evidence = EvidenceCollector::default();
        for batch in [2usize, 2, 2, 1, 3, 1, 1] {
            evidence.add((0..batch).map(|i| photo(&format!("f{i}.jpg"))));
            assert!(evidence.files().len() <= MAX_EVIDENCE_FILES);
        }
        assert_eq!(evidence.files().len(), MAX_EVIDENCE_FILES);
    }

    #[test]
    fn over_capacity_batch_is_dropped_whole() {
        let mut evidence = EvidenceCollector::default();
        evidence.add([photo("a.jpg"), photo("b.jpg"), photo("c.jpg")]);
        let outcome = evidence.add([photo("d.jpg"), photo("e.jpg"), photo("f.jpg")]);
        assert!(outcome.over_capacity);
        assert_eq!(outcome.added, 0);
        assert_eq!(evidence.files().len(), 3);

        let outcome = evidence.add([photo("d.jpg"), photo("e.jpg")]);
        assert_eq!(outcome.added, 2);
        assert_eq!(evidence.files().len(), 5);
    }

    #[test]
    fn rejects_oversized_and_non_media_files() {
        let mut evidence = EvidenceCollector::default();
        let outcome = evidence.add([
            EvidenceFile {
                name: "huge.mp4".to_string(),
                size_bytes: MAX_EVIDENCE_FILE_BYTES + 1,
                content_type: Some("video/mp4".to_string()),
            },
            EvidenceFile {
                name: "notes.pdf".to_string(),
                size_bytes: 10,
                content_type: Some("application/pdf".to_string()),
            },
            EvidenceFile {
                name: "clip.MOV".to_string(),
                size_bytes: 10,
                content_type: None,
            },
        ]);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.rejected.len(), 2);
        assert!(matches!(
            outcome.rejected[0].reason,
            RejectionReason::TooLarge { .. }
        ));
        assert_eq!(outcome.rejected[1].name, "notes.pdf");
        assert_eq!(evidence.files()[0].name, "clip.MOV");
    }

    #[test]
    fn remove_preserves_order() {
        let mut evidence = EvidenceCollector::default();
        evidence.add([photo("a.jpg"), photo("b.jpg"), photo("c.jpg")]);
        let removed = evidence.remove(1).unwrap();
        assert_eq!(removed.name, "b.jpg");
        let names: Vec<&str> = evidence.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.jpg", "c.jpg"]);
        assert!(evidence.remove(7).is_none());
        assert_eq!(evidence.files().len(), 2);
    }

    #[test]
    fn privacy_toggles_default_on() {
        let mut evidence = EvidenceCollector::default();
        assert_eq!(evidence.privacy(), PrivacyFlags::default());
        evidence.set_strip_location_metadata(false);
        assert!(evidence.privacy().blur_faces);
        assert!(!evidence.privacy().strip_location_metadata);
    }
}
