use std::path::Path;

use fluentra_protocol::constants::{ALLOWED_AUDIO_TYPES, MAX_UPLOAD_SIZE};

use crate::UploadError;
use crate::types::UploadTarget;

/// Pre-flight constraints for a candidate recording.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    /// Accepted MIME types.
    pub allowed_types: Vec<String>,
    /// Maximum file size in bytes.
    pub max_size_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            allowed_types: ALLOWED_AUDIO_TYPES.iter().map(|t| (*t).to_string()).collect(),
            max_size_bytes: MAX_UPLOAD_SIZE,
        }
    }
}

/// Checks a candidate file against the limits.
///
/// Pure and synchronous; the sequencer runs this before any network
/// request, so a rejected file never reaches the endpoint.
pub fn validate_target(target: &UploadTarget, limits: &UploadLimits) -> Result<(), UploadError> {
    if !limits.allowed_types.iter().any(|t| t == &target.mime_type) {
        return Err(UploadError::UnsupportedType {
            mime_type: target.mime_type.clone(),
        });
    }

    if target.size_bytes == 0 {
        return Err(UploadError::EmptyFile);
    }

    if target.size_bytes > limits.max_size_bytes {
        return Err(UploadError::TooLarge {
            size_bytes: target.size_bytes,
            max_bytes: limits.max_size_bytes,
        });
    }

    Ok(())
}

/// Maps a file extension to its audio MIME type.
pub fn mime_type_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "m4a" => Some("audio/m4a"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn target(mime: &str, size: u64) -> UploadTarget {
        UploadTarget {
            name: "take.wav".into(),
            size_bytes: size,
            mime_type: mime.into(),
            path: PathBuf::from("/tmp/take.wav"),
        }
    }

    #[test]
    fn accepts_all_reference_types() {
        let limits = UploadLimits::default();
        for mime in ["audio/mp3", "audio/mpeg", "audio/wav", "audio/m4a"] {
            assert!(validate_target(&target(mime, 1024), &limits).is_ok());
        }
    }

    #[test]
    fn rejects_unsupported_type() {
        let err = validate_target(&target("video/mp4", 1024), &UploadLimits::default()).unwrap_err();
        assert!(matches!(
            err,
            UploadError::UnsupportedType { ref mime_type } if mime_type == "video/mp4"
        ));
    }

    #[test]
    fn rejects_oversized_file() {
        let limits = UploadLimits::default();
        let err = validate_target(&target("audio/wav", limits.max_size_bytes + 1), &limits)
            .unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));
    }

    #[test]
    fn accepts_file_at_exact_limit() {
        let limits = UploadLimits::default();
        assert!(validate_target(&target("audio/wav", limits.max_size_bytes), &limits).is_ok());
    }

    #[test]
    fn rejects_empty_file() {
        let err = validate_target(&target("audio/wav", 0), &UploadLimits::default()).unwrap_err();
        assert!(matches!(err, UploadError::EmptyFile));
    }

    #[test]
    fn type_check_runs_before_size_check() {
        // An oversized file of the wrong type reports the type problem.
        let limits = UploadLimits::default();
        let err =
            validate_target(&target("text/plain", limits.max_size_bytes + 1), &limits).unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType { .. }));
    }

    #[test]
    fn custom_limits_override_defaults() {
        let limits = UploadLimits {
            allowed_types: vec!["audio/flac".into()],
            max_size_bytes: 10,
        };
        assert!(validate_target(&target("audio/flac", 10), &limits).is_ok());
        assert!(validate_target(&target("audio/wav", 10), &limits).is_err());
        assert!(validate_target(&target("audio/flac", 11), &limits).is_err());
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(
            mime_type_for_extension(Path::new("a.mp3")),
            Some("audio/mpeg")
        );
        assert_eq!(
            mime_type_for_extension(Path::new("a.wav")),
            Some("audio/wav")
        );
        assert_eq!(
            mime_type_for_extension(Path::new("a.m4a")),
            Some("audio/m4a")
        );
        assert_eq!(mime_type_for_extension(Path::new("a.ogg")), None);
        assert_eq!(mime_type_for_extension(Path::new("noext")), None);
    }

    #[test]
    fn extension_mapping_is_case_insensitive() {
        assert_eq!(
            mime_type_for_extension(Path::new("LOUD.WAV")),
            Some("audio/wav")
        );
        assert_eq!(
            mime_type_for_extension(Path::new("Take.Mp3")),
            Some("audio/mpeg")
        );
    }
}
