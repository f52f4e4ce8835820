use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::device::accessor::DeviceAccessor;
use crate::error::TraversalError;
use crate::state::identity::text_fingerprint;

/// Byte budget for the prefix part of an artifact filename. Leaves room for
/// `_screenshot_{ts}.png` under the usual 255-byte name limit.
const MAX_PREFIX_BYTES: usize = 160;
const PREFIX_HASH_CHARS: usize = 12;

/// Paths of the artifacts written for one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub screenshot: PathBuf,
    pub ui_tree: PathBuf,
}

/// Captures the state of the screen for later inspection. Nothing in the
/// traversal depends on what a recorder returns beyond logging the paths.
pub trait Recorder {
    fn record(
        &mut self,
        device: &mut dyn DeviceAccessor,
        prefix: &str,
    ) -> Result<Option<Artifacts>, TraversalError>;
}

/// Discards every capture.
pub struct NoopRecorder;

impl Recorder for NoopRecorder {
    fn record(
        &mut self,
        _device: &mut dyn DeviceAccessor,
        _prefix: &str,
    ) -> Result<Option<Artifacts>, TraversalError> {
        Ok(None)
    }
}

/// Writes `{prefix}_screenshot_{ts}.png` and `{prefix}_ui_tree_{ts}.xml`
/// into an output directory.
pub struct FileRecorder {
    output_dir: PathBuf,
}

impl FileRecorder {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, TraversalError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir).map_err(|e| TraversalError::ArtifactIo {
            context: format!("creating {}", output_dir.display()),
            source: e,
        })?;
        Ok(Self { output_dir })
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), TraversalError> {
        std::fs::write(path, bytes).map_err(|e| TraversalError::ArtifactIo {
            context: format!("writing {}", path.display()),
            source: e,
        })
    }
}

impl Recorder for FileRecorder {
    fn record(
        &mut self,
        device: &mut dyn DeviceAccessor,
        prefix: &str,
    ) -> Result<Option<Artifacts>, TraversalError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let prefix = artifact_prefix(prefix);

        let screenshot = self
            .output_dir
            .join(format!("{}_screenshot_{}.png", prefix, timestamp));
        self.write(&screenshot, &device.screenshot()?)?;

        let ui_tree = self
            .output_dir
            .join(format!("{}_ui_tree_{}.xml", prefix, timestamp));
        self.write(&ui_tree, device.dump_hierarchy()?.as_bytes())?;

        debug!(screenshot = %screenshot.display(), ui_tree = %ui_tree.display(), "state recorded");
        Ok(Some(Artifacts {
            screenshot,
            ui_tree,
        }))
    }
}

/// Filename-safe prefix for a signature. Over-long prefixes keep a readable
/// head and end with a short hash of the full signature, so distinct
/// signatures sharing a head still get distinct names.
pub fn artifact_prefix(signature: &str) -> String {
    let sanitized = sanitize_filename(signature);
    if sanitized.len() <= MAX_PREFIX_BYTES {
        return sanitized;
    }

    let budget = MAX_PREFIX_BYTES - PREFIX_HASH_CHARS - 1;
    let mut head_end = budget;
    while !sanitized.is_char_boundary(head_end) {
        head_end -= 1;
    }
    let hash = text_fingerprint(signature);
    format!("{}_{}", &sanitized[..head_end], &hash[..PREFIX_HASH_CHARS])
}

/// Sanitize a signature or label into a safe filename.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .to_lowercase()
}
