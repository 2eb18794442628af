/*!
 * File transfer options and helpers.
 */

use crate::error::{HdcError, Result};

/// File transfer options for send/recv operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileTransferOptions {
    hold_timestamp: bool,
    sync_mode: bool,
    compress: bool,
    mode_sync: bool,
    debug_dir: bool,
}

impl FileTransferOptions {
    /// Create new file transfer options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold target file timestamp (`-a`)
    pub fn hold_timestamp(mut self, enable: bool) -> Self {
        self.hold_timestamp = enable;
        self
    }

    /// Only update files that are newer (`-sync`)
    pub fn sync_mode(mut self, enable: bool) -> Self {
        self.sync_mode = enable;
        self
    }

    /// Compress during transfer (`-z`).
    ///
    /// Already compressed files gain little from this.
    pub fn compress(mut self, enable: bool) -> Self {
        self.compress = enable;
        self
    }

    /// Synchronize file mode (`-m`)
    pub fn mode_sync(mut self, enable: bool) -> Self {
        self.mode_sync = enable;
        self
    }

    /// Use the debug application directory (`-b`)
    pub fn debug_dir(mut self, enable: bool) -> Self {
        self.debug_dir = enable;
        self
    }

    /// Convert options to command flags string
    pub fn to_flags(&self) -> String {
        let mut flags = Vec::new();

        if self.hold_timestamp {
            flags.push("-a");
        }
        if self.sync_mode {
            flags.push("-sync");
        }
        if self.compress {
            flags.push("-z");
        }
        if self.mode_sync {
            flags.push("-m");
        }
        if self.debug_dir {
            flags.push("-b");
        }

        flags.join(" ")
    }
}

/// File transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileTransferDirection {
    /// Send file from local to remote device
    Send,
    /// Receive file from remote device to local
    Recv,
}

impl FileTransferDirection {
    /// Sub-command used after `file`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Recv => "recv",
        }
    }
}

/// Reject empty paths and paths containing NUL
pub(crate) fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() || path.contains('\0') {
        return Err(HdcError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Whether a transfer progress chunk reports the final outcome
pub(crate) fn is_transfer_complete(chunk: &str) -> bool {
    chunk.contains("FileTransfer finish")
        || chunk.contains("Transfer finish")
        || chunk.contains("[Fail]")
        || chunk.contains("fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_options_flags() {
        assert_eq!(FileTransferOptions::new().to_flags(), "");

        let opts = FileTransferOptions::new()
            .compress(true)
            .hold_timestamp(true);
        assert_eq!(opts.to_flags(), "-a -z");

        let opts = FileTransferOptions::new().sync_mode(true).mode_sync(true);
        assert_eq!(opts.to_flags(), "-sync -m");

        let opts = FileTransferOptions::new()
            .debug_dir(true)
            .mode_sync(true)
            .compress(true)
            .sync_mode(true)
            .hold_timestamp(true);
        assert_eq!(opts.to_flags(), "-a -sync -z -m -b");
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("/data/local/tmp/test.txt").is_ok());
        assert!(validate_path("test.txt").is_ok());
        assert!(matches!(validate_path(""), Err(HdcError::InvalidPath(_))));
        assert!(validate_path("test\0file").is_err());
    }

    #[test]
    fn test_transfer_complete_markers() {
        assert!(is_transfer_complete(
            "FileTransfer finish, Size:12, File count = 1, time:3ms rate:4.00kB/s"
        ));
        assert!(is_transfer_complete("[Fail]Error opening file: no such file"));
        assert!(!is_transfer_complete("[Info]Transferring 50%"));
    }

    #[test]
    fn test_direction() {
        assert_eq!(FileTransferDirection::Send.as_str(), "send");
        assert_eq!(FileTransferDirection::Recv.as_str(), "recv");
    }
}
