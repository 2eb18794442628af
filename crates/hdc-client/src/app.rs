/*!
 * Application install and uninstall options.
 */

/// Application install options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Replace existing application (`-r`)
    pub replace: bool,
    /// Install shared bundle for multi-apps (`-s`)
    pub shared: bool,
}

impl InstallOptions {
    /// Create default install options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set replace option
    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    /// Set shared option
    pub fn shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    /// Convert to command line flags
    pub fn to_flags(&self) -> String {
        let mut flags = Vec::new();
        if self.replace {
            flags.push("-r");
        }
        if self.shared {
            flags.push("-s");
        }
        flags.join(" ")
    }
}

/// Application uninstall options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UninstallOptions {
    /// Keep the data and cache directories (`-k`)
    pub keep_data: bool,
    /// Remove shared bundle (`-s`)
    pub shared: bool,
}

impl UninstallOptions {
    /// Create default uninstall options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set keep_data option
    pub fn keep_data(mut self, keep: bool) -> Self {
        self.keep_data = keep;
        self
    }

    /// Set shared option
    pub fn shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    /// Convert to command line flags
    pub fn to_flags(&self) -> String {
        let mut flags = Vec::new();
        if self.keep_data {
            flags.push("-k");
        }
        if self.shared {
            flags.push("-s");
        }
        flags.join(" ")
    }
}

/// Whether an install progress chunk reports the final outcome
pub(crate) fn is_install_complete(chunk: &str) -> bool {
    let lower = chunk.to_ascii_lowercase();
    lower.contains("success") || lower.contains("fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_options() {
        assert_eq!(InstallOptions::new().to_flags(), "");

        let opts = InstallOptions::new().replace(true);
        assert_eq!(opts.to_flags(), "-r");

        let opts = InstallOptions::new().shared(true).replace(true);
        assert_eq!(opts.to_flags(), "-r -s");
    }

    #[test]
    fn test_uninstall_options() {
        let opts = UninstallOptions::new().keep_data(true);
        assert_eq!(opts.to_flags(), "-k");

        let opts = UninstallOptions::new().keep_data(true).shared(true);
        assert_eq!(opts.to_flags(), "-k -s");
    }

    #[test]
    fn test_install_complete_markers() {
        assert!(is_install_complete("AppMod finish, msg:install bundle successfully."));
        assert!(is_install_complete("[Fail]Not any installation package was found"));
        assert!(is_install_complete("Install Success"));
        assert!(!is_install_complete("[Info]App install path:/data/local/tmp/app.hap"));
    }
}
