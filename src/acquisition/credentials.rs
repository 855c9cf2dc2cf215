use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Where the downloader gets its cookies from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// A stored Netscape cookie file.
    CookieFile(PathBuf),
    /// Cookies read from a local browser profile.
    Browser(String),
}

impl CredentialSource {
    /// The stored cookie file wins when it exists; otherwise use the browser.
    pub fn resolve(cookies_file: &Path, browser: &str) -> Self {
        if cookies_file.is_file() {
            CredentialSource::CookieFile(cookies_file.to_path_buf())
        } else {
            CredentialSource::Browser(browser.to_string())
        }
    }

    pub fn args(&self) -> Vec<OsString> {
        match self {
            CredentialSource::CookieFile(path) => vec!["--cookies".into(), path.into()],
            CredentialSource::Browser(browser) => {
                vec!["--cookies-from-browser".into(), browser.into()]
            }
        }
    }
}
