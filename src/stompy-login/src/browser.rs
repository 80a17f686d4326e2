//! Launching the user's default browser.

use crate::error::{AuthError, AuthResult};

/// Opens a URL for the user. Swapped out in tests.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str) -> AuthResult<()>;
}

/// Launches the platform default browser as a detached child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> AuthResult<()> {
        let safe_url = validate_url(url)?;
        spawn_browser(&safe_url)
    }
}

/// Only plain http(s) URLs without credentials or shell metacharacters are
/// handed to the OS.
fn validate_url(url: &str) -> AuthResult<String> {
    let parsed = url::Url::parse(url).map_err(|e| AuthError::Browser(format!("invalid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AuthError::Browser(format!(
                "refusing to open URL with scheme '{scheme}': only http and https are allowed"
            )));
        }
    }

    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(AuthError::Browser(
            "refusing to open URL with embedded credentials".to_string(),
        ));
    }

    const DANGEROUS_CHARS: &[char] = &[
        '`', '$', '|', ';', '<', '>', '(', ')', '{', '}', '[', ']', '!', '"', '\n', '\r',
    ];
    if url.chars().any(|c| DANGEROUS_CHARS.contains(&c)) {
        return Err(AuthError::Browser(
            "URL contains potentially dangerous characters".to_string(),
        ));
    }

    Ok(parsed.as_str().to_string())
}

fn spawn_browser(url: &str) -> AuthResult<()> {
    #[cfg(target_os = "macos")]
    let mut command = {
        let mut c = std::process::Command::new("open");
        c.arg(url);
        c
    };

    #[cfg(target_os = "windows")]
    let mut command = {
        // `start` would route the query string through cmd's `&` handling
        let mut c = std::process::Command::new("rundll32");
        c.args(["url.dll,FileProtocolHandler", url]);
        c
    };

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = {
        let mut c = std::process::Command::new("xdg-open");
        c.arg(url);
        c
    };

    command
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|e| AuthError::Browser(e.to_string()))
}
