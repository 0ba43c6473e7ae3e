use anyhow::{Context, Result, bail};
use std::{
    path::{Path, PathBuf},
    process::Command,
};
use tokio::{fs, io::AsyncWriteExt};
use tracing::info;

use crate::constants::SIGNIN_PAGE_FILE_NAME;

const SIGNIN_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="referrer" content="no-referrer">
  <meta http-equiv="refresh" content="0; url={{url}}">
  <title>AWS Management Console sign-in</title>
</head>
<body>
  <p>Signing in to the AWS Management Console&hellip;</p>
  <p>If you are not redirected, <a href="{{url}}">continue to {{destination}}</a>.</p>
</body>
</html>
"#;

/// Sign-in URL together with the console page it lands on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederationLoginInfo {
    pub url: String,
    pub destination: String,
}

/// Render the sign-in redirect page
pub fn render_signin_page(info: &FederationLoginInfo) -> String {
    SIGNIN_TEMPLATE
        .replace("{{url}}", &escape_html(&info.url))
        .replace("{{destination}}", &escape_html(&info.destination))
}

/// Write the sign-in page into `dir` and return its path
pub async fn write_signin_page(dir: &Path, info: &FederationLoginInfo) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let path = dir.join(SIGNIN_PAGE_FILE_NAME);

    // The page embeds a live sign-in token, so it is created owner-only
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(&path)
        .await
        .with_context(|| format!("Failed to create sign-in page {}", path.display()))?;

    // A page left by an older run keeps its previous mode
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
    }

    file.write_all(render_signin_page(info).as_bytes())
        .await
        .with_context(|| format!("Failed to write sign-in page to {}", path.display()))?;
    file.flush().await?;

    info!("Sign-in page written to {}", path.display());
    Ok(path)
}

/// Open a URL or local file in the default browser using platform-specific command
pub fn open_browser(target: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    let status = Command::new("open").arg(target).status();

    #[cfg(target_os = "windows")]
    let status = Command::new("cmd").args(["/c", "start", "", target]).status();

    #[cfg(target_os = "linux")]
    let status = Command::new("xdg-open").arg(target).status();

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    bail!("Unsupported operating system");

    #[cfg(any(target_os = "macos", target_os = "windows", target_os = "linux"))]
    {
        let status = status.context("Failed to execute browser command")?;
        if !status.success() {
            bail!("Browser command returned error: {status}");
        }
        Ok(())
    }
}

/// `file://` URL for a local path
pub fn file_url(path: &Path) -> Result<String> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve path: {}", path.display()))?;
    url::Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| anyhow::anyhow!("Not a valid file path: {}", absolute.display()))
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
