//! Prompt rendering

use serde::Serialize;
use std::path::Path;

use crate::session::Identity;

/// Prompt shown in front of the input line, rebuilt for every response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptView {
    /// Markup with one span per prompt part
    pub html: String,
    pub user: String,
    pub host: String,
    /// Working directory with the home prefix shortened to `~`
    pub path: String,
}

impl PromptView {
    pub fn new(identity: &Identity, cwd: &Path) -> Self {
        let path = display_path(cwd, &identity.home);
        let html = format!(
            "<span class='prompt-user'>{}</span>\
             <span class='prompt-at'>@</span>\
             <span class='prompt-host'>{}</span>\
             <span class='prompt-colon'>:</span>\
             <span class='prompt-path'>{}</span>\
             <span class='prompt-dollar'>$</span>",
            escape_html(&identity.user),
            escape_html(&identity.host),
            escape_html(&path),
        );

        Self {
            html,
            user: identity.user.clone(),
            host: identity.host.clone(),
            path,
        }
    }
}

/// `cwd` with a leading `home` replaced by `~`.
pub fn display_path(cwd: &Path, home: &Path) -> String {
    if home.as_os_str().is_empty() {
        return cwd.to_string_lossy().into_owned();
    }
    match cwd.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.to_string_lossy()),
        Err(_) => cwd.to_string_lossy().into_owned(),
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
