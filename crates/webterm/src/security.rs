//! Command denylist
//!
//! A best-effort filter that refuses commands containing well-known dangerous
//! substrings. It is NOT a sandbox: quoting, variables, alternate binaries and
//! path tricks all get past it. It exists to stop accidents typed into a
//! browser tab, nothing more.

/// Patterns blocked by [`Denylist::default`], checked in this order.
pub const DEFAULT_PATTERNS: &[&str] = &[
    "rm -rf",
    "mkfs",
    "dd if=",
    "> /dev/sd",
    "chmod 000",
    "sudo",
    "su",
    "passwd",
];

/// Result of checking a command against the denylist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Command may run
    Allowed,
    /// Command contains a denylisted substring
    Blocked { pattern: String },
}

impl Verdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Verdict::Blocked { .. })
    }
}

/// Case-insensitive substring denylist.
#[derive(Debug, Clone)]
pub struct Denylist {
    /// Patterns stored lower-cased, in match priority order
    patterns: Vec<String>,
}

impl Default for Denylist {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl Denylist {
    /// Create the default denylist
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a denylist that blocks nothing.
    ///
    /// # Warning
    ///
    /// Only useful for tests or fully trusted single-user setups.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Append a pattern. It is checked after all existing ones.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into().to_lowercase();
        if !pattern.is_empty() && !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
        self
    }

    /// Patterns in priority order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check a command; the first matching pattern wins.
    pub fn check(&self, command: &str) -> Verdict {
        match self.is_blocked(command) {
            Some(pattern) => Verdict::Blocked {
                pattern: pattern.to_string(),
            },
            None => Verdict::Allowed,
        }
    }

    /// Return the first pattern contained in `command`, if any.
    pub fn is_blocked(&self, command: &str) -> Option<&str> {
        let lower = command.to_lowercase();
        self.patterns
            .iter()
            .find(|pattern| lower.contains(pattern.as_str()))
            .map(|p| p.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_blocks_known_patterns() {
        let denylist = Denylist::new();
        assert_eq!(denylist.is_blocked("rm -rf /"), Some("rm -rf"));
        assert_eq!(denylist.is_blocked("mkfs.ext4 /dev/sda1"), Some("mkfs"));
        assert_eq!(denylist.is_blocked("dd if=/dev/zero of=x"), Some("dd if="));
        assert_eq!(denylist.is_blocked("echo x > /dev/sda"), Some("> /dev/sd"));
        assert_eq!(denylist.is_blocked("chmod 000 file"), Some("chmod 000"));
        assert_eq!(denylist.is_blocked("passwd"), Some("passwd"));
    }

    #[test]
    fn test_case_insensitive() {
        let denylist = Denylist::new();
        assert_eq!(denylist.is_blocked("SUDO ls"), Some("sudo"));
        assert_eq!(denylist.is_blocked("Rm -RF tmp"), Some("rm -rf"));
    }

    #[test]
    fn test_first_pattern_wins() {
        // "sudo" also contains "su"; "sudo" comes first in the list
        let denylist = Denylist::new();
        assert_eq!(
            denylist.check("sudo rm -rf /"),
            Verdict::Blocked {
                pattern: "rm -rf".to_string()
            }
        );
        assert_eq!(denylist.is_blocked("sudo ls"), Some("sudo"));
    }

    #[test]
    fn test_substring_match_is_broad() {
        // Accepted weakness: any word containing "su" is blocked
        let denylist = Denylist::new();
        assert_eq!(denylist.is_blocked("echo result"), Some("su"));
    }

    #[test]
    fn test_allowed() {
        let denylist = Denylist::new();
        assert_eq!(denylist.check("ls -la"), Verdict::Allowed);
        assert_eq!(denylist.check("rm file.txt"), Verdict::Allowed);
        assert!(!denylist.check("git status").is_blocked());
    }

    #[test]
    fn test_custom_patterns() {
        let denylist = Denylist::empty().with_pattern("Shutdown");
        assert_eq!(denylist.is_blocked("sudo ls"), None);
        assert_eq!(denylist.is_blocked("shutdown -h now"), Some("shutdown"));
    }
}
