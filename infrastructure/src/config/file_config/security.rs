//! Security configuration from TOML (`[security]` section)

use conclave_domain::config::validation::{ConfigIssue, ConfigIssueCode};
use conclave_domain::{SecurityPolicy, ThreatLevel};
use serde::{Deserialize, Serialize};

/// Raw security configuration from TOML
///
/// # Example
///
/// ```toml
/// [security]
/// enabled = true
/// blocked_patterns = ["rm -rf", "drop table", "exfiltrate"]
/// block_at = "medium"          # "low", "medium", "high", "critical"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSecurityConfig {
    pub enabled: bool,
    /// Substrings treated as threat indicators (matched case-insensitively)
    pub blocked_patterns: Vec<String>,
    /// Lowest threat level that rejects a request
    pub block_at: String,
}

impl Default for FileSecurityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            blocked_patterns: Vec::new(),
            block_at: ThreatLevel::High.as_str().to_string(),
        }
    }
}

impl FileSecurityConfig {
    /// Parse block_at into a ThreatLevel, falling back to `high` with a warning
    pub fn parse_block_at(&self) -> (ThreatLevel, Vec<ConfigIssue>) {
        match self.block_at.parse::<ThreatLevel>() {
            Ok(level) => (level, vec![]),
            Err(_) => {
                let issue = ConfigIssue::warning(
                    ConfigIssueCode::UnknownThreatLevel,
                    format!(
                        "security.block_at: unknown value '{}', falling back to 'high'",
                        self.block_at
                    ),
                );
                (ThreatLevel::High, vec![issue])
            }
        }
    }

    pub fn to_policy(&self) -> SecurityPolicy {
        let (block_at, _) = self.parse_block_at();
        let policy = SecurityPolicy::default()
            .with_patterns(self.blocked_patterns.iter().map(|p| p.to_lowercase()))
            .with_block_at(block_at);
        if self.enabled {
            policy
        } else {
            SecurityPolicy {
                enabled: false,
                ..policy
            }
        }
    }
}
