//! Linux distribution identification.

use serde::{Deserialize, Serialize};

/// A parsed os-release record for the scanned filesystem's distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LinuxRelease {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pretty_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub id_like: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version_codename: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub build_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub home_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub support_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bug_report_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cpe_name: String,
}

impl LinuxRelease {
    /// Parse the `KEY=value` os-release format.
    ///
    /// Values may be quoted with single or double quotes; unknown keys and
    /// malformed lines are skipped.
    pub fn from_os_release(content: &str) -> Option<Self> {
        let mut release = LinuxRelease::default();
        let mut any = false;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, raw_value)) = line.split_once('=') else {
                continue;
            };
            let value = unquote(raw_value.trim());
            if value.is_empty() {
                continue;
            }
            let mut known = true;
            match key.trim() {
                "PRETTY_NAME" => release.pretty_name = value,
                "NAME" => release.name = value,
                "ID" => release.id = value,
                "ID_LIKE" => {
                    release.id_like = value.split_whitespace().map(str::to_string).collect();
                }
                "VERSION" => release.version = value,
                "VERSION_ID" => release.version_id = value,
                "VERSION_CODENAME" => release.version_codename = value,
                "BUILD_ID" => release.build_id = value,
                "HOME_URL" => release.home_url = value,
                "SUPPORT_URL" => release.support_url = value,
                "BUG_REPORT_URL" => release.bug_report_url = value,
                "CPE_NAME" => release.cpe_name = value,
                _ => known = false,
            }
            any = any || known;
        }

        if any {
            Some(release)
        } else {
            None
        }
    }
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALPINE: &str = r#"
NAME="Alpine Linux"
ID=alpine
VERSION_ID=3.18.4
PRETTY_NAME="Alpine Linux v3.18"
HOME_URL="https://alpinelinux.org/"
BUG_REPORT_URL="https://gitlab.alpinelinux.org/alpine/aports/-/issues"
"#;

    #[test]
    fn test_parse_alpine_os_release() {
        let release = LinuxRelease::from_os_release(ALPINE).expect("release parsed");
        assert_eq!(release.id, "alpine");
        assert_eq!(release.version_id, "3.18.4");
        assert_eq!(release.pretty_name, "Alpine Linux v3.18");
    }

    #[test]
    fn test_id_like_splits_on_whitespace() {
        let release =
            LinuxRelease::from_os_release("ID=ubuntu\nID_LIKE=debian other\n").expect("parsed");
        assert_eq!(release.id_like, vec!["debian", "other"]);
    }

    #[test]
    fn test_empty_and_comment_only_content_yields_none() {
        assert_eq!(LinuxRelease::from_os_release(""), None);
        assert_eq!(LinuxRelease::from_os_release("# nothing here\n"), None);
    }

    #[test]
    fn test_single_quoted_values() {
        let release = LinuxRelease::from_os_release("ID='arch'\n").expect("parsed");
        assert_eq!(release.id, "arch");
    }
}
