//! Game metadata lookups via the appinfo web API.
//!
//! The endpoint returns a loosely structured text document whose payload
//! embeds KeyValues-style quoted pairs. Rather than trusting the whole
//! body to be one well-formed document, the fields of interest are pulled
//! out with targeted scans, matching how the format's other consumers
//! read it.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::ctx::AppContext;

const APPINFO_URL: &str = "https://steamui.com/api/get_appinfo.php";

/// Retry schedule for install-dir lookups feeding appmanifest creation.
const INSTALL_DIR_ATTEMPTS: u32 = 5;
const INSTALL_DIR_RETRY_DELAY: Duration = Duration::from_secs(2);

static INSTALL_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""installdir"\s+"([^"]+)""#).unwrap());

/// Display name and optional parent app of one AppID.
#[derive(Debug, Clone, Default)]
pub struct GameInfo {
    /// Display name; the localized name when one exists.
    pub name: String,
    /// Parent AppID when this id is a DLC.
    pub parent: Option<String>,
}

/// Fetches the raw appinfo body for one AppID.
async fn fetch_body(ctx: &AppContext, app_id: &str) -> Option<String> {
    let url = format!("{APPINFO_URL}?appid={app_id}");
    let resp = ctx.client.get(&url).send().await.ok()?;
    if !resp.status().is_success() {
        return None;
    }
    resp.text().await.ok()
}

/// Looks up the display name and parent of an AppID.
///
/// Returns `None` on any network failure or when no name can be
/// extracted; callers treat that as "skip this id".
pub async fn game_info(ctx: &AppContext, app_id: &str) -> Option<GameInfo> {
    let body = fetch_body(ctx, app_id).await?;

    let name = extract_value(&body, "schinese")
        .or_else(|| extract_value(&body, "name"))?;
    let parent = extract_value(&body, "parent");

    Some(GameInfo {
        name,
        parent,
    })
}

/// Looks up the install directory, retrying a few times.
///
/// Used when generating `appmanifest_<appid>.acf`; `None` means the
/// manifest is skipped, never that the whole operation fails.
pub async fn install_dir(ctx: &AppContext, app_id: &str) -> Option<String> {
    for attempt in 1..=INSTALL_DIR_ATTEMPTS {
        if let Some(body) = fetch_body(ctx, app_id).await
            && let Some(caps) = INSTALL_DIR.captures(&body)
        {
            return Some(caps[1].to_string());
        }
        if attempt < INSTALL_DIR_ATTEMPTS {
            tokio::time::sleep(INSTALL_DIR_RETRY_DELAY).await;
        }
    }
    None
}

/// Extracts one quoted field from the appinfo body.
///
/// `schinese` is only read inside the `name_localized` block of the
/// `common` section; `name` and `parent` only inside `common` but outside
/// `name_localized`. Section boundaries are tracked by brace lines, the
/// pairs themselves by quote splitting.
fn extract_value(body: &str, key: &str) -> Option<String> {
    let mut in_common = false;
    let mut in_localized = false;

    for raw in body.lines() {
        let line = raw.trim();

        if line.contains("\"common\"") {
            in_common = true;
            continue;
        }
        if in_common && line.contains("\"name_localized\"") {
            in_localized = true;
            continue;
        }

        let wanted = match key {
            "schinese" => in_localized,
            _ => in_common && !in_localized,
        };
        if wanted && line.contains(&format!("\"{key}\"")) {
            let parts: Vec<&str> = line.split('"').collect();
            if parts.len() >= 5 && parts[1].trim() == key && !parts[3].is_empty() {
                return Some(parts[3].to_string());
            }
        }

        if line.contains('}') {
            if in_localized {
                in_localized = false;
            } else if in_common {
                in_common = false;
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = concat!(
        "\"appinfo\"\n{\n",
        "\t\"common\"\n\t{\n",
        "\t\t\"name\"\t\t\"Portal 2\"\n",
        "\t\t\"parent\"\t\t\"400\"\n",
        "\t\t\"name_localized\"\n\t\t{\n",
        "\t\t\t\"schinese\"\t\t\"传送门2\"\n",
        "\t\t}\n",
        "\t}\n",
        "}\n",
    );

    #[test]
    fn test_extract_name_and_parent() {
        assert_eq!(extract_value(BODY, "name").as_deref(), Some("Portal 2"));
        assert_eq!(extract_value(BODY, "parent").as_deref(), Some("400"));
    }

    #[test]
    fn test_extract_localized_name() {
        assert_eq!(extract_value(BODY, "schinese").as_deref(), Some("传送门2"));
    }

    #[test]
    fn test_name_not_taken_from_localized_block() {
        let body = "\"common\"\n{\n\t\"name_localized\"\n\t{\n\t\t\"name\"\t\t\"wrong\"\n\t}\n\t\"name\"\t\t\"right\"\n}\n";
        assert_eq!(extract_value(body, "name").as_deref(), Some("right"));
    }

    #[test]
    fn test_missing_key_is_none() {
        assert_eq!(extract_value("\"other\"\t\t\"x\"\n", "name"), None);
    }

    #[test]
    fn test_install_dir_regex() {
        let caps = INSTALL_DIR.captures("\"installdir\"        \"Portal 2\"").unwrap();
        assert_eq!(&caps[1], "Portal 2");
    }
}
