//! Feed data model
//!
//! Posts are persisted as camelCase JSON. Reads are lenient about the shape of
//! `createdAt` and `avatar` so records written by older client builds still load.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Explicit author identity, compared instead of display names
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The signed-in user of this client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
    pub id: AuthorId,
    pub display_name: String,
}

impl LocalUser {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: AuthorId::new(id),
            display_name: display_name.into(),
        }
    }

    /// True when the post was authored by this user
    pub fn owns(&self, post: &Post) -> bool {
        post.author_id == self.id
    }
}

/// Image reference for an avatar
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AvatarRef {
    /// Asset bundled with the application
    Local { handle: String },
    /// Remote URL or a user-picked image on the device
    Remote { uri: String },
}

impl AvatarRef {
    pub fn local(handle: impl Into<String>) -> Self {
        Self::Local {
            handle: handle.into(),
        }
    }

    pub fn remote(uri: impl Into<String>) -> Self {
        Self::Remote { uri: uri.into() }
    }

    /// Parse a stored avatar value, accepting legacy shapes: a bare URI
    /// string, an untagged `{uri}` object, or a numeric bundled-asset id.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(uri) if !uri.trim().is_empty() => Some(Self::remote(uri.trim())),
            Value::Number(asset) => Some(Self::local(format!("asset:{}", asset))),
            Value::Object(map) if map.contains_key("kind") => {
                serde_json::from_value(value.clone()).ok()
            }
            Value::Object(map) => map
                .get("uri")
                .and_then(Value::as_str)
                .filter(|uri| !uri.trim().is_empty())
                .map(Self::remote),
            _ => None,
        }
    }
}

impl fmt::Display for AvatarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { handle } => write!(f, "local:{}", handle),
            Self::Remote { uri } => f.write_str(uri),
        }
    }
}

/// A feed post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub author_id: AuthorId,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_avatar"
    )]
    pub avatar: Option<AvatarRef>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub comments: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u32>,
}

impl Post {
    /// Build a fresh post authored by the local user
    pub fn compose(
        author: &LocalUser,
        content: &str,
        image: Option<String>,
        avatar: AvatarRef,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author_id: author.id.clone(),
            author: author.display_name.clone(),
            content: content.trim().to_string(),
            image,
            avatar: Some(avatar),
            created_at: Some(created_at),
            likes: 0,
            comments: 0,
            views: None,
        }
    }

    /// Creation time used for ordering; missing timestamps count as the epoch
    pub fn effective_created_at(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Parse a stored timestamp. Accepts RFC 3339, naive ISO date-times (taken as
/// UTC), `YYYY-MM-DD`, `DD.MM.YYYY`, and epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => parse_timestamp_str(raw),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|ms| ms as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

fn parse_timestamp_str(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    ["%Y-%m-%d", "%d.%m.%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(parse_timestamp))
}

fn lenient_avatar<'de, D>(deserializer: D) -> Result<Option<AvatarRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(AvatarRef::from_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_avatar_json_shape() {
        let remote = serde_json::to_value(AvatarRef::remote("file:///me.jpg")).unwrap();
        assert_eq!(remote, json!({"kind": "remote", "uri": "file:///me.jpg"}));

        let local = serde_json::to_value(AvatarRef::local("avatar-default")).unwrap();
        assert_eq!(local, json!({"kind": "local", "handle": "avatar-default"}));
    }

    #[test]
    fn test_avatar_legacy_shapes() {
        assert_eq!(
            AvatarRef::from_value(&json!("https://cdn/a.png")),
            Some(AvatarRef::remote("https://cdn/a.png"))
        );
        assert_eq!(
            AvatarRef::from_value(&json!({"uri": "file:///b.jpg"})),
            Some(AvatarRef::remote("file:///b.jpg"))
        );
        assert_eq!(
            AvatarRef::from_value(&json!(12)),
            Some(AvatarRef::local("asset:12"))
        );
        assert_eq!(AvatarRef::from_value(&json!("")), None);
        assert_eq!(AvatarRef::from_value(&json!({"kind": "bogus"})), None);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let noon = Utc.with_ymd_and_hms(2024, 9, 15, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp(&json!("2024-09-15T12:00:00Z")), Some(noon));
        assert_eq!(parse_timestamp(&json!("2024-09-15T15:00:00+03:00")), Some(noon));
        assert_eq!(parse_timestamp(&json!("2024-09-15T12:00:00.000")), Some(noon));
        assert_eq!(
            parse_timestamp(&json!(noon.timestamp_millis())),
            Some(noon)
        );

        let midnight = Utc.with_ymd_and_hms(2003, 10, 14, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp(&json!("14.10.2003")), Some(midnight));
        assert_eq!(parse_timestamp(&json!("2003-10-14")), Some(midnight));

        assert_eq!(parse_timestamp(&json!("yesterday")), None);
        assert_eq!(parse_timestamp(&json!(true)), None);
    }

    #[test]
    fn test_post_deserializes_legacy_record() {
        let post: Post = serde_json::from_value(json!({
            "id": "news-1",
            "author": "Press Service",
            "content": "Graduation ceremony",
            "avatar": 3,
            "createdAt": "not a date",
            "likes": 156,
            "comments": 23,
            "views": 1240
        }))
        .unwrap();

        assert_eq!(post.author_id, AuthorId::default());
        assert_eq!(post.avatar, Some(AvatarRef::local("asset:3")));
        assert_eq!(post.created_at, None);
        assert_eq!(post.effective_created_at(), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(post.views, Some(1240));
    }

    #[test]
    fn test_post_serializes_camel_case() {
        let user = LocalUser::new("u-1", "Me");
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let post = Post::compose(&user, "  hi  ", None, AvatarRef::local("a"), at);

        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["authorId"], json!("u-1"));
        assert_eq!(value["content"], json!("hi"));
        assert!(value["createdAt"]
            .as_str()
            .is_some_and(|at| at.starts_with("2024-01-02T03:04:05")));
        assert!(value.get("image").is_none());

        let back: Post = serde_json::from_value(value).unwrap();
        assert_eq!(back, post);
        assert!(user.owns(&back));
    }
}
