use crate::Post;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub logged_in_user: Option<LoggedInUser>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedInUser {
    pub pk: Value,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SectionsResponse {
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub more_available: bool,
    #[serde(default)]
    pub next_max_id: Option<String>,
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub next_media_ids: Option<Vec<Value>>,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub layout_type: Option<String>,
    #[serde(default)]
    pub layout_content: LayoutContent,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LayoutContent {
    #[serde(default)]
    pub medias: Vec<MediaItem>,
    #[serde(default)]
    pub fill_items: Vec<MediaItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub media: Media,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub pk: Value,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub caption: Option<Caption>,
    pub user: MediaUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caption {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaUser {
    pub username: String,
}

/// Instagram sends primary keys as numbers or strings depending on the endpoint.
pub(crate) fn pk_to_string(pk: &Value) -> String {
    match pk {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl From<Media> for Post {
    fn from(media: Media) -> Self {
        Post {
            id: pk_to_string(&media.pk),
            code: media.code,
            caption: media.caption.map(|c| c.text).unwrap_or_default(),
            username: media.user.username,
        }
    }
}

impl SectionsResponse {
    /// Posts of every section, in page order.
    pub fn into_posts(self) -> Vec<Post> {
        self.sections
            .into_iter()
            .flat_map(|s| {
                s.layout_content
                    .medias
                    .into_iter()
                    .chain(s.layout_content.fill_items)
            })
            .map(|item| Post::from(item.media))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_sections_and_tolerates_missing_caption() {
        let resp: SectionsResponse = serde_json::from_value(json!({
            "sections": [
                {
                    "layout_type": "media_grid",
                    "layout_content": {
                        "medias": [
                            {"media": {"pk": 3101, "code": "Cx1", "caption": {"text": "Savons #handmade"}, "user": {"username": "savonnerie_leman"}}},
                            {"media": {"pk": "3102", "caption": null, "user": {"username": "no_caption"}}}
                        ]
                    }
                },
                {
                    "layout_type": "one_by_two_right",
                    "layout_content": {
                        "fill_items": [
                            {"media": {"pk": 3103, "caption": {"text": "DM for order"}, "user": {"username": "cakes_by_mia"}}}
                        ]
                    }
                }
            ],
            "more_available": false,
            "status": "ok"
        }))
        .unwrap();

        let posts = resp.into_posts();
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].id, "3101");
        assert_eq!(posts[0].code.as_deref(), Some("Cx1"));
        assert_eq!(posts[1].id, "3102");
        assert_eq!(posts[1].caption, "");
        assert_eq!(posts[2].username, "cakes_by_mia");
    }
}
