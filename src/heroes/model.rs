//! Superhero aggregate types shared by the engine, the HTTP surface and the client SDK.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::db::entities::{hero_image, superhero};
use crate::error::{Result, ServerError};

pub type HeroId = String;
pub type ImageId = i64;

/// A field of a partial update: either left out of the request or given a value.
///
/// Deserializes from the bare value, so `null` is rejected instead of being
/// folded into "absent". Use with `#[serde(default)]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Absent,
    Present(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Patch::Absent => None,
            Patch::Present(value) => Some(value),
        }
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Patch::Present(value)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Patch::Absent => serializer.serialize_none(),
            Patch::Present(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        T::deserialize(deserializer).map(Patch::Present)
    }
}

/// Superhero scalar fields as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Superhero {
    pub id: HeroId,
    pub nickname: String,
    pub real_name: String,
    pub origin_description: String,
    pub superpowers: Vec<String>,
    pub catch_phrase: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-visible image reference (identity stays server-side)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperheroWithImages {
    #[serde(flatten)]
    pub hero: Superhero,
    pub images: Vec<ImageRef>,
}

impl SuperheroWithImages {
    pub fn id(&self) -> &str {
        &self.hero.id
    }

    pub fn image_urls(&self) -> Vec<&str> {
        self.images.iter().map(|i| i.url.as_str()).collect()
    }
}

/// POST /superheroes request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSuperhero {
    pub nickname: String,
    pub real_name: String,
    pub origin_description: String,
    pub superpowers: Vec<String>,
    pub catch_phrase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

/// Scalar field changes of a partial update
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChanges {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub nickname: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub real_name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub origin_description: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub superpowers: Patch<Vec<String>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub catch_phrase: Patch<String>,
}

impl FieldChanges {
    pub fn is_empty(&self) -> bool {
        self.nickname.is_absent()
            && self.real_name.is_absent()
            && self.origin_description.is_absent()
            && self.superpowers.is_absent()
            && self.catch_phrase.is_absent()
    }
}

/// PATCH /superheroes/:id request body
///
/// `images` absent leaves the image set alone; `images: []` removes every image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuperheroPatch {
    #[serde(flatten)]
    pub fields: FieldChanges,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub images: Patch<Vec<String>>,
}

/// Query params for GET /superheroes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Image row as the engine sees it: identity plus url
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub id: ImageId,
    pub url: String,
}

/// A superhero with its images (most recent first), as loaded from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroRecord {
    pub hero: Superhero,
    pub images: Vec<StoredImage>,
}

impl HeroRecord {
    pub fn from_models(hero: superhero::Model, images: Vec<hero_image::Model>) -> Result<Self> {
        Ok(Self {
            hero: Superhero::try_from(hero)?,
            images: images
                .into_iter()
                .map(|img| StoredImage { id: img.id, url: img.url })
                .collect(),
        })
    }

    pub fn into_view(self) -> SuperheroWithImages {
        SuperheroWithImages {
            hero: self.hero,
            images: self.images.into_iter().map(|img| ImageRef { url: img.url }).collect(),
        }
    }
}

impl TryFrom<superhero::Model> for Superhero {
    type Error = ServerError;

    fn try_from(model: superhero::Model) -> Result<Self> {
        Ok(Self {
            superpowers: decode_superpowers(&model.id, &model.superpowers)?,
            created_at: from_millis(&model.id, model.created_at)?,
            updated_at: from_millis(&model.id, model.updated_at)?,
            id: model.id,
            nickname: model.nickname,
            real_name: model.real_name,
            origin_description: model.origin_description,
            catch_phrase: model.catch_phrase,
        })
    }
}

pub(crate) fn encode_superpowers(powers: &[String]) -> Result<String> {
    serde_json::to_string(powers)
        .map_err(|e| ServerError::Internal(format!("cannot encode superpowers: {}", e)))
}

fn decode_superpowers(id: &str, raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| ServerError::Internal(format!("corrupt superpowers for {}: {}", id, e)))
}

fn from_millis(id: &str, millis: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| ServerError::Internal(format!("corrupt timestamp {} for {}", millis, id)))
}

/// Current time truncated to what the store keeps (milliseconds)
pub(crate) fn now_millis() -> DateTime<Utc> {
    let now = Utc::now().timestamp_millis();
    DateTime::<Utc>::from_timestamp_millis(now).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_distinguishes_absent_from_empty() {
        let absent: SuperheroPatch = serde_json::from_value(json!({ "nickname": "Kal-El" })).unwrap();
        assert_eq!(absent.fields.nickname, Patch::Present("Kal-El".to_string()));
        assert!(absent.images.is_absent());

        let empty: SuperheroPatch = serde_json::from_value(json!({ "images": [] })).unwrap();
        assert_eq!(empty.images, Patch::Present(vec![]));
        assert!(empty.fields.is_empty());
    }

    #[test]
    fn test_patch_rejects_null() {
        let result = serde_json::from_value::<SuperheroPatch>(json!({ "images": null }));
        assert!(result.is_err());

        let result = serde_json::from_value::<SuperheroPatch>(json!({ "nickname": null }));
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let patch = SuperheroPatch {
            fields: FieldChanges {
                catch_phrase: "Up, up and away!".to_string().into(),
                ..Default::default()
            },
            images: Patch::Present(vec![]),
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, json!({ "catchPhrase": "Up, up and away!", "images": [] }));
    }

    #[test]
    fn test_view_wire_shape() {
        let at = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();
        let view = SuperheroWithImages {
            hero: Superhero {
                id: "hero-1".into(),
                nickname: "Superman".into(),
                real_name: "Clark Kent".into(),
                origin_description: "He came from Krypton.".into(),
                superpowers: vec!["Flight".into()],
                catch_phrase: "Up, up and away!".into(),
                created_at: at,
                updated_at: at,
            },
            images: vec![ImageRef { url: "http://example.com/s.jpg".into() }],
        };
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["realName"], "Clark Kent");
        assert_eq!(value["images"][0]["url"], "http://example.com/s.jpg");
        assert_eq!(value["createdAt"], "2023-11-14T22:13:20Z");

        let back: SuperheroWithImages = serde_json::from_value(value).unwrap();
        assert_eq!(back, view);
    }

    #[test]
    fn test_corrupt_superpowers_is_reported() {
        let model = superhero::Model {
            id: "h".into(),
            nickname: "n".into(),
            real_name: "r".into(),
            origin_description: "o".into(),
            superpowers: "not json".into(),
            catch_phrase: "c".into(),
            created_at: 0,
            updated_at: 0,
        };
        assert!(matches!(Superhero::try_from(model), Err(ServerError::Internal(_))));
    }
}
