use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

const RELATION_TAGS_KEY: &str = "relation_tags";

/// A contact as read from disk, before ids and positions are settled.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub(super) struct RawContact {
    #[serde(default)]
    pub(super) id: Option<String>,
    #[serde(default)]
    pub(super) name: Option<String>,
    #[serde(default)]
    pub(super) email: Option<String>,
    #[serde(default)]
    pub(super) phone: Option<String>,
    #[serde(default)]
    pub(super) tags: Vec<String>,
    #[serde(default)]
    pub(super) position: Option<[f32; 3]>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPerson {
    #[serde(default)]
    resource_name: Option<String>,
    #[serde(default)]
    names: Vec<RawName>,
    #[serde(default)]
    email_addresses: Vec<RawValue>,
    #[serde(default)]
    phone_numbers: Vec<RawValue>,
    #[serde(default)]
    user_defined: Vec<RawUserDefined>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawName {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawValue {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUserDefined {
    #[serde(default)]
    key: String,
    #[serde(default)]
    value: String,
}

impl From<RawPerson> for RawContact {
    fn from(person: RawPerson) -> Self {
        let tags = person
            .user_defined
            .iter()
            .filter(|field| field.key == RELATION_TAGS_KEY)
            .flat_map(|field| field.value.split(','))
            .map(str::to_owned)
            .collect();

        Self {
            id: person.resource_name,
            name: person
                .names
                .into_iter()
                .find_map(|name| name.display_name),
            email: person
                .email_addresses
                .into_iter()
                .find_map(|entry| entry.value),
            phone: person
                .phone_numbers
                .into_iter()
                .find_map(|entry| entry.value),
            tags,
            position: None,
        }
    }
}

/// Reads either `{"contacts": [..]}`, a bare contact array, or a People API
/// `{"connections": [..]}` export whose labels live in `relation_tags`.
pub(super) fn parse_contacts(raw: &str) -> Result<Vec<RawContact>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in contacts file")?;

    if parsed.is_array() {
        return Vec::<RawContact>::deserialize(parsed).context("invalid contact list");
    }

    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("unexpected JSON type in contacts file"))?;

    if let Some(contacts) = object.get("contacts") {
        return Vec::<RawContact>::deserialize(contacts).context("invalid \"contacts\" list");
    }

    if let Some(connections) = object.get("connections") {
        let people = Vec::<RawPerson>::deserialize(connections)
            .context("invalid \"connections\" list")?;
        return Ok(people.into_iter().map(RawContact::from).collect());
    }

    if object.is_empty() {
        return Ok(Vec::new());
    }

    Err(anyhow!(
        "contacts file has neither a \"contacts\" nor a \"connections\" list"
    ))
}

/// Trims, drops blanks, and removes repeats while keeping first-seen order.
pub(super) fn normalize_tags(tags: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || normalized.iter().any(|seen| seen == tag) {
            continue;
        }
        normalized.push(tag.to_owned());
    }
    normalized
}
