use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::entity::Entity;

pub const LABEL_PALETTE: [Rgb; 12] = [
    Rgb::new(0x3b, 0x82, 0xf6),
    Rgb::new(0x10, 0xb9, 0x81),
    Rgb::new(0x8b, 0x5c, 0xf6),
    Rgb::new(0xf5, 0x9e, 0x0b),
    Rgb::new(0xef, 0x44, 0x44),
    Rgb::new(0x06, 0xb6, 0xd4),
    Rgb::new(0xf9, 0x73, 0x16),
    Rgb::new(0x84, 0xcc, 0x16),
    Rgb::new(0xec, 0x48, 0x99),
    Rgb::new(0x6b, 0x72, 0x80),
    Rgb::new(0x14, 0xb8, 0xa6),
    Rgb::new(0xf4, 0x72, 0xb6),
];

/// Colour used for entities whose first label is unknown to the registry.
pub const UNLABELLED_COLOR: Rgb = Rgb::new(0x64, 0x74, 0x8b);

/// An sRGB colour. Ordered so it can key deterministic maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseColorError(String);

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid hex colour {:?}", self.0)
    }
}

impl std::error::Error for ParseColorError {}

impl FromStr for Rgb {
    type Err = ParseColorError;

    /// Accepts `#rrggbb` and the short `#rgb` form; the leading `#` is optional.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let hex = raw.trim().trim_start_matches('#');
        let invalid = || ParseColorError(raw.to_owned());
        if !hex.is_ascii() {
            return Err(invalid());
        }

        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        match hex.len() {
            6 => Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let expand = |digit: &str| channel(digit).map(|value| value * 17);
                Ok(Self::new(
                    expand(&hex[0..1])?,
                    expand(&hex[1..2])?,
                    expand(&hex[2..3])?,
                ))
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub color: Rgb,
    pub visible: bool,
    /// Number of entities carrying the label. Informational only.
    pub count: usize,
}

/// Persisted per-label user choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSettings {
    pub color: Rgb,
    pub visible: bool,
}

pub type SavedLabelSettings = BTreeMap<String, LabelSettings>;

/// Labels keyed by unique name, kept in insertion order.
#[derive(Clone, Debug, Default)]
pub struct LabelRegistry {
    labels: Vec<Label>,
    index_by_name: HashMap<String, usize>,
}

impl LabelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, label: Label) {
        self.index_by_name
            .insert(label.name.clone(), self.labels.len());
        self.labels.push(label);
    }

    fn reindex(&mut self) {
        self.index_by_name.clear();
        for (index, label) in self.labels.iter().enumerate() {
            self.index_by_name.insert(label.name.clone(), index);
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Label> {
        self.index_by_name
            .get(name)
            .and_then(|&index| self.labels.get(index))
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Label> {
        let index = *self.index_by_name.get(name)?;
        self.labels.get_mut(index)
    }

    /// Unknown names are never visible.
    pub fn is_visible(&self, name: &str) -> bool {
        self.get(name).is_some_and(|label| label.visible)
    }

    pub fn color_of(&self, name: &str) -> Option<Rgb> {
        self.get(name).map(|label| label.color)
    }

    pub fn visible_count(&self) -> usize {
        self.labels.iter().filter(|label| label.visible).count()
    }

    /// Flips visibility; returns the new state, or `None` for an unknown name.
    pub fn toggle(&mut self, name: &str) -> Option<bool> {
        let label = self.get_mut(name)?;
        label.visible = !label.visible;
        Some(label.visible)
    }

    pub fn set_visible(&mut self, name: &str, visible: bool) -> bool {
        match self.get_mut(name) {
            Some(label) => {
                label.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn set_color(&mut self, name: &str, color: Rgb) -> bool {
        match self.get_mut(name) {
            Some(label) => {
                label.color = color;
                true
            }
            None => false,
        }
    }

    /// Adds a visible, unused label. Blank and already-taken names are rejected.
    pub fn add(&mut self, name: &str, color: Rgb) -> bool {
        let name = name.trim();
        if name.is_empty() || self.index_by_name.contains_key(name) {
            return false;
        }

        self.push(Label {
            name: name.to_owned(),
            color,
            visible: true,
            count: 0,
        });
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<Label> {
        let index = self.index_by_name.remove(name)?;
        let removed = self.labels.remove(index);
        self.reindex();
        Some(removed)
    }

    /// Rebuilds the label list from the labels the entities actually carry, in
    /// first-seen order. Saved colour/visibility wins; otherwise labels get the
    /// next palette colour and start visible.
    pub fn refresh_from_entities(&mut self, entities: &[Entity], saved: &SavedLabelSettings) {
        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entity in entities {
            for name in &entity.labels {
                let count = counts.entry(name.as_str()).or_insert_with(|| {
                    order.push(name.as_str());
                    0
                });
                *count += 1;
            }
        }

        let labels = order
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let fallback = LABEL_PALETTE[index % LABEL_PALETTE.len()];
                let saved = saved.get(*name);
                Label {
                    name: (*name).to_owned(),
                    color: saved.map_or(fallback, |settings| settings.color),
                    visible: saved.is_none_or(|settings| settings.visible),
                    count: counts.get(name).copied().unwrap_or(0),
                }
            })
            .collect::<Vec<_>>();

        self.labels = labels;
        self.reindex();
    }

    pub fn settings(&self) -> SavedLabelSettings {
        self.labels
            .iter()
            .map(|label| {
                (
                    label.name.clone(),
                    LabelSettings {
                        color: label.color,
                        visible: label.visible,
                    },
                )
            })
            .collect()
    }
}
