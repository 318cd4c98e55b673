// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! COCO JSON data structures for serde serialization/deserialization.
//!
//! Every record keeps the JSON object it was read from, in source key order,
//! and serializes back to exactly that object. Only the keys the pipeline
//! depends on are checked when reading: `id` and `file_name` on images,
//! `image_id` on annotations. Everything else (width, bbox, segmentation,
//! category ids, ...) is reachable through fallible accessors and otherwise
//! left alone.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Top-level COCO dataset structure.
///
/// This is the root structure for files like `instances_train.json`. The
/// shared sections are carried as read: an absent key stays absent and an
/// explicit `null` stays `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CocoDataset {
    /// Dataset metadata.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub info: Option<Value>,
    /// License information for the images.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub licenses: Option<Value>,
    /// List of object categories/classes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CocoCategory>>,
    /// List of images in the dataset.
    #[serde(default)]
    pub images: Vec<CocoImage>,
    /// List of annotations (one per object instance).
    #[serde(default)]
    pub annotations: Vec<CocoAnnotation>,
}

/// Distinguishes an explicit `null` from an absent key.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl CocoDataset {
    /// Builds a dataset sharing this one's `info`, `licenses` and
    /// `categories` but holding the given records.
    pub fn with_records(&self, images: Vec<CocoImage>, annotations: Vec<CocoAnnotation>) -> Self {
        Self {
            info: self.info.clone(),
            licenses: self.licenses.clone(),
            categories: self.categories.clone(),
            images,
            annotations,
        }
    }

    /// Category list, empty when the file has none.
    pub fn categories(&self) -> &[CocoCategory] {
        self.categories.as_deref().unwrap_or(&[])
    }

    /// Category names in file order. Categories without a name are skipped.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories().iter().filter_map(|c| c.name()).collect()
    }
}

fn required_u64(fields: &Map<String, Value>, key: &str) -> Result<u64, String> {
    match fields.get(key) {
        None => Err(format!("missing field `{}`", key)),
        Some(value) => value
            .as_u64()
            .ok_or_else(|| format!("field `{}` must be a non-negative integer, got {}", key, value)),
    }
}

fn record(pairs: impl IntoIterator<Item = (&'static str, Value)>) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Image metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CocoImage {
    id: u64,
    file_name: String,
    fields: Map<String, Value>,
}

impl CocoImage {
    pub fn new(id: u64, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        Self {
            id,
            fields: record([("id", id.into()), ("file_name", file_name.clone().into())]),
            file_name,
        }
    }

    /// Adds or replaces a passthrough key. `id` and `file_name` are ignored.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        if key != "id" && key != "file_name" {
            self.fields.insert(key.to_string(), value.into());
        }
        self
    }

    /// Unique image ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Filename (relative path within the images folder).
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn width(&self) -> Option<u64> {
        self.fields.get("width").and_then(Value::as_u64)
    }

    pub fn height(&self) -> Option<u64> {
        self.fields.get("height").and_then(Value::as_u64)
    }

    /// The record as read, in source key order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TryFrom<Map<String, Value>> for CocoImage {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = required_u64(&fields, "id")?;
        let file_name = match fields.get("file_name") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => return Err(format!("field `file_name` must be a string, got {}", other)),
            None => return Err("missing field `file_name`".to_string()),
        };
        Ok(Self {
            id,
            file_name,
            fields,
        })
    }
}

/// Annotation for a single object instance.
#[derive(Debug, Clone, PartialEq)]
pub struct CocoAnnotation {
    image_id: u64,
    fields: Map<String, Value>,
}

impl CocoAnnotation {
    pub fn new(id: u64, image_id: u64) -> Self {
        Self {
            image_id,
            fields: record([("id", id.into()), ("image_id", image_id.into())]),
        }
    }

    /// Adds or replaces a passthrough key. `image_id` is ignored.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        if key != "image_id" {
            self.fields.insert(key.to_string(), value.into());
        }
        self
    }

    /// ID of the image containing this object.
    pub fn image_id(&self) -> u64 {
        self.image_id
    }

    pub fn id(&self) -> Option<u64> {
        self.fields.get("id").and_then(Value::as_u64)
    }

    pub fn category_id(&self) -> Option<u64> {
        self.fields.get("category_id").and_then(Value::as_u64)
    }

    /// Bounding box `[x, y, width, height]` in pixels, if it is four numbers.
    pub fn bbox(&self) -> Option<[f64; 4]> {
        match self.fields.get("bbox")?.as_array()?.as_slice() {
            [x, y, w, h] => Some([x.as_f64()?, y.as_f64()?, w.as_f64()?, h.as_f64()?]),
            _ => None,
        }
    }

    /// The record as read, in source key order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TryFrom<Map<String, Value>> for CocoAnnotation {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let image_id = required_u64(&fields, "image_id")?;
        Ok(Self { image_id, fields })
    }
}

/// Category definition, shared unchanged across every output file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CocoCategory {
    fields: Map<String, Value>,
}

impl CocoCategory {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            fields: record([("id", id.into()), ("name", Value::String(name.into()))]),
        }
    }

    pub fn id(&self) -> Option<u64> {
        self.fields.get("id").and_then(Value::as_u64)
    }

    /// Category name (e.g., "text", "table").
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

macro_rules! raw_record_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.fields.serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let fields = Map::deserialize(deserializer)?;
                <$ty>::try_from(fields).map_err(serde::de::Error::custom)
            }
        }
    };
}

raw_record_serde!(CocoImage);
raw_record_serde!(CocoAnnotation);

/// Lookup tables for efficient COCO data access.
///
/// Builds indexes from a `CocoDataset` for O(1) lookups.
#[derive(Debug, Clone, Default)]
pub struct CocoIndex {
    /// `image_id` → `CocoImage`
    pub images: HashMap<u64, CocoImage>,
    /// `category_id` → `CocoCategory`, for categories that have an id
    pub categories: HashMap<u64, CocoCategory>,
    /// `image_id` → `Vec<CocoAnnotation>`
    pub annotations_by_image: HashMap<u64, Vec<CocoAnnotation>>,
}

impl CocoIndex {
    /// Build lookup index from a `CocoDataset`.
    pub fn from_dataset(dataset: &CocoDataset) -> Self {
        let images: HashMap<_, _> = dataset
            .images
            .iter()
            .map(|img| (img.id(), img.clone()))
            .collect();

        let categories: HashMap<_, _> = dataset
            .categories()
            .iter()
            .filter_map(|cat| cat.id().map(|id| (id, cat.clone())))
            .collect();

        let mut annotations_by_image: HashMap<u64, Vec<CocoAnnotation>> = HashMap::new();
        for ann in &dataset.annotations {
            annotations_by_image
                .entry(ann.image_id())
                .or_default()
                .push(ann.clone());
        }

        Self {
            images,
            categories,
            annotations_by_image,
        }
    }

    /// Get the label name for a category ID.
    pub fn label_name(&self, category_id: u64) -> Option<&str> {
        self.categories.get(&category_id).and_then(|c| c.name())
    }

    /// Get annotations for an image.
    pub fn annotations_for_image(&self, image_id: u64) -> &[CocoAnnotation] {
        self.annotations_by_image
            .get(&image_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
