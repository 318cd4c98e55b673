// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Step through a re-split output tree one image at a time and render the
//! bounding boxes of each image.

use crate::{
    Error,
    coco::{CocoAnnotation, CocoDataset, CocoImage, CocoIndex, CocoReader},
    layout::{Split, output_annotations_in},
    resplit::split_rng,
};
use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut},
    rect::Rect,
};
use rand::Rng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const BOX_THICKNESS: u32 = 2;
const TAB_WIDTH: u32 = 12;
const TAB_HEIGHT: u32 = 8;
const FALLBACK_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// One key press of the interactive browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseCommand {
    Next,
    Previous,
    Switch(Split),
    Quit,
}

impl FromStr for BrowseCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "n" => Ok(BrowseCommand::Next),
            "p" => Ok(BrowseCommand::Previous),
            "t" => Ok(BrowseCommand::Switch(Split::Train)),
            "v" => Ok(BrowseCommand::Switch(Split::Val)),
            "q" => Ok(BrowseCommand::Quit),
            other => Err(format!("unknown key '{}', expected n, p, t, v or q", other)),
        }
    }
}

/// The image under the cursor.
#[derive(Debug, Clone)]
pub struct View<'a> {
    pub split: Split,
    /// Zero-based position within the split.
    pub position: usize,
    pub total: usize,
    pub image: &'a CocoImage,
    pub annotations: &'a [CocoAnnotation],
    /// Category name of each entry of `annotations`, in the same order.
    pub labels: Vec<String>,
    pub path: PathBuf,
}

impl View<'_> {
    pub fn status(&self) -> String {
        format!(
            "Set: {} | Image: {}/{} | ID: {}",
            self.split,
            self.position + 1,
            self.total,
            self.image.id()
        )
    }

    /// One line per annotation: its label and box.
    pub fn annotation_lines(&self) -> Vec<String> {
        self.annotations
            .iter()
            .zip(&self.labels)
            .map(|(ann, label)| match ann.bbox() {
                Some([x, y, w, h]) => {
                    format!("{} [{:.1}, {:.1}, {:.1}, {:.1}]", label, x, y, w, h)
                }
                None => format!("{} (no bbox)", label),
            })
            .collect()
    }
}

/// Display name for an annotation's category.
fn label_for(index: &CocoIndex, ann: &CocoAnnotation) -> String {
    match ann.category_id() {
        Some(id) => index
            .label_name(id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("category {}", id)),
        None => "unlabeled".to_string(),
    }
}

struct SplitData {
    index: CocoIndex,
    /// Image ids in file order.
    order: Vec<u64>,
    images_dir: PathBuf,
}

impl SplitData {
    fn new(dataset: &CocoDataset, images_dir: PathBuf) -> Self {
        Self {
            index: CocoIndex::from_dataset(dataset),
            order: dataset.images.iter().map(|img| img.id()).collect(),
            images_dir,
        }
    }
}

/// Navigation state over both splits of an output tree.
pub struct Browser {
    train: SplitData,
    val: SplitData,
    split: Split,
    position: usize,
    colors: HashMap<u64, Rgb<u8>>,
}

impl Browser {
    /// Load both split files under `output_root`.
    ///
    /// Every category gets a random colour; `seed` fixes the palette.
    pub fn open(output_root: &Path, seed: Option<u64>) -> Result<Self, Error> {
        let reader = CocoReader::new();
        let train = reader.read_json(output_annotations_in(output_root, Split::Train))?;
        let val = reader.read_json(output_annotations_in(output_root, Split::Val))?;

        let mut category_ids: Vec<u64> = train
            .categories()
            .iter()
            .chain(val.categories())
            .filter_map(|c| c.id())
            .collect();
        category_ids.sort_unstable();
        category_ids.dedup();

        let mut rng = split_rng(seed);
        let colors = category_ids
            .into_iter()
            .map(|id| {
                let color = Rgb([
                    rng.gen_range(0..=255u8),
                    rng.gen_range(0..=255u8),
                    rng.gen_range(0..=255u8),
                ]);
                (id, color)
            })
            .collect();

        let images_dir = |split: Split| output_root.join("images").join(split.as_str());
        log::debug!(
            "Browsing {} train and {} val images",
            train.images.len(),
            val.images.len()
        );

        Ok(Self {
            train: SplitData::new(&train, images_dir(Split::Train)),
            val: SplitData::new(&val, images_dir(Split::Val)),
            split: Split::Train,
            position: 0,
            colors,
        })
    }

    fn data(&self) -> &SplitData {
        match self.split {
            Split::Train => &self.train,
            Split::Val => &self.val,
        }
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn len(&self) -> usize {
        self.data().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn next(&mut self) {
        if !self.is_empty() {
            self.position = (self.position + 1) % self.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.is_empty() {
            self.position = (self.position + self.len() - 1) % self.len();
        }
    }

    /// Move to `split`, back at its first image.
    pub fn switch(&mut self, split: Split) {
        self.split = split;
        self.position = 0;
    }

    /// Apply a key press. Returns false on quit.
    pub fn apply(&mut self, command: BrowseCommand) -> bool {
        match command {
            BrowseCommand::Next => self.next(),
            BrowseCommand::Previous => self.previous(),
            BrowseCommand::Switch(split) => self.switch(split),
            BrowseCommand::Quit => return false,
        }
        true
    }

    /// The image at the cursor, or `None` when the split is empty.
    pub fn current(&self) -> Option<View<'_>> {
        let data = self.data();
        let id = data.order.get(self.position)?;
        let image = data.index.images.get(id)?;
        let annotations = data.index.annotations_for_image(*id);
        Some(View {
            split: self.split,
            position: self.position,
            total: data.order.len(),
            image,
            annotations,
            labels: annotations
                .iter()
                .map(|ann| label_for(&data.index, ann))
                .collect(),
            path: data.images_dir.join(image.file_name()),
        })
    }

    pub fn color(&self, category_id: Option<u64>) -> Rgb<u8> {
        category_id
            .and_then(|id| self.colors.get(&id))
            .copied()
            .unwrap_or(FALLBACK_COLOR)
    }

    /// Decode the image of `view` and draw its annotations.
    pub fn render(&self, view: &View<'_>) -> Result<RgbImage, Error> {
        let mut canvas = image::open(&view.path)?.to_rgb8();
        for ann in view.annotations {
            if let Some(bbox) = ann.bbox() {
                draw_annotation(&mut canvas, &bbox, self.color(ann.category_id()));
            }
        }
        Ok(canvas)
    }
}

/// Hollow box of [`BOX_THICKNESS`] plus a filled tab above its top-left
/// corner. The tab moves inside the box when there is no room above.
pub fn draw_annotation(canvas: &mut RgbImage, bbox: &[f64; 4], color: Rgb<u8>) {
    let x = bbox[0].round() as i32;
    let y = bbox[1].round() as i32;
    let width = (bbox[2].round() as u32).max(1);
    let height = (bbox[3].round() as u32).max(1);

    for inset in 0..BOX_THICKNESS {
        let w = width.saturating_sub(2 * inset);
        let h = height.saturating_sub(2 * inset);
        if w == 0 || h == 0 {
            break;
        }
        let offset = inset as i32;
        draw_hollow_rect_mut(canvas, Rect::at(x + offset, y + offset).of_size(w, h), color);
    }

    let tab_y = if y >= TAB_HEIGHT as i32 {
        y - TAB_HEIGHT as i32
    } else {
        y
    };
    draw_filled_rect_mut(
        canvas,
        Rect::at(x, tab_y).of_size(TAB_WIDTH, TAB_HEIGHT),
        color,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coco::CocoCategory;

    #[test]
    fn test_parse_commands() {
        assert_eq!("n".parse(), Ok(BrowseCommand::Next));
        assert_eq!(" p\n".parse(), Ok(BrowseCommand::Previous));
        assert_eq!("v".parse(), Ok(BrowseCommand::Switch(Split::Val)));
        assert_eq!("q".parse(), Ok(BrowseCommand::Quit));
        assert!("x".parse::<BrowseCommand>().is_err());
    }

    #[test]
    fn test_labels_follow_annotations() {
        let dataset = CocoDataset {
            categories: Some(vec![
                CocoCategory::new(1, "text"),
                CocoCategory::new(4, "table"),
            ]),
            images: vec![CocoImage::new(7, "a.jpg")],
            annotations: vec![
                CocoAnnotation::new(1, 7)
                    .with_field("category_id", 4)
                    .with_field("bbox", vec![1.0, 2.0, 3.0, 4.0]),
                CocoAnnotation::new(2, 7).with_field("category_id", 1),
                CocoAnnotation::new(3, 7).with_field("category_id", 9),
                CocoAnnotation::new(4, 7),
            ],
            ..Default::default()
        };
        let index = CocoIndex::from_dataset(&dataset);
        let annotations = index.annotations_for_image(7);
        let view = View {
            split: Split::Train,
            position: 0,
            total: 1,
            image: &dataset.images[0],
            annotations,
            labels: annotations.iter().map(|a| label_for(&index, a)).collect(),
            path: PathBuf::from("a.jpg"),
        };

        assert_eq!(view.labels, vec!["table", "text", "category 9", "unlabeled"]);
        assert_eq!(view.annotation_lines()[0], "table [1.0, 2.0, 3.0, 4.0]");
        assert_eq!(view.annotation_lines()[1], "text (no bbox)");
    }

    #[test]
    fn test_draw_annotation_outline_and_tab() {
        let mut canvas = RgbImage::new(40, 40);
        let red = Rgb([255, 0, 0]);
        draw_annotation(&mut canvas, &[10.0, 20.0, 10.0, 10.0], red);

        // outer and inner outline
        assert_eq!(*canvas.get_pixel(10, 25), red);
        assert_eq!(*canvas.get_pixel(11, 25), red);
        // interior untouched
        assert_eq!(*canvas.get_pixel(14, 25), Rgb([0, 0, 0]));
        // tab above the corner
        assert_eq!(*canvas.get_pixel(12, 14), red);
    }

    #[test]
    fn test_draw_annotation_tab_at_top_edge() {
        let mut canvas = RgbImage::new(20, 20);
        let blue = Rgb([0, 0, 255]);
        draw_annotation(&mut canvas, &[0.0, 0.0, 0.2, 0.0], blue);
        assert_eq!(*canvas.get_pixel(5, 5), blue);
    }
}
