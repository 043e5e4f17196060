// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print layout engine. Tiles a finished identity photo onto a 6x4 in
// (1800x1200 px at 300 DPI) white sheet with thin cut guides around each copy.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use passwerk_core::{LayoutMode, PixelRect, SHEET_HEIGHT, SHEET_WIDTH};
use tracing::{debug, info, instrument};

use crate::compose::CanonicalPhoto;

/// Colour of the trimming guides.
pub const GUIDE_COLOR: Rgb<u8> = Rgb([180, 180, 180]);

const SHEET_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// An opaque 1800x1200 print sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintSheet(RgbImage);

impl PrintSheet {
    pub fn as_rgb(&self) -> &RgbImage {
        &self.0
    }

    pub fn into_rgb(self) -> RgbImage {
        self.0
    }
}

/// Fixed geometry of a grid layout.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPlan {
    pub rows: u32,
    pub cols: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Spacing between neighbouring tiles, in pixels.
    pub gap: u32,
    /// Tile rectangles in row-major order.
    pub tiles: Vec<PixelRect>,
}

impl GridPlan {
    /// The 1-px ring drawn just outside each tile.
    pub fn guide_rects(&self) -> Vec<PixelRect> {
        self.tiles
            .iter()
            .map(|t| PixelRect::new(t.x - 1, t.y - 1, t.width + 2, t.height + 2))
            .collect()
    }
}

/// Tile size `(width, height)` and gap for each grid mode. All tiles are 3:4.
fn tile_geometry(mode: LayoutMode) -> Option<(u32, u32, u32)> {
    match mode {
        LayoutMode::Single => None,
        LayoutMode::Grid2x2 => Some((420, 560, 40)),
        LayoutMode::Grid4x2 => Some((390, 520, 30)),
    }
}

/// Compute tile positions for `mode`, with the whole grid centred on the
/// sheet. Returns `None` for [`LayoutMode::Single`].
pub fn plan_grid(mode: LayoutMode) -> Option<GridPlan> {
    let (rows, cols) = mode.grid()?;
    let (tile_width, tile_height, gap) = tile_geometry(mode)?;

    let grid_w = cols * tile_width + (cols - 1) * gap;
    let grid_h = rows * tile_height + (rows - 1) * gap;
    let origin_x = (SHEET_WIDTH.saturating_sub(grid_w) / 2) as i64;
    let origin_y = (SHEET_HEIGHT.saturating_sub(grid_h) / 2) as i64;

    let mut tiles = Vec::with_capacity((rows * cols) as usize);
    for row in 0..rows {
        for col in 0..cols {
            tiles.push(PixelRect::new(
                origin_x + (col * (tile_width + gap)) as i64,
                origin_y + (row * (tile_height + gap)) as i64,
                tile_width,
                tile_height,
            ));
        }
    }

    Some(GridPlan {
        rows,
        cols,
        tile_width,
        tile_height,
        gap,
        tiles,
    })
}

/// Tile `photo` onto a print sheet. Returns `None` for
/// [`LayoutMode::Single`], which needs no sheet.
#[instrument(skip(photo))]
pub fn render_sheet(photo: &CanonicalPhoto, mode: LayoutMode) -> Option<PrintSheet> {
    let plan = plan_grid(mode)?;
    info!(
        rows = plan.rows,
        cols = plan.cols,
        tile_width = plan.tile_width,
        tile_height = plan.tile_height,
        "Rendering print sheet"
    );

    let tile = imageops::resize(
        photo.as_rgb(),
        plan.tile_width,
        plan.tile_height,
        FilterType::Lanczos3,
    );

    let mut sheet = RgbImage::from_pixel(SHEET_WIDTH, SHEET_HEIGHT, SHEET_BACKGROUND);
    for cell in &plan.tiles {
        imageops::replace(&mut sheet, &tile, cell.x, cell.y);
    }
    for guide in plan.guide_rects() {
        let rect = Rect::at(guide.x as i32, guide.y as i32).of_size(guide.width, guide.height);
        draw_hollow_rect_mut(&mut sheet, rect, GUIDE_COLOR);
    }

    debug!(copies = plan.tiles.len(), "Print sheet complete");
    Some(PrintSheet(sheet))
}

/// Arrange `photo` for output: the photo itself for single mode, otherwise a
/// print sheet.
pub fn arrange(photo: CanonicalPhoto, mode: LayoutMode) -> RgbImage {
    match render_sheet(&photo, mode) {
        Some(sheet) => sheet.into_rgb(),
        None => photo.into_rgb(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passwerk_core::{BackgroundColor, CANVAS_HEIGHT, CANVAS_WIDTH};

    const GRID_MODES: [LayoutMode; 2] = [LayoutMode::Grid2x2, LayoutMode::Grid4x2];

    #[test]
    fn tiles_never_overlap_and_stay_on_sheet() {
        for mode in GRID_MODES {
            let plan = plan_grid(mode).unwrap();
            assert_eq!(plan.tiles.len() as u32, mode.copies());
            for (i, a) in plan.tiles.iter().enumerate() {
                assert!(a.is_within(SHEET_WIDTH, SHEET_HEIGHT), "{mode:?} tile {i}");
                for b in &plan.tiles[i + 1..] {
                    assert!(!a.intersects(b), "{mode:?}: {a:?} overlaps {b:?}");
                }
            }
        }
    }

    #[test]
    fn guides_stay_off_photo_content() {
        for mode in GRID_MODES {
            let plan = plan_grid(mode).unwrap();
            for guide in plan.guide_rects() {
                assert!(guide.is_within(SHEET_WIDTH, SHEET_HEIGHT));
                // The ring's edges lie outside every tile.
                let edges = [
                    PixelRect::new(guide.x, guide.y, guide.width, 1),
                    PixelRect::new(guide.x, guide.bottom() - 1, guide.width, 1),
                    PixelRect::new(guide.x, guide.y, 1, guide.height),
                    PixelRect::new(guide.right() - 1, guide.y, 1, guide.height),
                ];
                for edge in edges {
                    assert!(plan.tiles.iter().all(|t| !t.intersects(&edge)));
                }
            }
        }
    }

    #[test]
    fn tiles_keep_three_by_four_aspect() {
        for mode in GRID_MODES {
            let plan = plan_grid(mode).unwrap();
            assert_eq!(plan.tile_width * 4, plan.tile_height * 3);
        }
    }

    #[test]
    fn grid_is_centred() {
        for mode in GRID_MODES {
            let plan = plan_grid(mode).unwrap();
            let first = plan.tiles.first().unwrap();
            let last = plan.tiles.last().unwrap();
            let left = first.x;
            let right = SHEET_WIDTH as i64 - last.right();
            let top = first.y;
            let bottom = SHEET_HEIGHT as i64 - last.bottom();
            assert!((left - right).abs() <= 1, "{mode:?}");
            assert!((top - bottom).abs() <= 1, "{mode:?}");
        }
    }

    #[test]
    fn single_mode_returns_photo_unchanged() {
        let photo = CanonicalPhoto::blank(BackgroundColor::Pink);
        assert!(render_sheet(&photo, LayoutMode::Single).is_none());
        let out = arrange(photo.clone(), LayoutMode::Single);
        assert_eq!(out.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
        assert_eq!(&out, photo.as_rgb());
    }

    #[test]
    fn sheet_has_tiles_guides_and_white_margin() {
        let photo = CanonicalPhoto::blank(BackgroundColor::Blue);
        let sheet = render_sheet(&photo, LayoutMode::Grid4x2).unwrap();
        let img = sheet.as_rgb();
        assert_eq!(img.dimensions(), (SHEET_WIDTH, SHEET_HEIGHT));

        let plan = plan_grid(LayoutMode::Grid4x2).unwrap();
        let tile = plan.tiles[0];
        assert_eq!(*img.get_pixel(0, 0), SHEET_BACKGROUND);
        assert_eq!(
            *img.get_pixel(tile.x as u32 + 10, tile.y as u32 + 10),
            Rgb(BackgroundColor::Blue.rgb())
        );
        assert_eq!(*img.get_pixel(tile.x as u32 - 1, tile.y as u32 + 10), GUIDE_COLOR);
        assert_eq!(
            *img.get_pixel(tile.right() as u32, tile.bottom() as u32),
            GUIDE_COLOR
        );
        // Tile's own border pixel is photo content, not guide.
        assert_eq!(
            *img.get_pixel(tile.x as u32, tile.y as u32),
            Rgb(BackgroundColor::Blue.rgb())
        );
    }
}
