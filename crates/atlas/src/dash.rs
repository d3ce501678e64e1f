use std::collections::HashMap;
use std::fmt;

use line_protocol::TextureHandle;

use crate::key::{DashKey, RowId};
use crate::layout::{DashPosition, LineAtlasConfig};

/// Signed distance stored for a texel sitting exactly on a dash edge.
const SDF_OFFSET: f32 = 128.0;
/// Half the number of extra rows a round-capped dash occupies.
const ROUND_CAP_HALF_ROWS: u32 = 7;

/// Source of dash pattern positions for SDF line rendering.
pub trait DashAtlas {
    /// Returns the atlas entry for `dasharray`, adding it if needed.
    ///
    /// `None` means the entry could not be added; callers skip the draw.
    fn get_dash(&mut self, dasharray: &[f32], round: bool) -> Option<DashPosition>;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn texture(&self) -> TextureHandle;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashAtlasError {
    EmptyDashArray,
    NonPositiveLength,
    OutOfRows { requested: u32, remaining: u32 },
}

impl fmt::Display for DashAtlasError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashAtlasError::EmptyDashArray => write!(formatter, "dash array has no segments"),
            DashAtlasError::NonPositiveLength => {
                write!(formatter, "dash array period must be positive")
            }
            DashAtlasError::OutOfRows {
                requested,
                remaining,
            } => write!(
                formatter,
                "line atlas out of space: requested {requested} rows, {remaining} remaining"
            ),
        }
    }
}

impl std::error::Error for DashAtlasError {}

/// Dash atlas that stacks one SDF row band per dash pattern.
#[derive(Debug)]
pub struct LineAtlas {
    config: LineAtlasConfig,
    texture: TextureHandle,
    rows: RowPool,
    data: Vec<u8>,
    dirty: bool,
    positions: HashMap<DashKey, DashPosition>,
}

impl LineAtlas {
    pub fn new(config: LineAtlasConfig, texture: TextureHandle) -> Self {
        assert!(
            config.width > 0 && config.height > 0,
            "line atlas size must be positive"
        );
        let texel_count = (config.width as usize)
            .checked_mul(config.height as usize)
            .expect("line atlas size overflow");
        Self {
            config,
            texture,
            rows: RowPool::new(config.height),
            data: vec![0; texel_count],
            dirty: true,
            positions: HashMap::new(),
        }
    }

    pub fn config(&self) -> LineAtlasConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Single-channel SDF texels, row-major, `width * height` bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the texel data if it changed since the last call.
    pub fn take_dirty_data(&mut self) -> Option<&[u8]> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(&self.data)
    }

    pub fn add_dash(
        &mut self,
        dasharray: &[f32],
        round: bool,
    ) -> Result<DashPosition, DashAtlasError> {
        if dasharray.is_empty() {
            return Err(DashAtlasError::EmptyDashArray);
        }
        let length: f32 = dasharray.iter().sum();
        if length.is_nan() || length <= 0.0 {
            return Err(DashAtlasError::NonPositiveLength);
        }

        let half_rows = if round { ROUND_CAP_HALF_ROWS } else { 0 };
        let band_height = 2 * half_rows + 1;
        let first_row = self.rows.alloc(band_height)?;
        let center_row = first_row.raw() + half_rows;

        self.rasterize_band(dasharray, length, round, center_row, half_rows);
        self.dirty = true;

        let atlas_height = self.config.height as f32;
        Ok(DashPosition {
            x: 0.0,
            y: (center_row as f32 + 0.5) / atlas_height,
            width: length,
            height: (2 * half_rows) as f32 / atlas_height,
        })
    }

    fn rasterize_band(
        &mut self,
        dasharray: &[f32],
        length: f32,
        round: bool,
        center_row: u32,
        half_rows: u32,
    ) {
        let width = self.config.width as usize;
        let stretch = self.config.width as f32 / length;
        let half_width = stretch / 2.0;
        // odd-length arrays start and end with a dash that join across the period
        let odd_length = dasharray.len() % 2 == 1;
        let last = dasharray[dasharray.len() - 1];
        let half_rows_i = half_rows as i32;

        for offset in -half_rows_i..=half_rows_i {
            let row = (center_row as i32 + offset) as usize;
            let row_start = row * width;
            let mut left = if odd_length { -last } else { 0.0 };
            let mut right = dasharray[0];
            let mut part_index = 1;

            for x in 0..width {
                let x_f = x as f32;
                while right < x_f / stretch && part_index < dasharray.len() {
                    left = right;
                    right += dasharray[part_index];
                    if odd_length && part_index == dasharray.len() - 1 {
                        right += dasharray[0];
                    }
                    part_index += 1;
                }

                let dist_left = (x_f - left * stretch).abs();
                let dist_right = (x_f - right * stretch).abs();
                let dist = dist_left.min(dist_right);
                let inside = part_index % 2 == 1;

                let signed_distance = if round {
                    let dist_middle = if half_rows > 0 {
                        offset as f32 / half_rows as f32 * (half_width + 1.0)
                    } else {
                        0.0
                    };
                    if inside {
                        let dist_edge = half_width - dist_middle.abs();
                        (dist * dist + dist_edge * dist_edge).sqrt()
                    } else {
                        half_width - (dist * dist + dist_middle * dist_middle).sqrt()
                    }
                } else if inside {
                    dist
                } else {
                    -dist
                };

                self.data[row_start + x] =
                    (signed_distance + SDF_OFFSET).clamp(0.0, 255.0) as u8;
            }
        }
    }
}

impl DashAtlas for LineAtlas {
    fn get_dash(&mut self, dasharray: &[f32], round: bool) -> Option<DashPosition> {
        let key = DashKey::new(dasharray, round);
        if let Some(position) = self.positions.get(&key) {
            return Some(*position);
        }
        match self.add_dash(dasharray, round) {
            Ok(position) => {
                self.positions.insert(key, position);
                Some(position)
            }
            Err(error) => {
                log::warn!(target: "atlas", "cannot add dash {dasharray:?}: {error}");
                None
            }
        }
    }

    fn width(&self) -> u32 {
        self.config.width
    }

    fn height(&self) -> u32 {
        self.config.height
    }

    fn texture(&self) -> TextureHandle {
        self.texture
    }
}

#[derive(Debug)]
struct RowPool {
    total_rows: u32,
    next_row: u32,
}

impl RowPool {
    const fn new(total_rows: u32) -> Self {
        Self {
            total_rows,
            next_row: 0,
        }
    }

    fn alloc(&mut self, count: u32) -> Result<RowId, DashAtlasError> {
        let remaining = self.total_rows - self.next_row;
        if count > remaining {
            return Err(DashAtlasError::OutOfRows {
                requested: count,
                remaining,
            });
        }
        let first = self.next_row;
        self.next_row = self.next_row.checked_add(count).expect("row id overflow");
        Ok(RowId::new(first))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atlas(height: u32) -> LineAtlas {
        LineAtlas::new(LineAtlasConfig::new(256, height), TextureHandle::default())
    }

    #[test]
    fn butt_dash_takes_a_single_row() {
        let mut atlas = atlas(512);
        let first = atlas.get_dash(&[1.0, 1.0], false).unwrap();
        let second = atlas.get_dash(&[3.0, 1.0], false).unwrap();
        assert_eq!(first.y, 0.5 / 512.0);
        assert_eq!(first.height, 0.0);
        assert_eq!(first.width, 2.0);
        assert_eq!(second.y, 1.5 / 512.0);
        assert_eq!(second.width, 4.0);
    }

    #[test]
    fn round_dash_takes_fifteen_rows_centered() {
        let mut atlas = atlas(512);
        let round = atlas.get_dash(&[2.0, 2.0], true).unwrap();
        assert_eq!(round.y, 7.5 / 512.0);
        assert_eq!(round.height, 14.0 / 512.0);
        let next = atlas.get_dash(&[2.0, 2.0], false).unwrap();
        assert_eq!(next.y, 15.5 / 512.0);
    }

    #[test]
    fn repeated_lookup_reuses_entry() {
        let mut atlas = atlas(512);
        let first = atlas.get_dash(&[5.0, 2.0], true).unwrap();
        let again = atlas.get_dash(&[5.0, 2.0], true).unwrap();
        assert_eq!(first, again);
        assert_eq!(atlas.len(), 1);
    }

    #[test]
    fn round_and_butt_entries_are_not_shared() {
        let mut atlas = atlas(512);
        let butt = atlas.get_dash(&[5.0, 2.0], false).unwrap();
        let round = atlas.get_dash(&[5.0, 2.0], true).unwrap();
        assert_ne!(butt.y, round.y);
        assert_eq!(atlas.len(), 2);
    }

    #[test]
    fn exhausted_atlas_returns_none() {
        let mut atlas = atlas(16);
        assert!(atlas.get_dash(&[1.0, 1.0], true).is_some());
        assert!(atlas.get_dash(&[2.0, 1.0], true).is_none());
        assert_eq!(
            atlas.add_dash(&[2.0, 1.0], true).unwrap_err(),
            DashAtlasError::OutOfRows {
                requested: 15,
                remaining: 1
            }
        );
        assert!(atlas.get_dash(&[2.0, 1.0], false).is_some());
    }

    #[test]
    fn empty_or_degenerate_dash_is_rejected() {
        let mut atlas = atlas(512);
        assert_eq!(
            atlas.add_dash(&[], false).unwrap_err(),
            DashAtlasError::EmptyDashArray
        );
        assert_eq!(
            atlas.add_dash(&[0.0, 0.0], false).unwrap_err(),
            DashAtlasError::NonPositiveLength
        );
    }

    #[test]
    fn butt_dash_sdf_is_signed_distance_to_nearest_edge() {
        let mut atlas = atlas(512);
        atlas.get_dash(&[1.0, 1.0], false).unwrap();
        let row = &atlas.data()[0..256];
        assert_eq!(row[0], 128);
        assert_eq!(row[64], 192);
        assert_eq!(row[128], 128);
        assert_eq!(row[192], 64);
    }

    #[test]
    fn dirty_data_is_reported_once() {
        let mut atlas = atlas(512);
        assert!(atlas.take_dirty_data().is_some());
        assert!(atlas.take_dirty_data().is_none());
        atlas.get_dash(&[1.0, 2.0], false).unwrap();
        assert!(atlas.take_dirty_data().is_some());
    }
}
