//! Transcript Data Model
//!
//! The entries that make up a game session's transcript: the player's
//! prompts and the image-candidate grids generated for them. A grid entry
//! carries its own selection/detection sub-state and is mutated in place
//! through [`GridUpdate`] patches as requests resolve; entries are never
//! deleted except when a failed generation removes its own placeholder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier for a transcript entry.
///
/// Allocated from a monotonic counter in the session store; only uniqueness
/// and insertion order are meaningful.
pub type EntryId = u64;

/// A batch of candidate images plus its selection/detection sub-state.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ImageGrid {
    /// Displayable image references (`data:image/png;base64,…`).
    pub images: Vec<String>,
    /// True while the generation request that created this grid is in flight.
    pub is_loading: bool,
    /// Index of the image the player picked, once they have.
    pub selected_index: Option<usize>,
    /// True while a detection request for this grid is in flight.
    pub is_detecting: bool,
    /// Image reference returned by the detector.
    pub detected_image: Option<String>,
    /// Raw detector score from the last completed detection.
    pub last_accuracy: Option<f64>,
    /// Points awarded for the last completed detection.
    pub last_points: Option<u32>,
}

/// The two kinds of transcript entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum EntryKind {
    UserPrompt(String),
    ImageGrid(ImageGrid),
}

/// One entry in the session transcript.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub id: EntryId,
    pub created_at: DateTime<Utc>,
    pub kind: EntryKind,
}

impl TranscriptEntry {
    /// The grid payload, when this entry is a grid.
    pub fn grid(&self) -> Option<&ImageGrid> {
        match &self.kind {
            EntryKind::ImageGrid(grid) => Some(grid),
            EntryKind::UserPrompt(_) => None,
        }
    }

    pub(crate) fn grid_mut(&mut self) -> Option<&mut ImageGrid> {
        match &mut self.kind {
            EntryKind::ImageGrid(grid) => Some(grid),
            EntryKind::UserPrompt(_) => None,
        }
    }

    /// The prompt text, when this entry is a user prompt.
    pub fn user_prompt(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::UserPrompt(text) => Some(text),
            EntryKind::ImageGrid(_) => None,
        }
    }
}

/// A partial update applied to an [`ImageGrid`] in place.
///
/// `None` fields are left untouched, so overlapping completions only write
/// the fields their own response produced.
#[derive(Debug, Clone, Default)]
pub struct GridUpdate {
    pub images: Option<Vec<String>>,
    pub is_loading: Option<bool>,
    pub selected_index: Option<usize>,
    pub is_detecting: Option<bool>,
    pub detected_image: Option<String>,
    pub last_accuracy: Option<f64>,
    pub last_points: Option<u32>,
}

impl GridUpdate {
    pub fn apply(self, grid: &mut ImageGrid) {
        if let Some(images) = self.images {
            grid.images = images;
        }
        if let Some(is_loading) = self.is_loading {
            grid.is_loading = is_loading;
        }
        if let Some(selected_index) = self.selected_index {
            grid.selected_index = Some(selected_index);
        }
        if let Some(is_detecting) = self.is_detecting {
            grid.is_detecting = is_detecting;
        }
        if let Some(detected_image) = self.detected_image {
            grid.detected_image = Some(detected_image);
        }
        if let Some(last_accuracy) = self.last_accuracy {
            grid.last_accuracy = Some(last_accuracy);
        }
        if let Some(last_points) = self.last_points {
            grid.last_points = Some(last_points);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loading_grid() -> ImageGrid {
        ImageGrid {
            is_loading: true,
            ..ImageGrid::default()
        }
    }

    #[test]
    fn update_only_touches_the_fields_it_carries() {
        let mut grid = loading_grid();
        GridUpdate {
            images: Some(vec!["data:image/png;base64,AAAA".to_string()]),
            is_loading: Some(false),
            ..GridUpdate::default()
        }
        .apply(&mut grid);

        assert_eq!(grid.images.len(), 1);
        assert!(!grid.is_loading);
        assert_eq!(grid.selected_index, None);
        assert!(!grid.is_detecting);
        assert_eq!(grid.last_accuracy, None);
    }

    #[test]
    fn detection_fields_accumulate_across_updates() {
        let mut grid = loading_grid();
        GridUpdate {
            selected_index: Some(2),
            is_detecting: Some(true),
            ..GridUpdate::default()
        }
        .apply(&mut grid);
        GridUpdate {
            is_detecting: Some(false),
            detected_image: Some("detected".to_string()),
            last_accuracy: Some(30.0),
            last_points: Some(7),
            ..GridUpdate::default()
        }
        .apply(&mut grid);

        assert_eq!(grid.selected_index, Some(2));
        assert!(!grid.is_detecting);
        assert_eq!(grid.detected_image.as_deref(), Some("detected"));
        assert_eq!(grid.last_accuracy, Some(30.0));
        assert_eq!(grid.last_points, Some(7));
    }

    #[test]
    fn entry_accessors_match_the_kind() {
        let prompt = TranscriptEntry {
            id: 1,
            created_at: Utc::now(),
            kind: EntryKind::UserPrompt("a flying cow".to_string()),
        };
        assert_eq!(prompt.user_prompt(), Some("a flying cow"));
        assert!(prompt.grid().is_none());

        let grid = TranscriptEntry {
            id: 2,
            created_at: Utc::now(),
            kind: EntryKind::ImageGrid(loading_grid()),
        };
        assert!(grid.user_prompt().is_none());
        assert!(grid.grid().is_some_and(|g| g.is_loading));
    }
}
