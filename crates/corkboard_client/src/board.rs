//! Shared document shapes for the board itself.
//!
//! The bootstrap layer never edits notes; these shapes are what the view
//! layer reads out of the shared objects the document is created with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audience::BoardMember;
use crate::loader::{ContainerSchema, SharedObjectKind};

/// The fixed palette of note colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoteColor {
    /// Blue.
    Blue,
    /// Green.
    Green,
    /// Yellow, the default for new notes.
    #[default]
    Yellow,
    /// Pink.
    Pink,
    /// Purple.
    Purple,
    /// Orange.
    Orange,
}

impl NoteColor {
    /// All palette colors, in picker order.
    pub const ALL: [NoteColor; 6] = [
        NoteColor::Blue,
        NoteColor::Green,
        NoteColor::Yellow,
        NoteColor::Pink,
        NoteColor::Purple,
        NoteColor::Orange,
    ];
}

/// A note's position on the board, in board coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal offset.
    pub x: f64,
    /// Vertical offset.
    pub y: f64,
}

/// Who touched a note last, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastEdited {
    /// Editing user's id.
    pub user_id: String,
    /// Editing user's display name.
    pub user_name: String,
    /// Edit time.
    pub time: DateTime<Utc>,
}

/// One sticky note as the view layer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteData {
    /// Stable note id.
    pub id: String,
    /// Most recent edit attribution.
    pub last_edited: LastEdited,
    /// Note text; absent while the note is still empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// The member who created the note.
    pub author: BoardMember,
    /// Position on the board.
    pub position: Position,
    /// Number of likes, as computed from the shared vote map.
    pub like_count: u32,
    /// Whether the local user liked this note.
    pub liked_by_me: bool,
    /// Note color.
    pub color: NoteColor,
}

/// The container schema every new board document is created with.
pub fn board_schema() -> ContainerSchema {
    let mut schema = ContainerSchema::default();
    schema
        .initial_objects
        .insert("notes".to_string(), SharedObjectKind::Map);
    schema
        .initial_objects
        .insert("votes".to_string(), SharedObjectKind::Map);
    schema
}
