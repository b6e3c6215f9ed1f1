//! Shared constants used across the application

/// Source passages are cut to this many characters for display.
pub const SOURCE_PREVIEW_CHARS: usize = 200;

/// Marker appended to a source passage that was cut.
pub const TRUNCATION_MARKER: &str = "...";

/// The question field grows with its content up to this many rows.
pub const INPUT_MAX_ROWS: u16 = 5;

/// At or below this terminal width the sidebar overlays the chat and is
/// hidden by default.
pub const NARROW_LAYOUT_COLUMNS: u16 = 80;

/// Width of the sidebar column.
pub const SIDEBAR_WIDTH: u16 = 28;

/// How long "Saved!" stays on the settings button after a save, in ms.
pub const SAVED_FEEDBACK_MILLIS: u64 = 1500;

pub const APP_TITLE: &str = "HemaV MedAssist";

pub const GENERIC_APPLICATION_ERROR: &str = "Something went wrong. Please try again.";

pub const CONNECTIVITY_ERROR: &str =
    "Failed to connect to the server. Please check that the MedAssist backend and the vector database are running.";

pub const LOADING_TEXT: &str = "Searching the medical knowledge base & generating an answer...";

/// Preset questions offered on the welcome screen.
pub const SUGGESTED_QUESTIONS: &[&str] = &[
    "What is hemophilia A?",
    "What are the common symptoms of iron deficiency anemia?",
    "How is sickle cell disease diagnosed?",
];
