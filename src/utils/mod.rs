pub mod input;
pub mod line_editor;
pub mod logging;
pub mod text;
pub mod url;
