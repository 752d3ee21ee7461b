pub mod carousel_view;
pub mod chapter_reader;
pub mod download_wizard;
pub mod help_overlay;
pub mod manga_detail;
pub mod popular_strip;
