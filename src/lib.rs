pub mod barline;
pub mod block;
pub mod config;
pub mod error;
pub mod event;
pub mod note;
pub mod seq;
pub mod text;
pub mod timeline;
pub mod track;
pub mod voice;
