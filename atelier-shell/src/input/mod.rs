//! Input classification for the display surface's keystroke stream
//!
//! Two concerns live here:
//! - [`filter`]: dropping spurious terminal control sequences the surface
//!   emits as a side effect of mouse interaction
//! - [`keys`]: translating the multiline-newline key chord before the
//!   surface's own key handling runs

pub mod filter;
pub mod keys;

pub use filter::{classify, InputDisposition};
pub use keys::{translate_multiline_key, KeyDisposition, MULTILINE_NEWLINE};
