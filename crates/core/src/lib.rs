//! Domain model of the annotation review widget.
//!
//! Pure logic only: the update status machine, comment validation, the
//! per-annotation view state, and the HTML renderer that derives markup
//! from that state. Network access lives in `tellina-client`.

pub mod error;
pub mod panel;
pub mod render;
pub mod thread;
pub mod types;
pub mod update;
pub mod view;
