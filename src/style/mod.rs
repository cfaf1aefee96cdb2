//! Colour math and generated login page CSS.

pub mod color;
pub mod css;

pub use color::{prefers_dark_widget, Rgb};
pub use css::generate_pro_css;
