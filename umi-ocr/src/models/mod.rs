mod common;
mod document;
mod image;
mod qrcode;

pub use common::*;
pub use document::*;
pub use image::*;
pub use qrcode::*;
