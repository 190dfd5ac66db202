//! HTTP Handlers

mod chapter;
mod character;
mod ping;
mod work;

pub use chapter::*;
pub use character::*;
pub use ping::*;
pub use work::*;
