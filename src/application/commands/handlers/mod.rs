//! Command Handlers

mod convert_handlers;
mod generate_handlers;

pub use convert_handlers::ConvertAudioHandler;
pub use generate_handlers::{
    parse_categories, GenerateMusicHandler, CATEGORIES_SYSTEM_PROMPT, LYRICS_SYSTEM_PROMPT,
    MAX_CATEGORIES, STYLE_SYSTEM_PROMPT,
};
