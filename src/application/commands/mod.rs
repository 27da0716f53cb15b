//! Commands - 命令及处理器

mod convert_commands;
mod generate_commands;
pub mod handlers;

pub use convert_commands::{ConvertAudioCommand, ConvertAudioResponse};
pub use generate_commands::{GenerateMusicCommand, GenerateMusicResponse};
