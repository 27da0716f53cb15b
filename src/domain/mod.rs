//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Music Context: 生成参数
//! - Audio Context: 音频容器与帧头

pub mod audio;
pub mod music;
