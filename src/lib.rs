//! Music Gen - 文生音乐推理服务
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Music: 生成参数与校验
//! - Audio: WAV/MP3 容器、MP3 帧头解析
//!
//! 应用层 (application/):
//! - Ports: 模型加载器、音乐/语言/图像管线、音频转码器
//! - Commands: 生成音乐、WAV 转 MP3
//! - ModelHost: 模型常驻与空闲回收
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: 生成接口与模型状态
//! - Adapters: 推理后端客户端、Fake 模型、MP3 转码
//! - Client: 生成接口的调用端

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
