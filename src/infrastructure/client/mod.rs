//! Client - 生成接口的调用端

mod generate_client;

pub use generate_client::{ClientError, GenerateClient, GenerateOutcome};
