//! Provider 驱动层：负责模型厂商特有的请求/响应格式转换
//!
//! Provider driver layer. A driver only converts between a prompt and the
//! provider's wire format; sending the request is the transport's job.

pub mod gemini;

pub use gemini::{GeminiDriver, GenerationConfig};
