pub mod extraction_service;
pub mod extractor;
pub mod gemini_client;
pub mod mock_extractor;
pub mod text;

pub use extraction_service::*;
pub use extractor::*;
pub use gemini_client::GeminiClient;
pub use mock_extractor::MockTextExtractor;
pub use text::normalize_whitespace;
