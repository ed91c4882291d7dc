pub mod correction_llm;
pub mod db;
pub mod openai_chat;
pub mod translation_llm;

pub use correction_llm::OpenAiCorrectionAdapter;
pub use db::DbAdapter;
pub use translation_llm::OpenAiTranslationAdapter;
