pub mod page_ctx;
pub mod page_processor;

pub use page_ctx::PageCtx;
pub use page_processor::{AnswerSource, PageProcessor};
