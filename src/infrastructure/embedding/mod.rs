mod keyword;
mod text;

pub use keyword::KeywordEmbedding;
pub use text::TextEmbedding;
