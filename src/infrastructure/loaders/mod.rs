mod file;
mod inline;

pub use file::FileSource;
pub use inline::InlineSource;
