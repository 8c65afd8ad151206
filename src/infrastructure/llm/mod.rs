mod gemini;
mod scripted;
mod timeout;

pub use gemini::GeminiLlm;
pub use scripted::ScriptedLlm;
pub use timeout::TimeoutLlm;
