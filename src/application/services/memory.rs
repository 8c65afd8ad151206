use tracing::instrument;

use crate::application::pipeline::{LlmChain, Runnable, StringOutputParser};
use crate::domain::{buffer_string, DomainError, Message, PromptValues};

#[derive(Debug, Clone)]
pub struct BufferMemory {
    memory_key: String,
    messages: Vec<Message>,
}

impl Default for BufferMemory {
    fn default() -> Self {
        Self::new("history")
    }
}

impl BufferMemory {
    pub fn new(memory_key: impl Into<String>) -> Self {
        Self {
            memory_key: memory_key.into(),
            messages: Vec::new(),
        }
    }

    pub fn memory_key(&self) -> &str {
        &self.memory_key
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn buffer(&self) -> String {
        buffer_string(&self.messages)
    }

    pub fn load_memory_variables(&self) -> PromptValues {
        PromptValues::new().with(self.memory_key.clone(), self.buffer())
    }

    pub fn save_context(&mut self, input: impl Into<String>, output: impl Into<String>) {
        self.messages.push(Message::user(input));
        self.messages.push(Message::assistant(output));
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

pub struct ConversationChain {
    chain: LlmChain<StringOutputParser>,
    memory: BufferMemory,
}

impl ConversationChain {
    pub fn new(chain: LlmChain<StringOutputParser>, memory: BufferMemory) -> Self {
        Self { chain, memory }
    }

    pub fn memory(&self) -> &BufferMemory {
        &self.memory
    }

    /// Runs one turn. The exchange is saved only if the model call succeeds.
    #[instrument(skip(self))]
    pub async fn predict(&mut self, input: &str) -> Result<String, DomainError> {
        let mut values = self.memory.load_memory_variables();
        values.insert("input", input);

        let output = self.chain.invoke(values).await?;
        self.memory.save_context(input, output.clone());
        Ok(output)
    }
}
