use std::sync::{Arc, Mutex};

use tracing::{debug, instrument};

use crate::application::pipeline::{llm_chain, Lambda, Runnable, RunnableExt, StringOutputParser};
use crate::application::{BufferMemory, ConversationChain};
use crate::domain::{ChatPromptTemplate, DomainError, PromptValues};
use crate::lessons::Lessons;

impl Lessons {
    #[instrument(skip(self, inputs), fields(turns = inputs.len()))]
    pub async fn memory_buffer(&self, inputs: &[String]) -> Result<Vec<String>, DomainError> {
        let prompt = ChatPromptTemplate::from_template(self.config.prompts.conversation.clone())?;
        let mut conversation = ConversationChain::new(
            llm_chain(prompt, self.model(), StringOutputParser),
            BufferMemory::default(),
        );

        let mut replies = Vec::with_capacity(inputs.len());
        for input in inputs {
            replies.push(conversation.predict(input).await?);
            debug!(history = %conversation.memory().buffer(), "memory updated");
        }
        Ok(replies)
    }

    #[instrument(skip(self, inputs), fields(turns = inputs.len()))]
    pub async fn memory_runnable(&self, inputs: &[String]) -> Result<Vec<String>, DomainError> {
        let memory = Arc::new(Mutex::new(BufferMemory::default()));

        let load_memory = {
            let memory = memory.clone();
            Lambda::new(move |input: String| {
                let loaded = memory
                    .lock()
                    .map(|m| m.load_memory_variables())
                    .map_err(|e| DomainError::internal(e.to_string()));
                async move {
                    let mut values = loaded?;
                    values.insert("input", input);
                    Ok::<PromptValues, DomainError>(values)
                }
            })
        };
        let chain = load_memory
            .pipe(ChatPromptTemplate::from_template(
                self.config.prompts.conversation.clone(),
            )?)
            .pipe(self.model())
            .pipe(StringOutputParser);

        let mut replies = Vec::with_capacity(inputs.len());
        for input in inputs {
            let reply = chain.invoke(input.clone()).await?;
            memory
                .lock()
                .map_err(|e| DomainError::internal(e.to_string()))?
                .save_context(input.as_str(), reply.as_str());
            replies.push(reply);
        }
        Ok(replies)
    }
}
