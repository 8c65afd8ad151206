use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::pipeline::{llm_chain, Lambda, Runnable, RunnableExt, StringOutputParser};
use crate::domain::{ChatPromptTemplate, DomainError, PromptValues};
use crate::lessons::Lessons;

impl Lessons {
    #[instrument(skip(self))]
    pub async fn ask(&self, question: &str) -> Result<String, DomainError> {
        self.llm.complete(question).await
    }

    #[instrument(skip(self))]
    pub async fn joke(&self, word: &str) -> Result<String, DomainError> {
        let prompt = ChatPromptTemplate::builder()
            .system(self.config.prompts.comedian.clone())
            .user("{input}")
            .build()?;
        let chain = llm_chain(prompt, self.model(), StringOutputParser);

        chain.invoke(PromptValues::new().with("input", word)).await
    }

    #[instrument(skip(self))]
    pub async fn evaluate(&self, topic: &str) -> Result<String, DomainError> {
        let joke_chain = Arc::new(llm_chain(
            ChatPromptTemplate::from_template(self.config.prompts.joke_teller.clone())?,
            self.model(),
            StringOutputParser,
        ));
        let evaluation_prompt =
            ChatPromptTemplate::from_template(self.config.prompts.joke_evaluator.clone())?;

        let tell_joke = Lambda::new(move |values: PromptValues| {
            let joke_chain = joke_chain.clone();
            async move {
                let joke = joke_chain.invoke(values).await?;
                debug!(%joke, "joke to evaluate");
                Ok(PromptValues::new().with("joke", joke))
            }
        });
        let chain = tell_joke
            .pipe(evaluation_prompt)
            .pipe(self.model())
            .pipe(StringOutputParser);

        chain.invoke(PromptValues::new().with("input", topic)).await
    }
}
