use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::instrument;

use crate::application::pipeline::{
    llm_chain, CommaSeparatedListOutputParser, OutputParser, Runnable, StructuredOutputParser,
};
use crate::domain::{ChatPromptTemplate, DomainError, PromptValues};
use crate::lessons::Lessons;

/// Fields the model reports as `null` stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Person {
    #[schemars(description = "the name of the person")]
    pub name: Option<String>,
    #[schemars(description = "the age of the person")]
    pub age: Option<String>,
    #[schemars(description = "the gender of the person")]
    pub gender: Option<String>,
    #[schemars(description = "the occupation of the person")]
    pub occupation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Ingredient {
    #[schemars(description = "ingredient name")]
    pub ingredient: String,
    #[schemars(description = "ingredient amount")]
    pub amount: f64,
    #[schemars(description = "ingredient measurement")]
    pub measure: String,
    #[schemars(description = "ingredient producer")]
    pub factory: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Recipe {
    #[schemars(description = "the recipe name")]
    pub recipe: String,
    #[schemars(
        description = "an array of objects containing ingredients and the ingredients' amount"
    )]
    pub ingredients: Vec<Ingredient>,
}

impl Lessons {
    #[instrument(skip(self))]
    pub async fn parse_string(&self, word: &str) -> Result<String, DomainError> {
        self.joke(word).await
    }

    #[instrument(skip(self))]
    pub async fn parse_list(&self, word: &str) -> Result<Vec<String>, DomainError> {
        let prompt = ChatPromptTemplate::builder()
            .system(self.config.prompts.synonyms.clone())
            .user("{word}")
            .build()?;
        let chain = llm_chain(prompt, self.model(), CommaSeparatedListOutputParser);

        chain.invoke(PromptValues::new().with("word", word)).await
    }

    #[instrument(skip(self))]
    pub async fn parse_person(&self, phrase: &str) -> Result<Person, DomainError> {
        self.extract::<Person>(phrase).await
    }

    #[instrument(skip(self))]
    pub async fn parse_recipe(&self, phrase: &str) -> Result<Recipe, DomainError> {
        self.extract::<Recipe>(phrase).await
    }

    async fn extract<T>(&self, phrase: &str) -> Result<T, DomainError>
    where
        T: DeserializeOwned + JsonSchema + Send + 'static,
    {
        let parser = StructuredOutputParser::<T>::new()?;
        let instructions = parser.format_instructions().unwrap_or_default();
        let prompt = ChatPromptTemplate::from_template(self.config.prompts.extractor.clone())?;
        let chain = llm_chain(prompt, self.model(), parser);

        chain
            .invoke(
                PromptValues::new()
                    .with("phrase", phrase)
                    .with("format_instruction", instructions),
            )
            .await
    }
}
