use tracing::instrument;

use crate::application::pipeline::{llm_chain, Runnable, StringOutputParser};
use crate::domain::{ChatPromptTemplate, DomainError, PromptValues};
use crate::lessons::Lessons;

pub const STUDENT_SCHEMA: &str = "CREATE TABLE dbo.Student(
  student_id varchar(10) primary key,
  first_name nvarchar(10),
  last_name nvarchar(10),
  city nvarchar(64),
  age int
)";

impl Lessons {
    #[instrument(skip(self, schema))]
    pub async fn sql(
        &self,
        schema: &str,
        request: &str,
        columns: &str,
    ) -> Result<String, DomainError> {
        let prompt = ChatPromptTemplate::from_template(self.config.prompts.sql_generator.clone())?;
        let chain = llm_chain(prompt, self.model(), StringOutputParser);

        chain
            .invoke(
                PromptValues::new()
                    .with("schema", schema)
                    .with("user_input", request)
                    .with("column", columns),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lessons::testing::{lessons, text};

    #[tokio::test]
    async fn test_sql_prompt_carries_schema_and_columns() {
        let query = "SELECT student_id, first_name, last_name, age FROM dbo.Student WHERE age > 10 LIMIT 20;";
        let (lessons, llm) = lessons(vec![text(query)]);

        let sql = lessons
            .sql(
                STUDENT_SCHEMA,
                "Find students who have age above 10",
                "student_id, first_name, last_name, age",
            )
            .await
            .unwrap();

        assert_eq!(sql, query);
        let prompt = &llm.requests()[0].messages[0].content;
        assert!(prompt.contains("student_id varchar(10) primary key"));
        assert!(prompt.contains("Display the following column(s): student_id, first_name, last_name, age."));
    }
}
