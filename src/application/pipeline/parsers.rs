use std::marker::PhantomData;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::application::pipeline::runnable::Runnable;
use crate::domain::{DomainError, ObjectSchema};

pub trait OutputParser: Send + Sync {
    type Output: Send + 'static;

    fn parse(&self, text: &str) -> Result<Self::Output, DomainError>;

    /// Text to put in the prompt so the model answers in a parseable shape.
    fn format_instructions(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringOutputParser;

impl OutputParser for StringOutputParser {
    type Output = String;

    fn parse(&self, text: &str) -> Result<String, DomainError> {
        Ok(text.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommaSeparatedListOutputParser;

impl OutputParser for CommaSeparatedListOutputParser {
    type Output = Vec<String>;

    fn parse(&self, text: &str) -> Result<Vec<String>, DomainError> {
        Ok(text
            .trim()
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect())
    }

    fn format_instructions(&self) -> Option<String> {
        Some(
            "Your response should be a list of comma separated values, eg: `foo, bar, baz`"
                .to_string(),
        )
    }
}

pub struct StructuredOutputParser<T> {
    json_schema: Value,
    validator: ObjectSchema,
    _marker: PhantomData<fn() -> T>,
}

impl<T: JsonSchema> StructuredOutputParser<T> {
    pub fn new() -> Result<Self, DomainError> {
        let mut json_schema = schemars::schema_for!(T).to_value();
        if let Some(object) = json_schema.as_object_mut() {
            object.remove("$schema");
        }
        let validator = ObjectSchema::from_json_schema(&json_schema)?;

        Ok(Self {
            json_schema,
            validator,
            _marker: PhantomData,
        })
    }
}

impl<T> Clone for StructuredOutputParser<T> {
    fn clone(&self) -> Self {
        Self {
            json_schema: self.json_schema.clone(),
            validator: self.validator.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> OutputParser for StructuredOutputParser<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = T;

    fn parse(&self, text: &str) -> Result<T, DomainError> {
        let value = extract_json(text)?;
        self.validator.validate(&value)?;
        serde_json::from_value(value).map_err(|e| DomainError::output_parse(e.to_string()))
    }

    fn format_instructions(&self) -> Option<String> {
        let schema = serde_json::to_string_pretty(&self.json_schema)
            .unwrap_or_else(|_| self.json_schema.to_string());
        Some(format!(
            "Respond only with a JSON object inside a markdown code block tagged json. \
             The object must conform to this JSON schema:\n```json\n{schema}\n```\n\
             Use null for any value the schema allows to be null when the information is not present."
        ))
    }
}

/// The first JSON object in model text, looking inside a fenced block before the whole text.
/// Surrounding prose may contain braces of its own.
pub fn extract_json(text: &str) -> Result<Value, DomainError> {
    let mut first_error = None;

    for candidate in fenced_block(text).into_iter().chain(std::iter::once(text)) {
        for (start, _) in candidate.match_indices('{') {
            let mut values =
                serde_json::Deserializer::from_str(&candidate[start..]).into_iter::<Value>();
            match values.next() {
                Some(Ok(value @ Value::Object(_))) => return Ok(value),
                Some(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                _ => {}
            }
        }
    }

    Err(match first_error {
        Some(e) => DomainError::output_parse(format!("invalid JSON in model output: {e}")),
        None => DomainError::output_parse(format!("no JSON object found in model output: {text}")),
    })
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}

macro_rules! parser_stage {
    ($($parser:ty),* $(,)?) => {
        $(
            #[async_trait]
            impl Runnable<String> for $parser {
                type Output = <$parser as OutputParser>::Output;

                async fn invoke(&self, input: String) -> Result<Self::Output, DomainError> {
                    self.parse(&input)
                }
            }
        )*
    };
}

parser_stage!(StringOutputParser, CommaSeparatedListOutputParser);

#[async_trait]
impl<T> Runnable<String> for StructuredOutputParser<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = T;

    async fn invoke(&self, input: String) -> Result<T, DomainError> {
        self.parse(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq, JsonSchema)]
    struct Person {
        name: Option<String>,
        #[schemars(description = "the age of the person")]
        age: Option<String>,
        occupation: Option<String>,
    }

    fn person_parser() -> StructuredOutputParser<Person> {
        StructuredOutputParser::new().unwrap()
    }

    #[test]
    fn test_string_parser_is_identity() {
        assert_eq!(
            StringOutputParser.parse("  Why did the dog sit?\n").unwrap(),
            "  Why did the dog sit?\n"
        );
    }

    #[test]
    fn test_list_parser_trims_items() {
        let items = CommaSeparatedListOutputParser
            .parse(" joyful,  cheerful , content,glad, elated \n")
            .unwrap();

        assert_eq!(items, vec!["joyful", "cheerful", "content", "glad", "elated"]);
    }

    #[test]
    fn test_structured_parser_reads_fenced_json() {
        let text = "Here you go:\n```json\n{\"name\": \"Felix\", \"age\": \"32\", \"occupation\": null}\n```";
        let person = person_parser().parse(text).unwrap();

        assert_eq!(
            person,
            Person {
                name: Some("Felix".into()),
                age: Some("32".into()),
                occupation: None,
            }
        );
    }

    #[test]
    fn test_structured_parser_reads_bare_json() {
        let text = r#"{"name": "Felix", "age": null, "occupation": "Youtuber"} hope this helps"#;
        let person = person_parser().parse(text).unwrap();

        assert_eq!(person.occupation.as_deref(), Some("Youtuber"));
    }

    #[test]
    fn test_structured_parser_reports_all_violations() {
        let text = r#"{"name": 7, "age": 32, "occupation": null}"#;
        let err = person_parser().parse(text).unwrap_err();

        let DomainError::SchemaViolation(violations) = err else {
            panic!("expected schema violation, got {err:?}");
        };
        let mut paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
        paths.sort();
        assert_eq!(paths, vec!["age", "name"]);
    }

    #[test]
    fn test_extract_json_ignores_trailing_braces() {
        let value = extract_json(
            r#"{"name": "Felix", "age": "32", "occupation": null} Let me know if you need {more}."#,
        )
        .unwrap();

        assert_eq!(value["name"], "Felix");
        assert!(value["occupation"].is_null());
    }

    #[test]
    fn test_extract_json_skips_leading_braces() {
        let value = extract_json(r#"Sure {here}: {"name": "Felix"}"#).unwrap();

        assert_eq!(value, serde_json::json!({ "name": "Felix" }));
    }

    #[test]
    fn test_extract_json_reports_broken_object() {
        let err = extract_json(r#"{"name": "Felix", "age": }"#).unwrap_err();

        assert!(err.to_string().contains("invalid JSON in model output"));
    }

    #[test]
    fn test_structured_parser_rejects_non_json() {
        assert!(matches!(
            person_parser().parse("I don't know who that is."),
            Err(DomainError::OutputParse(_))
        ));
    }

    #[test]
    fn test_format_instructions_embed_schema() {
        let instructions = person_parser().format_instructions().unwrap();
        assert!(instructions.contains("\"occupation\""));
        assert!(instructions.contains("the age of the person"));
    }

    #[tokio::test]
    async fn test_parser_as_stage() {
        let items = CommaSeparatedListOutputParser
            .invoke("a, b".to_string())
            .await
            .unwrap();
        assert_eq!(items, vec!["a", "b"]);
    }
}
