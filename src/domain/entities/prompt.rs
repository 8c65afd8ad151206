use std::collections::HashMap;

use crate::domain::entities::conversation::{buffer_string, Message, MessageRole};
use crate::domain::errors::{DomainError, Result};

#[derive(Debug, Clone, Default)]
pub struct PromptValues {
    variables: HashMap<String, String>,
    messages: HashMap<String, Vec<Message>>,
}

impl PromptValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_messages(mut self, name: impl Into<String>, messages: Vec<Message>) -> Self {
        self.messages.insert(name.into(), messages);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn messages(&self, name: &str) -> Option<&[Message]> {
        self.messages.get(name).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

fn parse_segments(template: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => {
                            return Err(DomainError::InvalidTemplate(format!(
                                "unclosed placeholder `{{{name}` in template"
                            )))
                        }
                        Some(ch) => name.push(ch),
                    }
                }
                let name = name.trim();
                if name.is_empty() {
                    return Err(DomainError::InvalidTemplate(
                        "empty placeholder `{}` in template".to_string(),
                    ));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Variable(name.to_string()));
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '}' => {
                return Err(DomainError::InvalidTemplate(
                    "unmatched `}` in template; use `}}` for a literal brace".to_string(),
                ))
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
    partials: HashMap<String, String>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let source = template.into();
        let segments = parse_segments(&source)?;
        Ok(Self {
            source,
            segments,
            partials: HashMap::new(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholders in order of first appearance, excluding ones bound with [`Self::partial`].
    pub fn input_variables(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for segment in &self.segments {
            if let Segment::Variable(name) = segment {
                if !self.partials.contains_key(name) && !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// Binds a placeholder ahead of time, e.g. a parser's format instructions.
    pub fn partial(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.partials.insert(name.into(), value.into());
        self
    }

    fn lookup<'a>(&'a self, name: &str, values: &'a PromptValues) -> Option<&'a str> {
        values
            .get(name)
            .or_else(|| self.partials.get(name).map(String::as_str))
    }

    fn missing(&self, values: &PromptValues) -> Vec<String> {
        self.input_variables()
            .into_iter()
            .filter(|name| values.get(name).is_none())
            .collect()
    }

    pub fn render(&self, values: &PromptValues) -> Result<String> {
        let missing = self.missing(values);
        if !missing.is_empty() {
            return Err(DomainError::MissingVariable(missing));
        }

        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let value = self
                        .lookup(name, values)
                        .ok_or_else(|| DomainError::MissingVariable(vec![name.clone()]))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Clone)]
pub enum PromptEntry {
    Message {
        role: MessageRole,
        template: PromptTemplate,
    },
    Placeholder(String),
}

#[derive(Debug, Clone)]
pub struct ChatPromptTemplate {
    entries: Vec<PromptEntry>,
}

impl ChatPromptTemplate {
    pub fn from_template(template: impl Into<String>) -> Result<Self> {
        Ok(Self {
            entries: vec![PromptEntry::Message {
                role: MessageRole::User,
                template: PromptTemplate::new(template)?,
            }],
        })
    }

    pub fn from_entries(entries: Vec<PromptEntry>) -> Self {
        Self { entries }
    }

    pub fn builder() -> ChatPromptBuilder {
        ChatPromptBuilder::default()
    }

    pub fn entries(&self) -> &[PromptEntry] {
        &self.entries
    }

    pub fn partial(mut self, name: &str, value: &str) -> Self {
        for entry in &mut self.entries {
            if let PromptEntry::Message { template, .. } = entry {
                *template = template.clone().partial(name, value);
            }
        }
        self
    }

    pub fn input_variables(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for entry in &self.entries {
            let entry_names = match entry {
                PromptEntry::Message { template, .. } => template.input_variables(),
                PromptEntry::Placeholder(name) => vec![name.clone()],
            };
            for name in entry_names {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    pub fn render(&self, values: &PromptValues) -> Result<Vec<Message>> {
        let mut missing: Vec<String> = Vec::new();
        for entry in &self.entries {
            let entry_missing = match entry {
                PromptEntry::Message { template, .. } => template.missing(values),
                PromptEntry::Placeholder(name) if values.messages(name).is_none() => {
                    vec![name.clone()]
                }
                PromptEntry::Placeholder(_) => Vec::new(),
            };
            for name in entry_missing {
                if !missing.contains(&name) {
                    missing.push(name);
                }
            }
        }
        if !missing.is_empty() {
            return Err(DomainError::MissingVariable(missing));
        }

        let mut messages = Vec::new();
        for entry in &self.entries {
            match entry {
                PromptEntry::Message { role, template } => {
                    messages.push(Message::new(*role, template.render(values)?));
                }
                PromptEntry::Placeholder(name) => {
                    messages.extend(values.messages(name).unwrap_or_default().iter().cloned());
                }
            }
        }
        Ok(messages)
    }

    pub fn format(&self, values: &PromptValues) -> Result<String> {
        Ok(buffer_string(&self.render(values)?))
    }
}

#[derive(Debug, Default)]
pub struct ChatPromptBuilder {
    entries: Vec<(MessageRole, String)>,
    placeholders: Vec<(usize, String)>,
}

impl ChatPromptBuilder {
    pub fn system(self, template: impl Into<String>) -> Self {
        self.message(MessageRole::System, template)
    }

    pub fn user(self, template: impl Into<String>) -> Self {
        self.message(MessageRole::User, template)
    }

    pub fn assistant(self, template: impl Into<String>) -> Self {
        self.message(MessageRole::Assistant, template)
    }

    pub fn message(mut self, role: MessageRole, template: impl Into<String>) -> Self {
        self.entries.push((role, template.into()));
        self
    }

    pub fn placeholder(mut self, name: impl Into<String>) -> Self {
        let position = self.entries.len() + self.placeholders.len();
        self.placeholders.push((position, name.into()));
        self
    }

    pub fn build(self) -> Result<ChatPromptTemplate> {
        let total = self.entries.len() + self.placeholders.len();
        let mut messages = self.entries.into_iter();
        let mut placeholders = self.placeholders.into_iter().peekable();
        let mut entries = Vec::with_capacity(total);

        for position in 0..total {
            match placeholders.peek() {
                Some((at, _)) if *at == position => {
                    if let Some((_, name)) = placeholders.next() {
                        entries.push(PromptEntry::Placeholder(name));
                    }
                }
                _ => {
                    if let Some((role, text)) = messages.next() {
                        entries.push(PromptEntry::Message {
                            role,
                            template: PromptTemplate::new(text)?,
                        });
                    }
                }
            }
        }

        Ok(ChatPromptTemplate { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_substitution() {
        let template = PromptTemplate::new("Question: {input}.").unwrap();
        let rendered = template
            .render(&PromptValues::new().with("input", "2+2?"))
            .unwrap();

        assert_eq!(rendered, "Question: 2+2?.");
    }

    #[test]
    fn test_whitespace_is_preserved() {
        let template = PromptTemplate::new("\n  Context: {context}.\n  Question: {input}.\n  ").unwrap();
        let rendered = template
            .render(&PromptValues::new().with("context", "c").with("input", "q"))
            .unwrap();

        assert_eq!(rendered, "\n  Context: c.\n  Question: q.\n  ");
    }

    #[test]
    fn test_missing_variables_listed_in_order() {
        let template = PromptTemplate::new("{schema} {user_input} {column} {schema}").unwrap();
        let err = template
            .render(&PromptValues::new().with("user_input", "x"))
            .unwrap_err();

        match err {
            DomainError::MissingVariable(names) => assert_eq!(names, vec!["schema", "column"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_escaped_braces() {
        let template = PromptTemplate::new(r#"Return {{"name": "{name}"}}"#).unwrap();
        assert_eq!(template.input_variables(), vec!["name"]);
        assert_eq!(
            template.render(&PromptValues::new().with("name", "Felix")).unwrap(),
            r#"Return {"name": "Felix"}"#
        );
    }

    #[test]
    fn test_invalid_templates() {
        assert!(matches!(
            PromptTemplate::new("Question: {input"),
            Err(DomainError::InvalidTemplate(_))
        ));
        assert!(matches!(
            PromptTemplate::new("oops }"),
            Err(DomainError::InvalidTemplate(_))
        ));
        assert!(matches!(
            PromptTemplate::new("empty {}"),
            Err(DomainError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_partial_binds_value() {
        let template = PromptTemplate::new("Format: {format_instruction}\nPhrase: {phrase}")
            .unwrap()
            .partial("format_instruction", "JSON");

        assert_eq!(template.input_variables(), vec!["phrase"]);
        assert_eq!(
            template.render(&PromptValues::new().with("phrase", "hi")).unwrap(),
            "Format: JSON\nPhrase: hi"
        );
    }

    #[test]
    fn test_chat_template_with_history() {
        let prompt = ChatPromptTemplate::builder()
            .system("Answer based on the following context: {context}.")
            .placeholder("chat_history")
            .user("{input}")
            .build()
            .unwrap();

        assert_eq!(
            prompt.input_variables(),
            vec!["context", "chat_history", "input"]
        );

        let values = PromptValues::new()
            .with("context", "dogs bark")
            .with("input", "What does my dog do?")
            .with_messages(
                "chat_history",
                vec![Message::user("Hello"), Message::assistant("Hi!")],
            );
        let messages = prompt.render(&values).unwrap();

        assert_eq!(
            messages,
            vec![
                Message::system("Answer based on the following context: dogs bark."),
                Message::user("Hello"),
                Message::assistant("Hi!"),
                Message::user("What does my dog do?"),
            ]
        );
    }

    #[test]
    fn test_chat_template_missing_history_placeholder() {
        let prompt = ChatPromptTemplate::builder()
            .placeholder("chat_history")
            .user("{input}")
            .build()
            .unwrap();

        let err = prompt.render(&PromptValues::new()).unwrap_err();
        match err {
            DomainError::MissingVariable(names) => {
                assert_eq!(names, vec!["chat_history", "input"])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_format_flattens_messages() {
        let prompt = ChatPromptTemplate::builder()
            .system("You are a comedian.")
            .user("{input}")
            .build()
            .unwrap();

        assert_eq!(
            prompt.format(&PromptValues::new().with("input", "chicken")).unwrap(),
            "System: You are a comedian.\nHuman: chicken"
        );
    }
}
