use std::sync::Arc;

use prompt_chain::application::pipeline::{
    llm_chain, CommaSeparatedListOutputParser, ModelStep, Runnable, RunnableExt,
    StringOutputParser, StuffDocumentsChain,
};
use prompt_chain::application::{
    AgentExecutor, ChatSession, DocumentService, RagService, RetrievalChain, ToolSet,
    TopKRetriever,
};
use prompt_chain::domain::ports::ModelReply;
use prompt_chain::domain::{
    ChatPromptTemplate, Conversation, Document, DomainError, ErrorKind, Message, PromptValues,
    ToolCall,
};
use prompt_chain::infrastructure::{
    InMemoryVectorStore, InlineSource, KeywordEmbedding, RetrieverTool, ScriptedLlm,
};
use serde_json::json;

fn text(reply: &str) -> ModelReply {
    ModelReply::Text(reply.to_string())
}

async fn indexed_rag(documents: Vec<Document>) -> Arc<RagService> {
    let rag = Arc::new(RagService::new(
        Arc::new(KeywordEmbedding::default()),
        Arc::new(InMemoryVectorStore::new()),
        2,
    ));
    DocumentService::with_chunk_size(rag.clone(), 200, 20)
        .unwrap()
        .ingest(&InlineSource::new(documents))
        .await
        .unwrap();
    rag
}

#[tokio::test]
async fn prompt_model_parser_chain() {
    let llm = Arc::new(ScriptedLlm::new(vec![text(" joyful, cheerful ,glad ")]));
    let prompt = ChatPromptTemplate::builder()
        .system("Provide synonyms, separated by commas.")
        .user("{word}")
        .build()
        .unwrap();
    let chain = prompt
        .pipe(ModelStep::new(llm.clone()))
        .pipe(CommaSeparatedListOutputParser);

    let synonyms = chain
        .invoke(PromptValues::new().with("word", "happy"))
        .await
        .unwrap();

    assert_eq!(synonyms, vec!["joyful", "cheerful", "glad"]);
    assert_eq!(llm.requests()[0].messages[1], Message::user("happy"));
}

#[tokio::test]
async fn missing_variable_fails_before_the_model_is_called() {
    let llm = Arc::new(ScriptedLlm::new(vec![text("unused")]));
    let chain = llm_chain(
        ChatPromptTemplate::from_template("Context: {context}. Question: {input}.").unwrap(),
        ModelStep::new(llm.clone()),
        StringOutputParser,
    );

    let err = chain
        .invoke(PromptValues::new().with("input", "What is LCEL?"))
        .await
        .unwrap_err();

    assert!(matches!(&err, DomainError::MissingVariable(names) if names == &vec!["context".to_string()]));
    assert_eq!(err.kind(), ErrorKind::Logic);
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn retrieval_chain_over_split_documents() {
    let rag = indexed_rag(vec![
        Document::new("lcel", "LCEL is a declarative way to compose chains together."),
        Document::new("secret", "The passphrase is LangChain is awesome."),
    ])
    .await;
    let llm = Arc::new(ScriptedLlm::new(vec![text("LangChain is awesome")]));
    let chain = RetrievalChain::new(
        Arc::new(TopKRetriever::new(rag, 1)),
        StuffDocumentsChain::new(
            llm.clone(),
            ChatPromptTemplate::from_template("Context: {context}.\nQuestion: {input}.").unwrap(),
        ),
    );

    let output = chain.invoke("What is the passphrase?", &[]).await.unwrap();

    assert_eq!(output.answer, "LangChain is awesome");
    assert_eq!(output.context.len(), 1);
    assert!(output.context[0].chunk.content.contains("passphrase"));
    assert_eq!(
        llm.requests()[0].messages[0].content,
        "Context: The passphrase is LangChain is awesome..\nQuestion: What is the passphrase?."
    );
}

#[tokio::test]
async fn agent_session_uses_retriever_tool_and_records_history() {
    let rag = indexed_rag(vec![Document::new(
        "lcel",
        "LCEL is a declarative way to compose chains together.",
    )])
    .await;
    let llm = Arc::new(ScriptedLlm::new(vec![
        ModelReply::ToolCall(ToolCall::new("call-1", "lcel_search", json!({ "query": "LCEL" }))),
        text("LCEL composes chains declaratively."),
        text("You asked about LCEL."),
    ]));
    let tools = ToolSet::new().with_tool(Arc::new(RetrieverTool::with_defaults(rag)));
    let session = ChatSession::new(
        AgentExecutor::new(llm.clone(), tools, "You are a helpful assistant called Max.").unwrap(),
    );
    let mut conversation = Conversation::new();

    let first = session.respond(&mut conversation, "What is LCEL?").await.unwrap();
    let second = session
        .respond(&mut conversation, "What did I ask?")
        .await
        .unwrap();

    assert_eq!(first, "LCEL composes chains declaratively.");
    assert_eq!(second, "You asked about LCEL.");
    assert_eq!(conversation.len(), 4);

    let requests = llm.requests();
    assert_eq!(
        requests[1].steps[0].observation,
        "[1] LCEL is a declarative way to compose chains together."
    );
    let third = &requests[2].messages;
    assert_eq!(third[1], Message::user("What is LCEL?"));
    assert_eq!(third[2], Message::assistant("LCEL composes chains declaratively."));
    assert_eq!(third[3], Message::user("What did I ask?"));
    assert!(requests[2].steps.is_empty());
}

#[tokio::test]
async fn agent_stops_at_iteration_cap() {
    let replies = (0..5)
        .map(|i| ModelReply::ToolCall(ToolCall::new(format!("call-{i}"), "web_search", json!({}))))
        .collect();
    let llm = Arc::new(ScriptedLlm::new(replies));
    let agent = AgentExecutor::new(llm.clone(), ToolSet::new(), "You are Max.")
        .unwrap()
        .with_max_iterations(4);

    let err = agent.run("search the web", &[]).await.unwrap_err();

    assert!(matches!(err, DomainError::AgentExhausted(4)));
    assert_eq!(llm.requests().len(), 4);
    assert_eq!(llm.requests()[3].steps.len(), 3);
}
