use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info, instrument};

use crate::application::{AgentExecutor, ChatSession, ToolSet};
use crate::domain::ports::DocumentSource;
use crate::domain::{Conversation, DomainError};
use crate::infrastructure::RetrieverTool;
use crate::lessons::Lessons;

impl Lessons {
    #[instrument(skip(self, source))]
    pub async fn agent_session(
        &self,
        source: &dyn DocumentSource,
    ) -> Result<ChatSession, DomainError> {
        let top_k = self.config.config.rag.top_k;
        let rag = self.build_index(source, top_k).await?;
        let tool = RetrieverTool::new(rag, top_k, self.config.config.tools.knowledge_base.clone());

        let executor = AgentExecutor::new(
            self.llm.clone(),
            ToolSet::new().with_tool(Arc::new(tool)),
            &self.config.prompts.agent_system,
        )?
        .with_max_iterations(self.config.config.agent.max_iterations)
        .with_temperature(self.config.config.llm.temperature);

        Ok(ChatSession::new(executor))
    }
}

/// A failed turn is reported and left out of the conversation; the loop keeps going.
pub async fn run_chat_loop<R, W>(
    session: &ChatSession,
    conversation: &mut Conversation,
    input: R,
    mut output: W,
) -> Result<(), DomainError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    loop {
        write(&mut output, "> User: ").await?;
        let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| DomainError::internal(format!("failed to read input: {e}")))?
        else {
            break;
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match session.respond(conversation, line).await {
            Ok(answer) => write(&mut output, &format!(">> Agent: {answer}\n")).await?,
            Err(e) => {
                error!(error = %e, kind = ?e.kind(), "agent turn failed");
                write(&mut output, &format!(">> Agent failed: {e}\n")).await?;
            }
        }
    }

    info!(turns = conversation.len() / 2, "chat ended");
    Ok(())
}

async fn write<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<(), DomainError> {
    output
        .write_all(text.as_bytes())
        .await
        .map_err(|e| DomainError::internal(format!("failed to write output: {e}")))?;
    output
        .flush()
        .await
        .map_err(|e| DomainError::internal(format!("failed to write output: {e}")))
}
