use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Prompt pipelines, retrieval and agents over Gemini, one lesson per command.
#[derive(Parser)]
#[command(name = "lessons", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding config.yaml and prompts.yaml (defaults to $PROMPT_CHAIN_CONFIG_DIR or ./config).
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one question straight to the model.
    Ask {
        #[arg(default_value = "Write a poem about AI")]
        question: String,
    },

    /// Tell a joke about a word with a system persona.
    Joke {
        #[arg(default_value = "dog")]
        word: String,
    },

    /// Shape the model output with a parser.
    Parse {
        #[command(subcommand)]
        kind: ParseCommand,
    },

    /// Answer with and without retrieved context.
    Rag {
        #[command(subcommand)]
        mode: RagCommand,
    },

    /// Retrieval that rewrites the question against a sample conversation first.
    History {
        #[arg(default_value = "What is it?")]
        question: String,

        /// Text file to index.
        #[arg(long, default_value = "data/lcel.md")]
        path: PathBuf,

        /// Chunks to retrieve.
        #[arg(long, default_value_t = 4)]
        top_k: usize,
    },

    /// Conversations that remember earlier turns.
    Memory {
        #[command(subcommand)]
        mode: MemoryCommand,
    },

    /// Interactive agent with a retriever tool; reads questions from stdin.
    Agent {
        /// Text file to index.
        #[arg(long, default_value = "data/lcel.md")]
        path: PathBuf,
    },

    /// Tell a joke, then have a second chain evaluate it.
    Evaluate {
        #[arg(default_value = "bears")]
        topic: String,
    },

    /// Generate a MySQL SELECT query for a schema.
    Sql {
        #[arg(default_value = "Find students who have age above 10")]
        request: String,

        #[arg(long, default_value = "student_id, first_name, last_name, age")]
        columns: String,

        /// File holding the schema DDL; the sample student table when omitted.
        #[arg(long)]
        schema: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ParseCommand {
    /// Plain string output.
    String {
        #[arg(default_value = "dog")]
        word: String,
    },
    /// Comma separated synonyms.
    List {
        #[arg(default_value = "happy")]
        word: String,
    },
    /// Person fields extracted from a phrase.
    Person {
        #[arg(
            default_value = "A 32 year-old male Youtuber from Sweden called Felix celebrating his channel reaching 100 million subscribers"
        )]
        phrase: String,
    },
    /// Recipe with typed ingredients extracted from a phrase.
    Recipe {
        #[arg(
            default_value = "You will need 100 grams flour from Norway, 200 litters water and 50 yeast to make bread."
        )]
        phrase: String,
    },
}

#[derive(Subcommand)]
pub enum RagCommand {
    /// No context at all.
    Bare {
        #[arg(default_value = "What is LCEL?")]
        question: String,
    },
    /// Two hand-written documents as context.
    Inline {
        #[arg(default_value = "What is the passphrase?")]
        question: String,
    },
    /// Split, embed and retrieve from a text file.
    File {
        #[arg(default_value = "What is LCEL?")]
        question: String,

        #[arg(long, default_value = "data/lcel.md")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum MemoryCommand {
    /// Conversation chain with buffer memory.
    Buffer {
        #[arg(default_values_t = default_turns())]
        inputs: Vec<String>,
    },
    /// The same conversation composed from runnable stages.
    Runnable {
        #[arg(default_values_t = default_turns())]
        inputs: Vec<String>,
    },
}

fn default_turns() -> Vec<String> {
    vec![
        "Remember, the passphrase is WORLD DOMINATION".to_string(),
        "What is the passphrase?".to_string(),
    ]
}
