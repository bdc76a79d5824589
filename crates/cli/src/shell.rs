//! The read-eval-print loop.
//!
//! Reads one line at a time, runs it as a turn, and streams the answer
//! back as it arrives. Generic over its input and output so tests can
//! drive it with in-memory buffers.

use jarvis_agent::{AgentLoop, AgentStreamEvent};
use jarvis_core::session::Session;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const EVENT_BUFFER: usize = 32;

pub struct InteractiveShell<R, W> {
    agent: AgentLoop,
    session: Session,
    input: R,
    output: W,
}

impl<R, W> InteractiveShell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(agent: AgentLoop, session: Session, input: R, output: W) -> Self {
        Self {
            agent,
            session,
            input,
            output,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Consume the shell, returning the session and the output sink.
    pub fn into_parts(self) -> (Session, W) {
        (self.session, self.output)
    }

    /// Run until the user types `exit` or input ends.
    ///
    /// Only I/O failures on the terminal itself end the loop with an error;
    /// engine and tool failures are narrated and the prompt comes back.
    pub async fn run(&mut self) -> io::Result<()> {
        let report = self.session.load_todos();
        self.write_line(&report.to_string()).await?;
        self.banner().await?;

        let mut line = Vec::new();
        loop {
            self.write("\nYou: ").await?;

            // Read raw bytes so one badly encoded line cannot end the session.
            line.clear();
            let read = self.input.read_until(b'\n', &mut line).await?;
            let decoded = String::from_utf8_lossy(&line);
            let utterance = decoded.trim();

            if read == 0 {
                debug!("End of input");
                self.write("\n").await?;
                return self.shutdown().await;
            }
            if utterance.eq_ignore_ascii_case("exit") {
                return self.shutdown().await;
            }
            if utterance.is_empty() {
                continue;
            }

            self.turn(utterance).await?;
        }
    }

    async fn banner(&mut self) -> io::Result<()> {
        let name = self.session.assistant_name().to_string();
        self.write_line("--------Welcome! Your AI Assistant is ready. Type 'exit' to quit.--------")
            .await?;
        self.write_line(
            "You can ask me to perform calculations, answer questions, or assist with various tasks.",
        )
        .await?;
        self.write_line("I can remember your preferences, manage a to-do list, and even tell jokes!")
            .await?;
        self.write_line(&format!("Current assistant name: {name}")).await
    }

    /// Run one turn, printing fragments in the order they arrive.
    async fn turn(&mut self, utterance: &str) -> io::Result<()> {
        self.write("\nAssistant: ").await?;

        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let agent = &self.agent;
        let session = &mut self.session;
        let output = &mut self.output;

        let printer = async move {
            while let Some(event) = rx.recv().await {
                match event {
                    AgentStreamEvent::Chunk { content } => {
                        output.write_all(content.as_bytes()).await?;
                        output.flush().await?;
                    }
                    AgentStreamEvent::ToolCall { name, .. } => {
                        debug!(tool = %name, "Tool requested");
                    }
                    AgentStreamEvent::ToolResult { name, success, .. } => {
                        debug!(tool = %name, success, "Tool finished");
                    }
                    AgentStreamEvent::Done {
                        iterations,
                        tool_calls_made,
                        ..
                    } => {
                        info!(iterations, tool_calls_made, "Turn complete");
                    }
                    AgentStreamEvent::Error { message } => {
                        let line = format!("Sorry, something went wrong: {message}");
                        output.write_all(line.as_bytes()).await?;
                    }
                }
            }
            output.write_all(b"\n").await?;
            output.flush().await
        };

        let (outcome, printed) = tokio::join!(agent.run_turn(session, utterance, tx), printer);
        if let Err(e) = outcome {
            debug!(error = %e, "Turn ended without an answer");
        }
        printed
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        if let Err(e) = self.session.save_todos() {
            warn!(error = %e, "Final save failed");
            self.write_line(&format!("Error saving to-do list: {e}")).await?;
        }
        self.write_line("Exiting the program. Goodbye!").await
    }

    async fn write(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await
    }

    async fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }
}
