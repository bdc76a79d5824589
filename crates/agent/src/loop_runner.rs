//! The agent loop implementation.

use std::sync::Arc;

use jarvis_core::engine::{DecisionEngine, DecisionRequest, ToolDefinition, Usage};
use jarvis_core::message::{Conversation, Message, MessageToolCall};
use jarvis_core::session::Session;
use jarvis_core::tool::{ToolCall, ToolRegistry, ToolResult};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::prompt;
use crate::stream_event::AgentStreamEvent;

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Where a turn currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingDecision,
    ExecutingTool,
    Answered,
}

/// One tool invocation and the observation it produced.
#[derive(Debug, Clone)]
pub struct ToolStep {
    pub call: ToolCall,
    pub result: ToolResult,
}

/// The outcome of a completed turn.
#[derive(Debug, Clone)]
pub struct AgentTurn {
    pub utterance: String,

    /// The text streamed to the user as the final answer
    pub answer: String,

    /// Tool invocations in the order they ran
    pub steps: Vec<ToolStep>,

    /// Number of engine queries made
    pub iterations: usize,

    /// True when the loop gave up instead of the engine answering
    pub hit_iteration_limit: bool,

    pub usage: Option<Usage>,
}

/// What the engine proposed in one streamed decision.
#[derive(Debug, Default)]
struct Proposal {
    text: String,
    tool_calls: Vec<MessageToolCall>,
    usage: Option<Usage>,
}

/// Drives one turn: query the engine, run the tools it asks for, feed the
/// observations back, and stop once it answers in plain text.
pub struct AgentLoop {
    engine: Arc<dyn DecisionEngine>,

    model: String,

    temperature: f32,

    max_tokens: Option<u32>,

    tools: Arc<ToolRegistry>,

    /// Engine queries allowed per turn
    max_iterations: usize,
}

impl AgentLoop {
    pub fn new(
        engine: Arc<dyn DecisionEngine>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            engine,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the per-turn bound on engine queries. Clamped to at least one.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Run one turn for `utterance`.
    ///
    /// Events are sent on `events` as they happen; the sender is dropped
    /// when the turn ends, which closes the channel. An engine failure is
    /// reported both as an [`AgentStreamEvent::Error`] and as the returned
    /// error. Tool failures never end the turn.
    pub async fn run_turn(
        &self,
        session: &mut Session,
        utterance: &str,
        events: mpsc::Sender<AgentStreamEvent>,
    ) -> Result<AgentTurn, AgentError> {
        match self.drive(session, utterance, &events).await {
            Ok(turn) => {
                emit(
                    &events,
                    AgentStreamEvent::Done {
                        usage: turn.usage,
                        iterations: turn.iterations,
                        tool_calls_made: turn.steps.len(),
                    },
                )
                .await;
                Ok(turn)
            }
            Err(e) => {
                warn!(engine = self.engine.name(), error = %e, "Turn failed");
                emit(
                    &events,
                    AgentStreamEvent::Error {
                        message: e.to_string(),
                    },
                )
                .await;
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        session: &mut Session,
        utterance: &str,
        events: &mpsc::Sender<AgentStreamEvent>,
    ) -> Result<AgentTurn, AgentError> {
        let system = prompt::system_prompt(session.assistant_name(), prompt::today());
        let mut conversation = Conversation::for_turn(system, utterance);
        let definitions = self.tools.definitions();
        let mut steps = Vec::new();
        let mut usage = None;
        let mut state = LoopState::AwaitingDecision;

        info!(
            engine = self.engine.name(),
            model = %self.model,
            tools = definitions.len(),
            "Starting turn"
        );

        for iteration in 1..=self.max_iterations {
            debug!(iteration, "Agent loop iteration");

            let proposal = self.propose(&conversation, &definitions, events).await?;
            usage = merge_usage(usage, proposal.usage);

            if proposal.tool_calls.is_empty() {
                advance(&mut state, LoopState::Answered);
                conversation.push(Message::assistant(proposal.text.as_str()));
                info!(
                    iterations = iteration,
                    tool_calls = steps.len(),
                    "Turn answered"
                );
                return Ok(AgentTurn {
                    utterance: utterance.to_string(),
                    answer: proposal.text,
                    steps,
                    iterations: iteration,
                    hit_iteration_limit: false,
                    usage,
                });
            }

            advance(&mut state, LoopState::ExecutingTool);
            conversation.push(Message::assistant_tool_calls(
                proposal.text,
                proposal.tool_calls.clone(),
            ));
            for requested in proposal.tool_calls {
                let step = self.execute(requested, session, events).await;
                conversation.push(Message::tool_result(
                    step.result.call_id.as_str(),
                    step.result.output.as_str(),
                ));
                steps.push(step);
            }
            advance(&mut state, LoopState::AwaitingDecision);
        }

        warn!(
            max_iterations = self.max_iterations,
            tool_calls = steps.len(),
            "Iteration limit reached, ending turn without an answer"
        );
        let answer = limit_message(self.max_iterations);
        emit(
            events,
            AgentStreamEvent::Chunk {
                content: answer.clone(),
            },
        )
        .await;

        Ok(AgentTurn {
            utterance: utterance.to_string(),
            answer,
            steps,
            iterations: self.max_iterations,
            hit_iteration_limit: true,
            usage,
        })
    }

    /// Query the engine in streaming mode, forwarding text as it arrives.
    async fn propose(
        &self,
        conversation: &Conversation,
        tools: &[ToolDefinition],
        events: &mpsc::Sender<AgentStreamEvent>,
    ) -> Result<Proposal, AgentError> {
        let request = DecisionRequest {
            model: self.model.clone(),
            messages: conversation.messages.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: tools.to_vec(),
        };

        let mut stream = self.engine.stream(request).await?;
        let mut proposal = Proposal::default();

        while let Some(chunk) = stream.recv().await {
            let chunk = chunk?;
            if let Some(content) = chunk.content.filter(|c| !c.is_empty()) {
                proposal.text.push_str(&content);
                emit(events, AgentStreamEvent::Chunk { content }).await;
            }
            proposal.tool_calls.extend(chunk.tool_calls);
            if chunk.usage.is_some() {
                proposal.usage = chunk.usage;
            }
            if chunk.done {
                break;
            }
        }

        Ok(proposal)
    }

    async fn execute(
        &self,
        requested: MessageToolCall,
        session: &mut Session,
        events: &mpsc::Sender<AgentStreamEvent>,
    ) -> ToolStep {
        let arguments = parse_arguments(&requested);
        let call = ToolCall {
            id: requested.id,
            name: requested.name,
            arguments,
        };

        emit(
            events,
            AgentStreamEvent::ToolCall {
                id: call.id.clone(),
                name: call.name.clone(),
                input: call.arguments.clone(),
            },
        )
        .await;

        debug!(tool = %call.name, call_id = %call.id, "Executing tool");
        let result = self.tools.execute(&call, session).await;
        if !result.success {
            warn!(tool = %call.name, output = %result.output, "Tool reported an error");
        }

        emit(
            events,
            AgentStreamEvent::ToolResult {
                id: result.call_id.clone(),
                name: result.name.clone(),
                output: result.output.clone(),
                success: result.success,
            },
        )
        .await;

        ToolStep { call, result }
    }
}

fn advance(state: &mut LoopState, next: LoopState) {
    debug!(from = ?*state, to = ?next, "Loop state transition");
    *state = next;
}

/// Arguments that are blank or not valid JSON become an empty object, so
/// the tool reports which parameter is missing.
fn parse_arguments(call: &MessageToolCall) -> Value {
    if call.arguments.trim().is_empty() {
        return Value::Object(Map::new());
    }
    match serde_json::from_str(&call.arguments) {
        Ok(value) => value,
        Err(e) => {
            warn!(tool = %call.name, error = %e, "Tool arguments are not valid JSON");
            Value::Object(Map::new())
        }
    }
}

fn merge_usage(total: Option<Usage>, next: Option<Usage>) -> Option<Usage> {
    match (total, next) {
        (Some(a), Some(b)) => Some(Usage {
            prompt_tokens: a.prompt_tokens.saturating_add(b.prompt_tokens),
            completion_tokens: a.completion_tokens.saturating_add(b.completion_tokens),
            total_tokens: a.total_tokens.saturating_add(b.total_tokens),
        }),
        (a, b) => a.or(b),
    }
}

fn limit_message(max_iterations: usize) -> String {
    format!(
        "I'm sorry, I was unable to complete that request within {max_iterations} steps. \
         Could you try breaking it into smaller requests?"
    )
}

async fn emit(events: &mpsc::Sender<AgentStreamEvent>, event: AgentStreamEvent) {
    if events.send(event).await.is_err() {
        debug!("Event receiver dropped");
    }
}
