//! Incremental decoder for chat-completions server-sent events.
//!
//! Bytes arrive in arbitrary slices; the decoder buffers partial lines
//! (including split UTF-8 sequences), turns content deltas into
//! [`StreamChunk`]s as soon as they are complete, and assembles tool-call
//! deltas until the stream ends. Only `[DONE]` or the end of the body
//! finishes a stream; usage reports are kept for the terminal chunk.

use jarvis_core::engine::{StreamChunk, Usage};
use jarvis_core::message::MessageToolCall;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::trace;

/// Stateful SSE decoder. Feed it bytes; collect chunks.
#[derive(Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    calls: BTreeMap<u32, ToolCallAccumulator>,
    usage: Option<Usage>,
    finished: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the terminal chunk has been produced.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Consume a slice of the response body and return every chunk it
    /// completes, in order. After the terminal chunk, further input is ignored.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamChunk> {
        let mut out = Vec::new();
        if self.finished {
            return out;
        }
        self.buffer.extend_from_slice(bytes);

        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            self.handle_line(line, &mut out);
            if self.finished {
                self.buffer.clear();
                break;
            }
        }
        out
    }

    /// Terminal chunk for a body that ended without `[DONE]`.
    pub fn finish(&mut self) -> StreamChunk {
        self.terminal()
    }

    fn handle_line(&mut self, line: &str, out: &mut Vec<StreamChunk>) {
        // Skip empty lines and SSE comments
        if line.is_empty() || line.starts_with(':') {
            return;
        }
        let Some(data) = line.strip_prefix("data:") else {
            return;
        };
        let data = data.trim();

        if data == "[DONE]" {
            out.push(self.terminal());
            return;
        }

        let event: StreamResponse = match serde_json::from_str(data) {
            Ok(event) => event,
            Err(e) => {
                trace!(data = %data, error = %e, "Ignoring unparseable SSE chunk");
                return;
            }
        };

        if let Some(choice) = event.choices.into_iter().next() {
            if let Some(reason) = choice.finish_reason.as_deref() {
                trace!(reason, "Choice finished");
            }
            for (position, delta) in choice.delta.tool_calls.unwrap_or_default().into_iter().enumerate() {
                let index = delta.index.unwrap_or(position as u32);
                let acc = self.calls.entry(index).or_default();
                if let Some(id) = delta.id.filter(|id| !id.is_empty()) {
                    acc.id = id;
                }
                if let Some(func) = delta.function {
                    if let Some(name) = func.name {
                        acc.name = name;
                    }
                    if let Some(args) = func.arguments {
                        acc.arguments.push_str(&args);
                    }
                }
            }

            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                out.push(StreamChunk {
                    content: Some(content),
                    ..StreamChunk::default()
                });
            }
        }

        // Some endpoints report usage on every chunk; the latest report wins.
        if let Some(usage) = event.usage {
            self.usage = Some(usage.into());
        }
    }

    fn terminal(&mut self) -> StreamChunk {
        self.finished = true;
        let usage = self.usage.take();
        let tool_calls = std::mem::take(&mut self.calls)
            .into_iter()
            .map(|(index, acc)| acc.into_tool_call(index))
            .collect();
        StreamChunk {
            content: None,
            tool_calls,
            done: true,
            usage,
        }
    }
}

/// Accumulates incremental tool call deltas into a complete tool call.
#[derive(Debug, Default)]
struct ToolCallAccumulator {
    id: String,
    name: String,
    arguments: String,
}

impl ToolCallAccumulator {
    fn into_tool_call(self, index: u32) -> MessageToolCall {
        // Some endpoints omit ids on streamed calls
        let id = if self.id.is_empty() {
            format!("call_{index}")
        } else {
            self.id
        };
        MessageToolCall {
            id,
            name: self.name,
            arguments: self.arguments,
        }
    }
}

// --- Streaming wire types ---

/// A single SSE `data: {...}` event.
#[derive(Debug, Deserialize)]
pub(crate) struct StreamResponse {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    #[serde(default)]
    pub usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamChoice {
    #[serde(default)]
    pub delta: StreamDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StreamDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<StreamToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamToolCallDelta {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<StreamFunctionDelta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamFunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct ApiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl From<ApiUsage> for Usage {
    fn from(u: ApiUsage) -> Self {
        Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(chunks: &[StreamChunk]) -> Vec<&str> {
        chunks.iter().filter_map(|c| c.content.as_deref()).collect()
    }

    #[test]
    fn content_deltas_in_order() {
        let mut dec = SseDecoder::new();
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"},\"finish_reason\":null}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo!\"},\"finish_reason\":null}]}\n\n",
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );
        let chunks = dec.feed(body.as_bytes());
        assert_eq!(contents(&chunks), vec!["Hel", "lo!"]);
        let last = chunks.last().unwrap();
        assert!(last.done);
        assert!(last.tool_calls.is_empty());
        assert!(dec.is_finished());
    }

    #[test]
    fn lines_split_across_reads() {
        let mut dec = SseDecoder::new();
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"héllo\"}}]}\n";
        let bytes = line.as_bytes();
        // Split inside the two-byte 'é'
        let split = line.find('é').unwrap() + 1;
        assert!(dec.feed(&bytes[..split]).is_empty());
        let chunks = dec.feed(&bytes[split..]);
        assert_eq!(contents(&chunks), vec!["héllo"]);
    }

    #[test]
    fn tool_call_deltas_assemble() {
        let mut dec = SseDecoder::new();
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_abc\",\"function\":{\"name\":\"divide\",\"arguments\":\"\"}}]}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"a\\\": 10,\"}}]}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\" \\\"b\\\": 0}\"}}]}}]}\n",
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"tool_calls\"}]}\n",
            "data: [DONE]\n",
        );
        let chunks = dec.feed(body.as_bytes());
        assert_eq!(chunks.len(), 1);
        let calls = &chunks[0].tool_calls;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_abc");
        assert_eq!(calls[0].name, "divide");
        assert_eq!(calls[0].arguments, "{\"a\": 10, \"b\": 0}");
    }

    #[test]
    fn parallel_calls_keep_index_order() {
        let mut dec = SseDecoder::new();
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":1,\"id\":\"b\",\"function\":{\"name\":\"second\",\"arguments\":\"{}\"}},{\"index\":0,\"id\":\"a\",\"function\":{\"name\":\"first\",\"arguments\":\"{}\"}}]}}]}\n",
            "data: [DONE]\n",
        );
        let chunks = dec.feed(body.as_bytes());
        let names: Vec<&str> = chunks[0].tool_calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn missing_index_and_id_are_filled() {
        let mut dec = SseDecoder::new();
        let body = "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"function\":{\"name\":\"tell_joke\",\"arguments\":\"{}\"}}]}}]}\n";
        assert!(dec.feed(body.as_bytes()).is_empty());
        let last = dec.finish();
        assert!(last.done);
        assert_eq!(last.tool_calls[0].id, "call_0");
        assert_eq!(last.tool_calls[0].name, "tell_joke");
    }

    #[test]
    fn usage_lands_on_the_terminal_chunk() {
        let mut dec = SseDecoder::new();
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n",
            "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":10,\"completion_tokens\":5,\"total_tokens\":15}}\n",
            "data: [DONE]\n",
        );
        let chunks = dec.feed(body.as_bytes());
        assert_eq!(contents(&chunks), vec!["Hi"]);
        let last = chunks.last().unwrap();
        assert!(last.done);
        assert_eq!(last.usage.unwrap().total_tokens, 15);
        assert!(dec.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n").is_empty());
    }

    #[test]
    fn usage_on_content_chunks_does_not_end_the_stream() {
        let mut dec = SseDecoder::new();
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}],\"usage\":{\"prompt_tokens\":10,\"completion_tokens\":1,\"total_tokens\":11}}\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"c1\",\"function\":{\"name\":\"add\",\"arguments\":\"{}\"}}]}}],\"usage\":{\"prompt_tokens\":10,\"completion_tokens\":2,\"total_tokens\":12}}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo there\"}}],\"usage\":{\"prompt_tokens\":10,\"completion_tokens\":3,\"total_tokens\":13}}\n",
        );
        let chunks = dec.feed(body.as_bytes());
        assert_eq!(contents(&chunks).concat(), "Hello there");
        assert!(chunks.iter().all(|c| !c.done));
        assert!(!dec.is_finished());

        let last = dec.feed(b"data: [DONE]\n").pop().unwrap();
        assert!(last.done);
        assert_eq!(last.tool_calls.len(), 1);
        assert_eq!(last.tool_calls[0].name, "add");
        assert_eq!(last.usage.unwrap().total_tokens, 13);
    }

    #[test]
    fn body_end_carries_usage() {
        let mut dec = SseDecoder::new();
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}],\"usage\":{\"prompt_tokens\":1,\"completion_tokens\":1,\"total_tokens\":2}}\n";
        assert_eq!(contents(&dec.feed(body.as_bytes())), vec!["ok"]);
        let last = dec.finish();
        assert!(last.done);
        assert_eq!(last.usage.unwrap().total_tokens, 2);
    }

    #[test]
    fn comments_and_garbage_are_skipped() {
        let mut dec = SseDecoder::new();
        let body = ": keep-alive\nevent: ping\ndata: not json\ndata: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n";
        let chunks = dec.feed(body.as_bytes());
        assert_eq!(contents(&chunks), vec!["ok"]);
    }

    #[test]
    fn parse_empty_delta() {
        let data = r#"{"choices":[{"delta":{},"finish_reason":null}]}"#;
        let parsed: StreamResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.choices[0].delta.content.is_none());
        assert!(parsed.choices[0].delta.tool_calls.is_none());
        assert!(parsed.choices[0].finish_reason.is_none());
    }
}
