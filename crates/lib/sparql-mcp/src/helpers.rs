use std::borrow::Cow;

use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content, ErrorCode};
use sparql_core::ToolReply;
use sparql_core::dispatch::ReplyContent;

pub fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

pub fn into_call_result(reply: ToolReply) -> CallToolResult {
    let content = reply
        .content
        .into_iter()
        .map(|item| match item {
            ReplyContent::Text { text } => Content::text(text),
        })
        .collect();
    if reply.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}
