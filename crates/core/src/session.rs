//! Conversation state for one interactive session.

use crate::context::{ContextAssembler, ExtractedContext};
use crate::gateway::{ApiKey, ChatGateway, ChatMessage, ChatRequest, MessageRole};
use crate::types::Document;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

const BASE_INSTRUCTIONS: &str =
    "You are a helpful AI assistant specialized in analyzing presentations and documents.";

const NO_DOCUMENT_INSTRUCTIONS: &str = "Please help the user with their questions.";

const DOCUMENT_GUIDANCE: &str = "Please provide detailed, accurate responses about the document content. \
When referencing specific slides, mention the slide number. \
If asked about specific details, provide comprehensive information from the relevant slides.";

const TRIMMED_GUIDANCE: &str = "The document is too large to include in full, so some slides are condensed to their title and an excerpt. \
If you need information from a condensed slide, ask the user to name the slides they are interested in.";

/// Who wrote a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn message_role(self) -> MessageRole {
        match self {
            Role::User => MessageRole::User,
            Role::Assistant => MessageRole::Assistant,
        }
    }
}

/// One message of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// The active document, its derived context, the chat history and the credential.
#[derive(Debug, Default)]
pub struct Session {
    assembler: ContextAssembler,
    document: Option<Document>,
    context: Option<ExtractedContext>,
    turns: Vec<ChatTurn>,
    credential: Option<ApiKey>,
}

impl Session {
    pub fn new(assembler: ContextAssembler) -> Self {
        Self {
            assembler,
            ..Self::default()
        }
    }

    /// Replace the active document.
    ///
    /// Regenerates the context and clears the chat history, since earlier
    /// answers referred to the previous document.
    pub fn load_document(&mut self, document: Document) -> &ExtractedContext {
        log::info!("Loaded document '{}'", document.filename);
        self.turns.clear();
        let context = self.context.insert(self.assembler.assemble(&document));
        self.document = Some(document);
        context
    }

    /// Drop the active document and the chat history.
    pub fn clear_document(&mut self) {
        self.document = None;
        self.context = None;
        self.turns.clear();
    }

    /// Clear the chat history and document. The credential is kept.
    pub fn reset(&mut self) {
        self.clear_document();
    }

    pub fn add_user_turn(&mut self, text: impl Into<String>) {
        self.turns.push(ChatTurn::user(text));
    }

    pub fn add_assistant_turn(&mut self, text: impl Into<String>) {
        self.turns.push(ChatTurn::assistant(text));
    }

    pub fn set_credential(&mut self, credential: Option<ApiKey>) {
        self.credential = credential;
    }

    pub fn credential(&self) -> Option<&ApiKey> {
        self.credential.as_ref()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn context(&self) -> Option<&ExtractedContext> {
        self.context.as_ref()
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// The request for the current history: the system context followed by every turn.
    pub fn build_request(&self) -> ChatRequest {
        self.request_with(self.context.as_ref(), None)
    }

    /// Send a user message and record the exchange.
    ///
    /// The history is only modified when the gateway returns a reply, so a
    /// failed message can be resent as is.
    pub fn send<G>(&mut self, gateway: &G, text: &str) -> Result<&ChatTurn>
    where
        G: ChatGateway + ?Sized,
    {
        let credential = self
            .credential
            .as_ref()
            .ok_or_else(|| Error::Auth("no API key configured".to_string()))?;

        let focused = self.focused_context(text);
        let context = focused.as_ref().or(self.context.as_ref());
        let request = self.request_with(context, Some(text));

        log::debug!("Sending {} messages", request.messages.len());
        let reply = gateway.send(&request, credential)?;

        self.add_user_turn(text);
        self.add_assistant_turn(reply);
        Ok(&self.turns[self.turns.len() - 1])
    }

    /// A context re-assembled around the slides `text` mentions, when the
    /// full document does not fit the budget.
    fn focused_context(&self, text: &str) -> Option<ExtractedContext> {
        let document = self.document.as_ref()?;
        if !self.context.as_ref()?.truncated {
            return None;
        }
        document.deck()?;
        Some(self.assembler.assemble_for_query(document, text))
    }

    fn request_with(&self, context: Option<&ExtractedContext>, pending: Option<&str>) -> ChatRequest {
        let mut messages = vec![ChatMessage::new(
            MessageRole::System,
            self.system_prompt(context),
        )];
        messages.extend(
            self.turns
                .iter()
                .map(|turn| ChatMessage::new(turn.role.message_role(), turn.text.clone())),
        );
        if let Some(text) = pending {
            messages.push(ChatMessage::new(MessageRole::User, text));
        }
        ChatRequest { messages }
    }

    fn system_prompt(&self, context: Option<&ExtractedContext>) -> String {
        let (Some(document), Some(context)) = (self.document.as_ref(), context) else {
            return format!("{} {}", BASE_INSTRUCTIONS, NO_DOCUMENT_INSTRUCTIONS);
        };

        let mut prompt = format!(
            "{}\n\nHere is the content from the user's uploaded document ({}):\n{}\n\n",
            BASE_INSTRUCTIONS, document.filename, context.text
        );
        if context.truncated {
            prompt.push_str(TRIMMED_GUIDANCE);
            prompt.push_str("\n\n");
        }
        prompt.push_str(DOCUMENT_GUIDANCE);
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Deck, DocumentKind, Slide};
    use std::cell::RefCell;

    /// Gateway that replays a fixed outcome and remembers the last request.
    struct ScriptedGateway {
        outcome: fn() -> Result<String>,
        last_request: RefCell<Option<ChatRequest>>,
    }

    impl ScriptedGateway {
        fn new(outcome: fn() -> Result<String>) -> Self {
            Self {
                outcome,
                last_request: RefCell::new(None),
            }
        }
    }

    impl ChatGateway for ScriptedGateway {
        fn send(&self, request: &ChatRequest, _credential: &ApiKey) -> Result<String> {
            *self.last_request.borrow_mut() = Some(request.clone());
            (self.outcome)()
        }
    }

    fn session_with_key() -> Session {
        let mut session = Session::new(ContextAssembler::new());
        session.set_credential(ApiKey::new("sk-test"));
        session
    }

    fn text_doc(text: &str) -> Document {
        Document::text("notes.txt", DocumentKind::Text, text)
    }

    #[test]
    fn test_build_request_injects_context_once() {
        let mut session = session_with_key();
        session.load_document(text_doc("The launch is in March."));
        session.add_user_turn("When is the launch?");
        session.add_assistant_turn("March.");

        let request = session.build_request();
        let roles: Vec<MessageRole> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::System, MessageRole::User, MessageRole::Assistant]
        );
        assert!(request.messages[0].content.contains("The launch is in March."));
        assert!(request.messages[0].content.contains("notes.txt"));
        assert_eq!(
            request
                .messages
                .iter()
                .filter(|m| m.content.contains("The launch is in March."))
                .count(),
            1
        );
    }

    #[test]
    fn test_build_request_without_document() {
        let session = session_with_key();
        let request = session.build_request();

        assert_eq!(request.messages.len(), 1);
        assert!(request.messages[0]
            .content
            .ends_with("Please help the user with their questions."));
    }

    #[test]
    fn test_send_records_both_turns() {
        let mut session = session_with_key();
        let gateway = ScriptedGateway::new(|| Ok("Hello!".to_string()));

        let reply = session.send(&gateway, "Hi").unwrap();
        assert_eq!(reply, &ChatTurn::assistant("Hello!"));
        assert_eq!(session.turns(), &[ChatTurn::user("Hi"), ChatTurn::assistant("Hello!")]);

        let sent = gateway.last_request.borrow().clone().unwrap();
        assert_eq!(sent.messages.last().unwrap(), &ChatMessage::new(MessageRole::User, "Hi"));
    }

    #[test]
    fn test_failed_send_leaves_turns_unchanged() {
        let mut session = session_with_key();
        session.add_user_turn("earlier");
        session.add_assistant_turn("answer");

        let outcomes: [fn() -> Result<String>; 3] = [
            || Err(Error::Network("connection reset".into())),
            || Err(Error::RateLimit("too many requests".into())),
            || Err(Error::Auth("invalid key".into())),
        ];
        for outcome in outcomes {
            let gateway = ScriptedGateway::new(outcome);
            let before = session.turns().len();
            assert!(session.send(&gateway, "retry me").is_err());
            assert_eq!(session.turns().len(), before);
        }
    }

    #[test]
    fn test_send_without_credential_is_auth_error() {
        let mut session = Session::new(ContextAssembler::new());
        let gateway = ScriptedGateway::new(|| Ok("unreachable".to_string()));

        match session.send(&gateway, "Hi") {
            Err(Error::Auth(_)) => {}
            other => panic!("expected Auth error, got {other:?}"),
        }
        assert!(gateway.last_request.borrow().is_none());
        assert!(session.turns().is_empty());
    }

    #[test]
    fn test_loading_document_clears_history() {
        let mut session = session_with_key();
        session.load_document(text_doc("first"));
        session.add_user_turn("question");

        let context = session.load_document(text_doc("second"));
        assert_eq!(context.text, "second");
        assert!(session.turns().is_empty());
    }

    #[test]
    fn test_reset_keeps_credential() {
        let mut session = session_with_key();
        session.load_document(text_doc("doc"));
        session.add_user_turn("q");

        session.reset();
        assert!(session.document().is_none());
        assert!(session.context().is_none());
        assert!(session.turns().is_empty());
        assert!(session.credential().is_some());
    }

    #[test]
    fn test_send_focuses_oversized_deck_on_referenced_slide() {
        let slides: Vec<Slide> = (1..=6)
            .map(|i| {
                let mut slide = Slide::new(i);
                slide.body_text = (1..=4)
                    .map(|l| format!("slide {} line {} padded with some extra words", i, l))
                    .collect();
                slide
            })
            .collect();
        let doc = Document::presentation(
            "deck.pptx",
            Deck {
                slides,
                failures: Vec::new(),
            },
        );

        let mut session = Session::new(ContextAssembler::new().with_max_chars(700));
        session.set_credential(ApiKey::new("sk-test"));
        assert!(session.load_document(doc).truncated);

        let gateway = ScriptedGateway::new(|| Ok("ok".to_string()));
        session.send(&gateway, "Tell me about slide 6").unwrap();

        let sent = gateway.last_request.borrow().clone().unwrap();
        let system = &sent.messages[0].content;
        assert!(system.contains("slide 6 line 4"));
        assert!(system.contains("condensed"));
    }
}
