use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use wf_client::{ByteStream, ChatSession, ChatTransport, ClientError};
use wf_domain::turn::{ChatApiRequest, TurnKind, UserProfile};

// ── Scripted transport ─────────────────────────────────────────────

type Reply = Result<Vec<Result<Bytes, ClientError>>, ClientError>;

#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatApiRequest>>,
}

impl ScriptedTransport {
    fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::default(),
        }
    }

    fn chunks(parts: &[&str]) -> Reply {
        Ok(parts
            .iter()
            .map(|p| Ok(Bytes::copy_from_slice(p.as_bytes())))
            .collect())
    }
}

#[async_trait::async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open(&self, request: &ChatApiRequest) -> Result<ByteStream, ClientError> {
        self.requests.lock().push(request.clone());
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Http("no scripted reply".into())));
        reply.map(|items| Box::pin(stream::iter(items)) as ByteStream)
    }
}

/// Body chunks arrive only when the test pushes them.
struct ChannelTransport {
    rx: Mutex<Option<mpsc::UnboundedReceiver<Result<Bytes, ClientError>>>>,
}

#[async_trait::async_trait]
impl ChatTransport for ChannelTransport {
    async fn open(&self, _request: &ChatApiRequest) -> Result<ByteStream, ClientError> {
        let rx = self
            .rx
            .lock()
            .take()
            .ok_or_else(|| ClientError::Http("already opened".into()))?;
        let body = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(Box::pin(body))
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn response_turn_grows_with_each_chunk() {
    let reply = ScriptedTransport::chunks(&["Hel", "lo ", "world"]);
    let transport = Arc::new(ScriptedTransport::new(vec![reply]));
    let session = ChatSession::new(transport.clone());

    let mut seen = Vec::new();
    let reply = session
        .send_with("  hi  ", |turn| seen.push(turn.content.clone()))
        .await
        .unwrap();

    assert_eq!(seen, vec!["Hel", "Hello ", "Hello world"]);

    let turns = session.turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].id.to_string(), "user_0");
    assert_eq!(turns[0].content, "hi");
    assert!(turns[0].is_user);
    assert_eq!(turns[1].id, reply);
    assert_eq!(reply.to_string(), "ai_1");
    assert_eq!(turns[1].content, "Hello world");
    assert!(!session.is_loading());
    assert_eq!(session.error(), None);
}

#[tokio::test]
async fn split_multibyte_character_is_reassembled() {
    let bytes = "Olé 🗺".as_bytes();
    let chunks: Vec<Result<Bytes, ClientError>> = bytes
        .chunks(1)
        .map(|b| Ok(Bytes::copy_from_slice(b)))
        .collect();
    let transport = Arc::new(ScriptedTransport::new(vec![Ok(chunks)]));
    let session = ChatSession::new(transport.clone());

    let reply = session.send("hola").await.unwrap();
    assert_eq!(session.turn(reply).unwrap().content, "Olé 🗺");
}

#[tokio::test]
async fn mid_read_failure_keeps_partial_content() {
    let transport = Arc::new(ScriptedTransport::new(vec![Ok(vec![
        Ok(Bytes::from_static(b"Paris is ")),
        Err(ClientError::Stream("connection reset".into())),
    ])]));
    let session = ChatSession::new(transport.clone());

    let err = session.send("capital of France?").await.unwrap_err();
    assert_eq!(err, ClientError::Stream("connection reset".into()));

    let turns = session.turns();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[1].id.kind(), TurnKind::Ai);
    assert_eq!(turns[1].content, "Paris is ");
    let errors: Vec<_> = turns.iter().filter(|t| t.is_error()).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].content, "❌ stream interrupted: connection reset");
    assert!(!errors[0].is_user);
    assert_eq!(session.error().as_deref(), Some("stream interrupted: connection reset"));
    assert!(!session.is_loading());
}

#[tokio::test]
async fn error_status_records_error_turn_without_reply() {
    let transport = Arc::new(ScriptedTransport::new(vec![Err(ClientError::Status(500))]));
    let session = ChatSession::new(transport.clone());

    let err = session.send("hello").await.unwrap_err();
    assert_eq!(err, ClientError::Status(500));

    let turns = session.turns();
    assert_eq!(turns.len(), 2);
    assert!(turns[0].is_user);
    assert!(turns[1].is_error());
    assert_eq!(turns[1].content, "❌ HTTP error! status: 500");
}

#[tokio::test]
async fn empty_input_is_rejected_without_request() {
    let transport = Arc::new(ScriptedTransport::new(vec![]));
    let session = ChatSession::new(transport.clone());

    let err = session.send("   \n").await.unwrap_err();
    assert_eq!(err, ClientError::EmptyInput);
    assert!(err.is_rejection());
    assert!(session.turns().is_empty());
    assert!(transport.requests.lock().is_empty());
}

#[tokio::test]
async fn send_while_loading_is_rejected() {
    let (tx, rx) = mpsc::unbounded_channel();
    let transport = ChannelTransport {
        rx: Mutex::new(Some(rx)),
    };
    let session = ChatSession::new(transport);

    let first = session.send("first");
    let second = async {
        tokio::task::yield_now().await;
        assert!(session.is_loading());
        let rejected = session.send("second").await;
        tx.send(Ok(Bytes::from_static(b"done"))).unwrap();
        drop(tx);
        rejected
    };

    let (first, second) = tokio::join!(first, second);
    assert_eq!(second.unwrap_err(), ClientError::Busy);
    let reply = first.unwrap();

    let turns = session.turns();
    assert_eq!(turns.len(), 2, "the rejected send must not add turns");
    assert_eq!(turns[0].content, "first");
    assert_eq!(session.turn(reply).unwrap().content, "done");
    assert!(!session.is_loading());
}

#[tokio::test]
async fn history_excludes_error_turns_and_new_message() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        ScriptedTransport::chunks(&["Hi Ada!"]),
        Err(ClientError::Status(503)),
        ScriptedTransport::chunks(&["Sure."]),
    ]));
    let profile = UserProfile {
        name: Some("Ada".into()),
        ..Default::default()
    };
    let session = ChatSession::new(transport.clone()).with_profile(profile.clone());

    session.send("hello").await.unwrap();
    session.send("are you there?").await.unwrap_err();
    session.send("tell me about Peru").await.unwrap();

    let requests = transport.requests.lock();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].conversation_history.is_empty());
    assert_eq!(requests[0].user_answers.as_ref(), Some(&profile));

    let last = &requests[2];
    assert_eq!(last.message, "tell me about Peru");
    let history: Vec<(&str, bool)> = last
        .conversation_history
        .iter()
        .map(|h| (h.content.as_str(), h.is_user))
        .collect();
    assert_eq!(
        history,
        vec![("hello", true), ("Hi Ada!", false), ("are you there?", true)]
    );
}

#[tokio::test]
async fn error_flag_clears_on_request_and_on_next_send() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        Err(ClientError::Http("refused".into())),
        Err(ClientError::Http("refused".into())),
        ScriptedTransport::chunks(&["ok"]),
    ]));
    let session = ChatSession::new(transport.clone());

    session.send("one").await.unwrap_err();
    assert!(session.error().is_some());
    session.clear_error();
    assert!(session.error().is_none());
    // Error turns stay visible after clearing the flag.
    assert_eq!(session.turns().iter().filter(|t| t.is_error()).count(), 1);

    session.send("two").await.unwrap_err();
    assert!(session.error().is_some());
    session.send("three").await.unwrap();
    assert!(session.error().is_none());
}

#[tokio::test]
async fn reset_restarts_ids() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        ScriptedTransport::chunks(&["a"]),
        ScriptedTransport::chunks(&["b"]),
    ]));
    let session = ChatSession::new(transport.clone());

    session.send("first").await.unwrap();
    session.reset();
    assert!(session.turns().is_empty());

    let reply = session.send("again").await.unwrap();
    let turns = session.turns();
    assert_eq!(turns[0].id.to_string(), "user_0");
    assert_eq!(reply.to_string(), "ai_1");
    assert!(transport.requests.lock()[1].conversation_history.is_empty());
}
