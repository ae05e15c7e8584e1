//! Scripted status channel.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use sacola::ids::OrderId;
use tokio_tungstenite::tungstenite;

use crate::domain::tracking::{ChannelError, StatusChannel, StatusStream};

/// One step a scripted stream plays back.
#[derive(Debug, Clone)]
pub(crate) enum ScriptStep {
    /// Deliver a text message.
    Message(String),

    /// Pause before the next step.
    Wait(Duration),

    /// Fail the stream.
    Fail,

    /// Stay open until closed.
    Hold,
}

impl ScriptStep {
    pub(crate) fn message(text: &str) -> Self {
        Self::Message(text.to_string())
    }
}

#[derive(Debug, Clone)]
enum Connection {
    Refuse,
    Stream(Vec<ScriptStep>),
}

/// Channel that answers successive connects from a script. Once the script
/// runs out every connect is refused.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedChannel {
    script: Arc<Mutex<VecDeque<Connection>>>,
    connects: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedChannel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Refuse the next connect.
    pub(crate) fn refuse(self) -> Self {
        self.push(Connection::Refuse)
    }

    /// Accept the next connect and play `steps`; the stream ends after the
    /// last step.
    pub(crate) fn stream(self, steps: Vec<ScriptStep>) -> Self {
        self.push(Connection::Stream(steps))
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn push(self, connection: Connection) -> Self {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(connection);

        self
    }
}

fn closed() -> ChannelError {
    ChannelError::Transport(tungstenite::Error::ConnectionClosed)
}

#[async_trait]
impl StatusChannel for ScriptedChannel {
    async fn connect(&self, _order: OrderId) -> Result<Box<dyn StatusStream>, ChannelError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().expect("script lock poisoned").pop_front();

        match next {
            Some(Connection::Stream(steps)) => Ok(Box::new(ScriptedStream {
                steps: steps.into(),
                closes: Arc::clone(&self.closes),
            })),
            Some(Connection::Refuse) | None => Err(closed()),
        }
    }
}

struct ScriptedStream {
    steps: VecDeque<ScriptStep>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl StatusStream for ScriptedStream {
    async fn next_message(&mut self) -> Option<Result<String, ChannelError>> {
        loop {
            match self.steps.pop_front()? {
                ScriptStep::Message(text) => return Some(Ok(text)),
                ScriptStep::Wait(delay) => tokio::time::sleep(delay).await,
                ScriptStep::Fail => return Some(Err(closed())),
                ScriptStep::Hold => {
                    self.steps.push_front(ScriptStep::Hold);
                    std::future::pending::<()>().await;
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.closes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }
}
