use chrono::{DateTime, Utc};
use eyre::{Result, bail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three wizard steps: URL entry, first question, running chat
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    #[default]
    Url,
    Question,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One user session: the current step, the fetched transcript, and the
/// append-only conversation. Nothing here survives a reset.
#[derive(Debug, Default)]
pub struct Session {
    step: Step,
    video_id: Option<String>,
    transcript: Option<String>,
    messages: Vec<Message>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Record a successful transcript fetch; advances URL entry to the
    /// question step
    pub fn transcript_loaded(&mut self, video_id: impl Into<String>, transcript: impl Into<String>) -> Result<()> {
        if self.step != Step::Url {
            bail!("a video is already loaded; reset the session to start over");
        }
        self.video_id = Some(video_id.into());
        self.transcript = Some(transcript.into());
        self.step = Step::Question;
        Ok(())
    }

    /// Append a user question. The first question moves the session into the
    /// chat step; later ones append without a step change.
    pub fn push_question(&mut self, question: impl Into<String>) -> Result<&Message> {
        match self.step {
            Step::Url => bail!("no transcript loaded yet"),
            Step::Question => self.step = Step::Chat,
            Step::Chat => {}
        }
        self.messages.push(Message::new(Role::User, question));
        Ok(self.messages.last().unwrap())
    }

    /// Append an assistant answer to the conversation
    pub fn push_answer(&mut self, answer: impl Into<String>) -> Result<&Message> {
        if self.step != Step::Chat {
            bail!("no question has been asked yet");
        }
        self.messages.push(Message::new(Role::Assistant, answer));
        Ok(self.messages.last().unwrap())
    }

    /// Full reset: clears reference, transcript, and conversation, and
    /// returns to URL entry
    pub fn reset(&mut self) {
        *self = Session::new();
    }
}
