//! BuilderSession -- one conversation from first prompt to a stored record.
//!
//! The session is a plain state machine over [`SessionPhase`]. Generation is
//! split into `begin_submit` and `complete_generation` so a front-end can
//! run the outbound call as a separate task: the returned
//! [`GenerationTicket`] ties the eventual result to the session and attempt
//! that asked for it, and results carrying a stale ticket are ignored.

use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;
use viper_types::bot::{BotCredentials, BotId, BotRecord, BotStatus};
use viper_types::error::{GenerationError, SessionError};
use viper_types::message::ConversationMessage;
use viper_types::session::{GenerationTicket, SessionPhase};
use viper_types::spec::BotSpecification;

use super::generator::SpecificationGenerator;
use super::prompt;
use crate::fleet::slot_store::SlotStore;
use crate::fleet::store::FleetStore;

/// What happened to a generation result handed back to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    /// Specification accepted; the session now awaits credentials.
    Ready,
    /// Generation failed; an apology was appended and the session is idle again.
    Failed,
    /// The ticket no longer matches this session's in-flight generation.
    Ignored,
}

/// State of one builder conversation.
#[derive(Debug)]
pub struct BuilderSession {
    id: Uuid,
    phase: SessionPhase,
    messages: Vec<ConversationMessage>,
    spec: Option<BotSpecification>,
    credentials: Option<BotCredentials>,
    sequence: u32,
}

impl Default for BuilderSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BuilderSession {
    /// Fresh idle session opened with the assistant greeting.
    pub fn new() -> Self {
        let id = Uuid::now_v7();
        tracing::debug!(session_id = %id, "builder session opened");
        Self {
            id,
            phase: SessionPhase::Idle,
            messages: vec![ConversationMessage::assistant(prompt::GREETING)],
            spec: None,
            credentials: None,
            sequence: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// Specification awaiting credentials, if one has been generated.
    pub fn specification(&self) -> Option<&BotSpecification> {
        self.spec.as_ref()
    }

    /// Accept a prompt and start a generation.
    ///
    /// The user message is appended immediately. The caller runs the
    /// generator on `ticket.prompt` and hands the result to
    /// [`complete_generation`](Self::complete_generation).
    pub fn begin_submit(&mut self, prompt: &str) -> Result<GenerationTicket, SessionError> {
        match self.phase {
            SessionPhase::Generating => return Err(SessionError::AlreadyGenerating),
            SessionPhase::Idle => {}
            phase => {
                return Err(SessionError::InvalidTransition {
                    phase,
                    action: "submit a prompt",
                });
            }
        }

        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(SessionError::EmptyPrompt);
        }

        self.messages.push(ConversationMessage::user(prompt));
        self.sequence += 1;
        self.phase = SessionPhase::Generating;
        tracing::debug!(session_id = %self.id, sequence = self.sequence, "generation started");

        Ok(GenerationTicket {
            session_id: self.id,
            sequence: self.sequence,
            prompt: prompt.to_string(),
        })
    }

    /// Apply the outcome of the generation identified by `ticket`.
    pub fn complete_generation(
        &mut self,
        ticket: &GenerationTicket,
        result: Result<BotSpecification, GenerationError>,
    ) -> GenerationStatus {
        if ticket.session_id != self.id
            || ticket.sequence != self.sequence
            || self.phase != SessionPhase::Generating
        {
            tracing::debug!(
                session_id = %self.id,
                ticket_sequence = ticket.sequence,
                current_sequence = self.sequence,
                phase = %self.phase,
                "discarding stale generation result"
            );
            return GenerationStatus::Ignored;
        }

        match result {
            Ok(spec) => {
                tracing::info!(
                    session_id = %self.id,
                    bot_name = %spec.name,
                    commands = spec.commands.len(),
                    "specification generated"
                );
                self.messages
                    .push(ConversationMessage::assistant(prompt::summarize_specification(&spec)));
                self.spec = Some(spec);
                self.phase = SessionPhase::AwaitingCredentials;
                GenerationStatus::Ready
            }
            Err(e) => {
                tracing::warn!(session_id = %self.id, "generation failed: {e}");
                self.messages
                    .push(ConversationMessage::assistant(prompt::failure_message(&e)));
                self.phase = SessionPhase::Idle;
                GenerationStatus::Failed
            }
        }
    }

    /// Submit a prompt and wait for the generator inline.
    pub async fn submit<G: SpecificationGenerator>(
        &mut self,
        generator: &G,
        prompt: &str,
    ) -> Result<GenerationStatus, SessionError> {
        let ticket = self.begin_submit(prompt)?;
        let result = generator.generate(&ticket.prompt).await;
        Ok(self.complete_generation(&ticket, result))
    }

    /// Record the bot credentials. Only the token is mandatory.
    pub fn submit_credentials(
        &mut self,
        token: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<(), SessionError> {
        if self.phase != SessionPhase::AwaitingCredentials {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "submit credentials",
            });
        }
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionError::MissingToken);
        }

        self.credentials = Some(BotCredentials {
            token: token.to_string(),
            client_id: client_id.trim().to_string(),
            client_secret: client_secret.trim().to_string(),
        });
        self.phase = SessionPhase::Finalizing;
        tracing::debug!(session_id = %self.id, "credentials accepted");
        Ok(())
    }

    /// Store the finished bot in `fleet` after a cosmetic `delay`.
    ///
    /// On a store failure the session stays in `Finalizing` so the call can
    /// be retried. On success the transcript and specification are dropped.
    pub async fn finalize<S: SlotStore>(
        &mut self,
        fleet: &mut FleetStore<S>,
        delay: Duration,
    ) -> Result<BotRecord, SessionError> {
        let invalid = SessionError::InvalidTransition {
            phase: self.phase,
            action: "finalize",
        };
        if self.phase != SessionPhase::Finalizing {
            return Err(invalid);
        }
        let Some(spec) = self.spec.as_ref() else {
            return Err(invalid);
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let record = assemble_record(spec, self.credentials.clone());
        fleet.append(record.clone()).await?;

        self.phase = SessionPhase::Complete;
        self.messages.clear();
        self.spec = None;
        self.credentials = None;
        tracing::info!(session_id = %self.id, bot_id = %record.id, "bot deployed");
        Ok(record)
    }

    /// Check that the session may be discarded without losing a pending deployment.
    pub fn ensure_abandonable(&self) -> Result<(), SessionError> {
        if self.phase.is_abandonable() {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "abandon",
            })
        }
    }

    /// Discard the session. The fleet is never touched.
    pub fn abandon(self) -> Result<(), SessionError> {
        self.ensure_abandonable()?;
        tracing::debug!(session_id = %self.id, phase = %self.phase, "builder session abandoned");
        Ok(())
    }
}

/// Build a fresh online record from a specification and credentials.
pub fn assemble_record(spec: &BotSpecification, credentials: Option<BotCredentials>) -> BotRecord {
    BotRecord {
        id: BotId::new(),
        name: spec.name.clone(),
        description: spec.description.clone(),
        status: BotStatus::Online,
        commands: spec.commands.clone(),
        credentials,
        created_at: Utc::now(),
    }
}
