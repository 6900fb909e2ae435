//! ViewRouter -- which screen is showing, and the builder session behind it.
//!
//! Owns the fleet and at most one live [`BuilderSession`]. Leaving the
//! builder abandons the session; a completed deployment drops it and shows
//! the dashboard.

use std::time::Duration;

use viper_types::bot::{BotId, BotRecord};
use viper_types::error::{GenerationError, SessionError, StoreError};
use viper_types::session::GenerationTicket;
use viper_types::spec::BotSpecification;
use viper_types::view::AppView;

use crate::builder::generator::SpecificationGenerator;
use crate::builder::session::{BuilderSession, GenerationStatus};
use crate::fleet::slot_store::SlotStore;
use crate::fleet::store::FleetStore;

/// Application navigation state.
pub struct ViewRouter<S: SlotStore> {
    view: AppView,
    fleet: FleetStore<S>,
    session: Option<BuilderSession>,
}

impl<S: SlotStore> ViewRouter<S> {
    /// Router on the landing view over an already loaded fleet.
    pub fn new(fleet: FleetStore<S>) -> Self {
        Self {
            view: AppView::Landing,
            fleet,
            session: None,
        }
    }

    pub fn view(&self) -> AppView {
        self.view
    }

    pub fn fleet(&self) -> &FleetStore<S> {
        &self.fleet
    }

    pub fn session(&self) -> Option<&BuilderSession> {
        self.session.as_ref()
    }

    /// Leave the landing page for the dashboard.
    pub fn start(&mut self) {
        self.view = AppView::Dashboard;
    }

    /// Open the builder with a fresh session, replacing any abandonable one.
    pub fn create_new(&mut self) -> Result<&BuilderSession, SessionError> {
        if let Some(old) = self.session.take() {
            if let Err(e) = old.ensure_abandonable() {
                self.session = Some(old);
                return Err(e);
            }
            old.abandon()?;
        }
        self.view = AppView::Builder;
        Ok(self.session.insert(BuilderSession::new()))
    }

    /// Abandon the live session and return to the dashboard.
    pub fn cancel_builder(&mut self) -> Result<(), SessionError> {
        self.drop_session()?;
        self.view = AppView::Dashboard;
        Ok(())
    }

    /// Switch views directly. Leaving the builder abandons its session;
    /// entering it opens one if none is live.
    pub fn navigate(&mut self, view: AppView) -> Result<(), SessionError> {
        if view == self.view {
            return Ok(());
        }
        if self.view == AppView::Builder {
            self.drop_session()?;
        }
        if view == AppView::Builder && self.session.is_none() {
            self.session = Some(BuilderSession::new());
        }
        tracing::debug!(from = %self.view, to = %view, "navigate");
        self.view = view;
        Ok(())
    }

    pub fn begin_submit(&mut self, prompt: &str) -> Result<GenerationTicket, SessionError> {
        self.live_session()?.begin_submit(prompt)
    }

    /// Deliver a generation result. Results for sessions that are gone are dropped.
    pub fn apply_generation(
        &mut self,
        ticket: &GenerationTicket,
        result: Result<BotSpecification, GenerationError>,
    ) -> GenerationStatus {
        match self.session.as_mut() {
            Some(session) => session.complete_generation(ticket, result),
            None => {
                tracing::debug!(session_id = %ticket.session_id, "no live session for generation result");
                GenerationStatus::Ignored
            }
        }
    }

    /// Submit a prompt to the live session and wait for `generator` inline.
    pub async fn submit<G: SpecificationGenerator>(
        &mut self,
        generator: &G,
        prompt: &str,
    ) -> Result<GenerationStatus, SessionError> {
        self.live_session()?.submit(generator, prompt).await
    }

    pub fn submit_credentials(
        &mut self,
        token: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<(), SessionError> {
        self.live_session()?
            .submit_credentials(token, client_id, client_secret)
    }

    /// Finalize the live session into the fleet and show the dashboard.
    pub async fn finalize(&mut self, delay: Duration) -> Result<BotRecord, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoActiveSession)?;
        let record = session.finalize(&mut self.fleet, delay).await?;
        self.session = None;
        self.view = AppView::Dashboard;
        Ok(record)
    }

    pub async fn delete_bot(&mut self, id: &BotId) -> Result<bool, StoreError> {
        self.fleet.remove(id).await
    }

    fn live_session(&mut self) -> Result<&mut BuilderSession, SessionError> {
        self.session.as_mut().ok_or(SessionError::NoActiveSession)
    }

    fn drop_session(&mut self) -> Result<(), SessionError> {
        if let Some(session) = &self.session {
            session.ensure_abandonable()?;
        }
        if let Some(session) = self.session.take() {
            session.abandon()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::memory_slot::MemorySlotStore;
    use viper_types::config::StorageSettings;
    use viper_types::session::SessionPhase;

    struct ModGuardGenerator;

    impl SpecificationGenerator for ModGuardGenerator {
        async fn generate(&self, _prompt: &str) -> Result<BotSpecification, GenerationError> {
            Ok(BotSpecification {
                name: "ModGuard".to_string(),
                description: "Moderation.".to_string(),
                commands: vec!["/ban".to_string()],
                features: vec![],
            })
        }
    }

    async fn router() -> (ViewRouter<MemorySlotStore>, MemorySlotStore) {
        let slot = MemorySlotStore::new();
        let fleet = FleetStore::open(slot.clone(), &StorageSettings::default()).await;
        (ViewRouter::new(fleet), slot)
    }

    #[tokio::test]
    async fn test_landing_to_builder_to_dashboard() {
        let (mut router, _) = router().await;
        assert_eq!(router.view(), AppView::Landing);

        router.start();
        assert_eq!(router.view(), AppView::Dashboard);

        router.create_new().unwrap();
        assert_eq!(router.view(), AppView::Builder);

        let status = router.submit(&ModGuardGenerator, "a moderation bot").await.unwrap();
        assert_eq!(status, GenerationStatus::Ready);
        router.submit_credentials("abc123", "", "").unwrap();
        let record = router.finalize(Duration::ZERO).await.unwrap();

        assert_eq!(router.view(), AppView::Dashboard);
        assert!(router.session().is_none());
        assert_eq!(router.fleet().list(), &[record]);
    }

    #[tokio::test]
    async fn test_cancel_abandons_without_touching_fleet() {
        let (mut router, slot) = router().await;
        router.create_new().unwrap();
        router.begin_submit("a moderation bot").unwrap();

        router.cancel_builder().unwrap();
        assert_eq!(router.view(), AppView::Dashboard);
        assert!(router.session().is_none());
        assert!(router.fleet().is_empty());
        assert!(slot.raw("viper_bots").is_none());
    }

    #[tokio::test]
    async fn test_result_after_abandon_is_ignored() {
        let (mut router, _) = router().await;
        router.create_new().unwrap();
        let ticket = router.begin_submit("a moderation bot").unwrap();
        router.navigate(AppView::Dashboard).unwrap();

        let spec = ModGuardGenerator.generate("").await;
        assert_eq!(router.apply_generation(&ticket, spec), GenerationStatus::Ignored);

        router.create_new().unwrap();
        let spec = ModGuardGenerator.generate("").await;
        assert_eq!(router.apply_generation(&ticket, spec), GenerationStatus::Ignored);
        assert_eq!(router.session().unwrap().phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_cannot_leave_builder_while_finalizing() {
        let (mut router, _) = router().await;
        router.create_new().unwrap();
        router.submit(&ModGuardGenerator, "a moderation bot").await.unwrap();
        router.submit_credentials("abc123", "", "").unwrap();

        assert!(router.navigate(AppView::Dashboard).is_err());
        assert!(router.cancel_builder().is_err());
        assert!(router.create_new().is_err());
        assert_eq!(router.view(), AppView::Builder);
        assert_eq!(router.session().unwrap().phase(), SessionPhase::Finalizing);
    }

    #[tokio::test]
    async fn test_navigate_into_builder_opens_session() {
        let (mut router, _) = router().await;
        router.navigate(AppView::Builder).unwrap();
        assert!(router.session().is_some());
    }

    #[tokio::test]
    async fn test_actions_without_session() {
        let (mut router, _) = router().await;
        assert!(matches!(
            router.begin_submit("x"),
            Err(SessionError::NoActiveSession)
        ));
        assert!(matches!(
            router.finalize(Duration::ZERO).await,
            Err(SessionError::NoActiveSession)
        ));
    }

    #[tokio::test]
    async fn test_delete_bot() {
        let (mut router, _) = router().await;
        router.create_new().unwrap();
        router.submit(&ModGuardGenerator, "a moderation bot").await.unwrap();
        router.submit_credentials("abc123", "", "").unwrap();
        let record = router.finalize(Duration::ZERO).await.unwrap();

        assert!(router.delete_bot(&record.id).await.unwrap());
        assert!(router.fleet().is_empty());
        assert!(!router.delete_bot(&record.id).await.unwrap());
    }
}
