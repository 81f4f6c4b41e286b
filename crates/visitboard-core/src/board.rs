//! The board: the four shared documents and the operations over them.
//!
//! Every mutating operation fetches the current document, applies one edit
//! and saves the whole document back. Concurrent writers race; the last
//! save wins.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use visitboard_chat::{self as chat, ChatMessage, ChatSession, ChatTopic, ChatUser};
use visitboard_schedule::admin::{self, check_password};
use visitboard_schedule::{
    Advertisement, AnalysisClient, AnalysisError, AppNotice, AppSettings, CareEvent, EventStatus,
    PublicSummary, RegistrationForm, SettingsEdit, WeekGrid, WeekRange,
};
use visitboard_store::{keys, BlobStore, Collection, LocalCache, PollHandle, Poller, RemoteStore};

use crate::config::{Config, PollingConfig, DEFAULT_ADMIN_PASSWORD};
use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct Board {
    settings: Collection<AppSettings>,
    events: Collection<Vec<CareEvent>>,
    topics: Collection<Vec<ChatTopic>>,
    users: Collection<Vec<ChatUser>>,
    analysis: Option<AnalysisClient>,
    admin_password: String,
}

impl Board {
    pub fn new(store: BlobStore) -> Self {
        Self {
            settings: Collection::new(store.clone(), keys::SETTINGS, AppSettings::default),
            events: Collection::new(store.clone(), keys::EVENTS, Vec::new),
            topics: Collection::new(store.clone(), keys::CHAT, Vec::new),
            users: Collection::new(store, keys::CHAT_USERS, Vec::new),
            analysis: None,
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }

    /// Remote store with the SQLite cache, as described by `config`.
    ///
    /// A cache that cannot be opened is logged and skipped.
    ///
    /// # Errors
    /// Invalid store URL or analysis client setup failure.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let remote = RemoteStore::new(
            &config.store.base_url,
            &config.store.bucket,
            config.store.retry(),
            config.store.request_timeout(),
        )?;
        let mut store = BlobStore::remote(remote);

        let cache_path = config.store.effective_cache_path();
        match LocalCache::new(&cache_path) {
            Ok(cache) => store = store.with_cache(cache),
            Err(e) => tracing::warn!("Local cache unavailable at {}: {}", cache_path.display(), e),
        }

        let analysis = match config.analysis.resolved_api_key() {
            Some(key) => Some(AnalysisClient::new(
                Some(key),
                config.analysis.model.as_str(),
                config.analysis.base_url.as_str(),
            )?),
            None => None,
        };

        Ok(Self::new(store)
            .with_admin_password(&config.admin.password)
            .with_analysis(analysis))
    }

    pub fn with_admin_password(mut self, password: &str) -> Self {
        self.admin_password = password.to_string();
        self
    }

    pub fn with_analysis(mut self, client: Option<AnalysisClient>) -> Self {
        self.analysis = client;
        self
    }

    pub async fn settings(&self) -> AppSettings {
        self.settings.get().await
    }

    pub async fn events(&self) -> Vec<CareEvent> {
        self.events.get().await
    }

    /// The week `offset` weeks from the current one, with fresh documents.
    pub async fn week(&self, offset: i32) -> WeekView {
        self.week_of(WeekRange::current(offset)).await
    }

    pub async fn week_of(&self, week: WeekRange) -> WeekView {
        let (settings, events) = tokio::join!(self.settings(), self.events());
        WeekView {
            week,
            settings,
            events,
        }
    }

    /// Validate and append a public registration.
    ///
    /// # Errors
    /// Any `ScheduleError` from the form, or the save failure.
    pub async fn register(&self, form: RegistrationForm) -> Result<CareEvent, AppError> {
        let settings = self.settings().await;
        let event = self
            .events
            .update(|events| -> Result<CareEvent, AppError> {
                let event = form.submit(&settings, events.as_slice())?;
                events.push(event.clone());
                Ok(event)
            })
            .await?;

        tracing::info!(date = %event.date, slot = %event.slot_id, "Registration saved");
        Ok(event)
    }

    /// Ads to pop up when the board is opened.
    pub async fn ads_on_entry(&self) -> Vec<Advertisement> {
        self.settings().await.ads
    }

    pub async fn notices(&self) -> Vec<AppNotice> {
        self.settings().await.notices
    }

    /// # Errors
    /// `ScheduleError::Unauthorized` on a wrong password.
    pub fn admin(&self, password: &str) -> Result<AdminSession<'_>, AppError> {
        check_password(&self.admin_password, password)?;
        tracing::info!("Admin session opened");
        Ok(AdminSession { board: self })
    }

    pub async fn register_chat_user(&self, name: &str, pass: &str) -> Result<(), AppError> {
        self.users
            .update(|users| chat::register(users, name, pass).map_err(AppError::from))
            .await
    }

    pub async fn chat_login(&self, name: &str, pass: &str) -> Result<ChatSession, AppError> {
        let users = self.users.get().await;
        Ok(chat::login(&users, name, pass)?)
    }

    pub async fn topics(&self) -> Vec<ChatTopic> {
        self.topics.get().await
    }

    pub async fn topic(&self, id: &str) -> Option<ChatTopic> {
        self.topics().await.into_iter().find(|t| t.id == id)
    }

    pub async fn create_topic(&self, session: &ChatSession, title: &str) -> Result<ChatTopic, AppError> {
        self.topics
            .update(|topics| chat::create_topic(topics, title, session).map_err(AppError::from))
            .await
    }

    /// Post to a topic. The topics list is re-fetched right before the
    /// write so recent messages from others are kept.
    pub async fn post(&self, session: &ChatSession, topic_id: &str, text: &str) -> Result<ChatMessage, AppError> {
        self.topics
            .update(|topics| chat::add_message(topics, topic_id, session, text).map_err(AppError::from))
            .await
    }

    /// Model commentary on the schedule, or a fixed fallback line.
    pub async fn analyze(&self) -> String {
        let Some(client) = &self.analysis else {
            return AnalysisError::Disabled.fallback_text().to_string();
        };
        let (events, settings) = tokio::join!(self.events(), self.settings());
        client.analyze(&events, &settings).await
    }

    /// Start polling all four documents. Each poller gets a child of
    /// `cancel`, so cancelling it stops them all.
    pub fn watch(&self, polling: &PollingConfig, cancel: &CancellationToken) -> BoardWatch {
        BoardWatch {
            settings: Poller::spawn(
                self.settings.clone(),
                Duration::from_secs(polling.settings_secs),
                cancel.child_token(),
            ),
            events: Poller::spawn(
                self.events.clone(),
                Duration::from_secs(polling.events_secs),
                cancel.child_token(),
            ),
            topics: Poller::spawn(
                self.topics.clone(),
                Duration::from_secs(polling.chat_secs),
                cancel.child_token(),
            ),
            users: Poller::spawn(
                self.users.clone(),
                Duration::from_secs(polling.users_secs),
                cancel.child_token(),
            ),
        }
    }
}

/// Snapshot of one week's documents.
#[derive(Debug, Clone)]
pub struct WeekView {
    pub week: WeekRange,
    pub settings: AppSettings,
    pub events: Vec<CareEvent>,
}

impl WeekView {
    pub fn grid(&self) -> WeekGrid<'_> {
        WeekGrid::build(self.week, &self.settings, &self.events)
    }

    pub fn summary(&self, event: &CareEvent) -> PublicSummary {
        PublicSummary::of(event, &self.settings.fields)
    }
}

/// Live copies of the board documents.
pub struct BoardWatch {
    pub settings: PollHandle<AppSettings>,
    pub events: PollHandle<Vec<CareEvent>>,
    pub topics: PollHandle<Vec<ChatTopic>>,
    pub users: PollHandle<Vec<ChatUser>>,
}

impl BoardWatch {
    pub fn view(&self, week: WeekRange) -> WeekView {
        WeekView {
            week,
            settings: self.settings.current(),
            events: self.events.current(),
        }
    }

    pub async fn stop(self) {
        tokio::join!(
            self.settings.stop(),
            self.events.stop(),
            self.topics.stop(),
            self.users.stop()
        );
    }
}

/// Operations behind the admin password.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession<'a> {
    board: &'a Board,
}

impl AdminSession<'_> {
    /// All registrations, newest date first.
    pub async fn events(&self) -> Vec<CareEvent> {
        let events = self.board.events().await;
        admin::events_by_date_desc(&events).into_iter().cloned().collect()
    }

    pub async fn delete_event(&self, id: &str) -> Result<CareEvent, AppError> {
        let removed = self
            .board
            .events
            .update(|events| admin::delete_event(events, id).map_err(AppError::from))
            .await?;
        tracing::info!(id, "Registration deleted");
        Ok(removed)
    }

    pub async fn set_status(&self, id: &str, status: EventStatus) -> Result<(), AppError> {
        self.board
            .events
            .update(|events| admin::set_status(events, id, status).map_err(AppError::from))
            .await
    }

    /// Apply one settings edit; returns the id of a created item.
    pub async fn edit(&self, edit: SettingsEdit) -> Result<Option<String>, AppError> {
        self.board
            .settings
            .update(|settings| edit.apply(settings).map_err(AppError::from))
            .await
    }

    pub async fn settings(&self) -> AppSettings {
        self.board.settings().await
    }
}
