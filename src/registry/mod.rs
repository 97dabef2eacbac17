//! Chat registry.
//!
//! Owns every chat the bot knows about: per-group configuration, the
//! persisted chat list, the in-memory user/group/channel sets, and report
//! recipients. All writes go through to the key-value store.
//!
//! The persisted chat list and the configs move in lock-step: a chat id is
//! in the list exactly when a config exists for it. Read-modify-write cycles
//! are serialized per chat id; the per-chat lock is always taken before the
//! list lock.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheConfig, TypedCache};
use crate::database::{ChatConfig, KvStore};
use crate::events::{ChatKind, MembershipEvent, Transition};

const CHATS_KEY: &str = "chats";

fn config_key(chat_id: i64) -> String {
    format!("chat:{chat_id}")
}

fn reports_key(chat_id: i64) -> String {
    format!("reports:{chat_id}")
}

/// Accepts both numeric ids and the legacy string form.
fn parse_chat_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("chat {0} is not registered")]
    ChatNotRegistered(i64),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.into())
    }
}

/// In-memory view of the aggregate sets, sorted for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateSnapshot {
    pub user_ids: Vec<i64>,
    pub group_ids: Vec<i64>,
    pub channel_ids: Vec<i64>,
}

pub struct ChatRegistry {
    store: Arc<dyn KvStore>,
    configs: DashMap<i64, ChatConfig>,
    chat_list: Mutex<Vec<i64>>,
    chat_locks: DashMap<i64, Arc<Mutex<()>>>,
    reports: TypedCache<i64, BTreeSet<u64>>,
    user_ids: DashSet<i64>,
    group_ids: DashSet<i64>,
    channel_ids: DashSet<i64>,
}

impl ChatRegistry {
    /// Empty registry on top of a store.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            configs: DashMap::new(),
            chat_list: Mutex::new(Vec::new()),
            chat_locks: DashMap::new(),
            reports: TypedCache::new("report_recipients", CacheConfig::with_capacity(10_000)),
            user_ids: DashSet::new(),
            group_ids: DashSet::new(),
            channel_ids: DashSet::new(),
        }
    }

    /// Build the registry from persisted state.
    ///
    /// Chat ids whose config is missing are dropped from the list.
    pub async fn load(store: Arc<dyn KvStore>) -> Result<Self, RegistryError> {
        let registry = Self::new(store);

        let listed: Vec<Value> = match registry.store.get(CHATS_KEY).await? {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };

        let mut kept = Vec::with_capacity(listed.len());
        for raw in &listed {
            let Some(chat_id) = parse_chat_id(raw) else {
                warn!("Skipping malformed chat id {} in chat list", raw);
                continue;
            };
            if kept.contains(&chat_id) {
                continue;
            }

            match registry.store.get(&config_key(chat_id)).await? {
                Some(value) => {
                    let config: ChatConfig = serde_json::from_value(value)?;
                    registry.configs.insert(chat_id, config);
                    kept.push(chat_id);
                }
                None => warn!("Chat {} has no config, dropping it from the list", chat_id),
            }
        }

        let repaired = kept.len() != listed.len();
        *registry.chat_list.lock().await = kept;
        if repaired {
            registry.persist_list(&*registry.chat_list.lock().await).await?;
        }

        info!("Loaded {} chats from storage", registry.configs.len());
        Ok(registry)
    }

    fn chat_lock(&self, chat_id: i64) -> Arc<Mutex<()>> {
        self.chat_locks.entry(chat_id).or_default().clone()
    }

    /// Drop the lock of a chat nobody else is holding or waiting on.
    ///
    /// New handles are only handed out under the map's shard lock, so a
    /// strong count of one means the map holds the last reference.
    fn release_lock(&self, chat_id: i64) {
        self.chat_locks
            .remove_if(&chat_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    async fn persist_list(&self, list: &[i64]) -> Result<(), RegistryError> {
        self.store.set(CHATS_KEY, json!(list)).await?;
        Ok(())
    }

    async fn persist_config(&self, config: &ChatConfig) -> Result<(), RegistryError> {
        self.store
            .set(&config_key(config.chat_id), serde_json::to_value(config)?)
            .await?;
        Ok(())
    }

    /// Apply a membership transition of the bot itself.
    ///
    /// Transitions without a join or leave edge are ignored.
    pub async fn record_transition(
        &self,
        event: &MembershipEvent,
        transition: Transition,
    ) -> Result<(), RegistryError> {
        let chat_id = event.chat.id;

        match event.chat.kind {
            ChatKind::Private => {
                if transition.is_join() {
                    info!("{} started the bot", event.actor_name);
                    self.user_ids.insert(chat_id);
                } else if transition.is_leave() {
                    info!("{} blocked the bot", event.actor_name);
                    self.user_ids.remove(&chat_id);
                }
            }
            ChatKind::Group | ChatKind::Supergroup => {
                if transition.is_join() {
                    info!(
                        "{} added the bot to the group {}",
                        event.actor_name, event.chat.title
                    );
                    self.register_group(chat_id, event.actor_user_id, &event.chat.title)
                        .await?;
                } else if transition.is_leave() {
                    info!(
                        "{} removed the bot from the group {}",
                        event.actor_name, event.chat.title
                    );
                    self.unregister(chat_id).await?;
                }
            }
            ChatKind::Channel => {
                if transition.is_join() {
                    info!(
                        "{} added the bot to the channel {}",
                        event.actor_name, event.chat.title
                    );
                    self.channel_ids.insert(chat_id);
                } else if transition.is_leave() {
                    info!(
                        "{} removed the bot from the channel {}",
                        event.actor_name, event.chat.title
                    );
                    self.channel_ids.remove(&chat_id);
                }
            }
        }

        Ok(())
    }

    /// Create (or refresh) the config of a group and list it.
    ///
    /// Existing templates survive a re-registration; ownership, lock and
    /// quiet are reset.
    async fn register_group(
        &self,
        chat_id: i64,
        owner_user_id: u64,
        title: &str,
    ) -> Result<(), RegistryError> {
        let lock = self.chat_lock(chat_id);
        let _guard = lock.lock().await;

        let config = match self.configs.get(&chat_id).map(|c| c.value().clone()) {
            Some(mut existing) => {
                existing.owner_user_id = owner_user_id;
                existing.locked = true;
                existing.quiet = false;
                existing.title = title.to_string();
                existing
            }
            None => ChatConfig::new(chat_id, owner_user_id, title),
        };
        self.persist_config(&config).await?;
        self.configs.insert(chat_id, config);
        self.group_ids.insert(chat_id);

        let mut list = self.chat_list.lock().await;
        if !list.contains(&chat_id) {
            list.push(chat_id);
            self.persist_list(&list).await?;
            info!("I have been added to {} chats", list.len());
        }

        Ok(())
    }

    /// Drop a group's config and list entry. Returns whether anything changed.
    async fn unregister(&self, chat_id: i64) -> Result<bool, RegistryError> {
        let lock = self.chat_lock(chat_id);
        let guard = lock.lock().await;
        let result = self.unregister_locked(chat_id).await;
        drop(guard);
        drop(lock);

        self.release_lock(chat_id);
        result
    }

    /// Callers hold the chat lock.
    async fn unregister_locked(&self, chat_id: i64) -> Result<bool, RegistryError> {
        self.group_ids.remove(&chat_id);

        let mut list = self.chat_list.lock().await;
        let listed = list.contains(&chat_id);
        if listed {
            list.retain(|id| *id != chat_id);
            self.persist_list(&list).await?;
        }
        drop(list);

        let had_config = self.configs.remove(&chat_id).is_some();
        self.store.remove(&config_key(chat_id)).await?;

        if listed || had_config {
            info!("Removed chat_id {} from chat list", chat_id);
        }
        Ok(listed || had_config)
    }

    /// Forget a chat the transport can no longer reach.
    ///
    /// Idempotent; storage failures are logged, never returned.
    pub async fn remove_chat_on_delivery_failure(&self, chat_id: i64) {
        self.user_ids.remove(&chat_id);
        self.channel_ids.remove(&chat_id);

        match self.unregister(chat_id).await {
            Ok(true) => info!("Chat {} is unreachable, removed it", chat_id),
            Ok(false) => debug!("Chat {} was already gone", chat_id),
            Err(e) => error!("Failed to remove unreachable chat {}: {}", chat_id, e),
        }
    }

    pub fn get_config(&self, chat_id: i64) -> Option<ChatConfig> {
        self.configs.get(&chat_id).map(|c| c.value().clone())
    }

    /// Apply an update to a registered chat's config and persist it.
    pub async fn mutate_config<F>(&self, chat_id: i64, mutator: F) -> Result<ChatConfig, RegistryError>
    where
        F: FnOnce(&mut ChatConfig),
    {
        let lock = self.chat_lock(chat_id);
        let _guard = lock.lock().await;

        let mut config = self
            .get_config(chat_id)
            .ok_or(RegistryError::ChatNotRegistered(chat_id))?;
        mutator(&mut config);

        self.persist_config(&config).await?;
        self.configs.insert(chat_id, config.clone());
        debug!("Updated config for chat {}", chat_id);

        Ok(config)
    }

    /// Cached recipient set. Callers hold the chat lock.
    async fn load_reports(&self, chat_id: i64) -> Result<BTreeSet<u64>, RegistryError> {
        if let Some(set) = self.reports.get(&chat_id) {
            return Ok(set);
        }

        let set = match self.store.get(&reports_key(chat_id)).await? {
            Some(value) => serde_json::from_value(value)?,
            None => BTreeSet::new(),
        };
        self.reports.insert(chat_id, set.clone());
        Ok(set)
    }

    async fn update_reports<F>(&self, chat_id: i64, update: F) -> Result<bool, RegistryError>
    where
        F: FnOnce(&mut BTreeSet<u64>) -> bool,
    {
        let lock = self.chat_lock(chat_id);
        let _guard = lock.lock().await;

        let mut set = self.load_reports(chat_id).await?;
        if !update(&mut set) {
            return Ok(false);
        }

        self.store.set(&reports_key(chat_id), json!(set)).await?;
        self.reports.insert(chat_id, set);
        Ok(true)
    }

    /// Returns `true` if the user was not a recipient yet.
    pub async fn add_report_recipient(&self, chat_id: i64, user_id: u64) -> Result<bool, RegistryError> {
        self.update_reports(chat_id, |set| set.insert(user_id)).await
    }

    /// Returns `true` if the user was a recipient.
    pub async fn remove_report_recipient(&self, chat_id: i64, user_id: u64) -> Result<bool, RegistryError> {
        self.update_reports(chat_id, |set| set.remove(&user_id)).await
    }

    pub async fn report_recipients(&self, chat_id: i64) -> Result<Vec<u64>, RegistryError> {
        let lock = self.chat_lock(chat_id);
        let _guard = lock.lock().await;
        Ok(self.load_reports(chat_id).await?.into_iter().collect())
    }

    /// Persisted chat list with titles, in registration order.
    pub async fn persisted_chats(&self) -> Vec<(i64, String)> {
        self.chat_list
            .lock()
            .await
            .iter()
            .map(|id| {
                let title = self
                    .configs
                    .get(id)
                    .map(|c| c.title.clone())
                    .unwrap_or_default();
                (*id, title)
            })
            .collect()
    }

    /// Aggregate sets as seen since process start.
    pub fn aggregate_snapshot(&self) -> AggregateSnapshot {
        fn sorted(set: &DashSet<i64>) -> Vec<i64> {
            let mut ids: Vec<i64> = set.iter().map(|id| *id).collect();
            ids.sort_unstable();
            ids
        }

        AggregateSnapshot {
            user_ids: sorted(&self.user_ids),
            group_ids: sorted(&self.group_ids),
            channel_ids: sorted(&self.channel_ids),
        }
    }

    /// Rewrite the chat list at shutdown.
    pub async fn flush(&self) -> Result<(), RegistryError> {
        let list = self.chat_list.lock().await;
        self.persist_list(&list).await?;
        info!("Flushed {} chats to storage", list.len());
        Ok(())
    }
}
