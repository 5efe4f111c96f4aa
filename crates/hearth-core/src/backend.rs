//! Top-level owner of sessions, collections, and per-resource coordination.
//! Everything above the network layer goes through the [`Backend`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::CoreConfig;
use crate::errors::{CoreError, Result};
use crate::gate::{self, ResourceGate, WaitOptions};
use crate::models::{Account, Item, ItemKind, ModelItem};
use crate::session::{MediaPayload, Profile, Session, SessionFactory};
use crate::store::{ItemKey, ModelId, ModelProxy, ModelShape, ModelStore};
use crate::user_files::{SavedAccount, SavedAccounts};

pub const DEFAULT_HOMESERVER: &str = "https://matrix.org";

/// Outcome of one account's resume during [`Backend::load_saved_accounts`].
/// Failures stay per-account; one bad resume never aborts its siblings.
#[derive(Debug)]
pub struct ResumeOutcome {
    pub user_id: String,
    pub result: Result<()>,
}

/// One row of the flattened accounts-and-rooms projection the UI consumes.
#[derive(Debug, Clone, Serialize)]
pub struct MainPaneRow {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub id: String,
    pub user_id: String,
    pub data: Value,
}

pub struct Backend {
    config: CoreConfig,
    models: ModelStore<Item>,
    sessions: RefCell<IndexMap<String, Rc<dyn Session>>>,
    session_factory: Box<dyn SessionFactory>,
    saved_accounts: Rc<dyn SavedAccounts>,
    profile_cache: RefCell<HashMap<String, Profile>>,
    profile_gate: ResourceGate,
    send_gate: ResourceGate,
    all_accounts: Rc<ModelProxy<Item>>,
    all_rooms: Rc<ModelProxy<Item>>,
}

impl Backend {
    /// The exhaustive set of collection shapes legal for this process.
    fn allowed_shapes() -> [ModelShape; 6] {
        [
            ModelShape::new(ItemKind::Account, 0), // logged-in accounts
            ModelShape::new(ItemKind::Device, 1),  // devices of user_id
            ModelShape::new(ItemKind::Room, 1),    // rooms of user_id
            ModelShape::new(ItemKind::Upload, 1),  // uploads running in room_id
            ModelShape::new(ItemKind::Member, 2),  // members of user_id in room_id
            ModelShape::new(ItemKind::Event, 2),   // events of user_id in room_id
        ]
    }

    pub fn new(
        config: CoreConfig,
        session_factory: Box<dyn SessionFactory>,
        saved_accounts: Rc<dyn SavedAccounts>,
    ) -> Result<Self> {
        let models = ModelStore::new(Self::allowed_shapes());

        // Views only observe collections present at their construction, so
        // the accounts collection has to exist before the view does. Room
        // collections appear per account; `register` wires each one into the
        // all-rooms view as it is created.
        models.get(&ModelId::of(ItemKind::Account))?;
        let all_accounts = ModelProxy::new(
            ModelId::of(ItemKind::Account).scoped("*"),
            |id: &ModelId| id.kind == ItemKind::Account,
            &models,
        );
        let all_rooms = ModelProxy::standalone(
            ModelId::of(ItemKind::Room).scoped("*"),
            |id: &ModelId| id.kind == ItemKind::Room,
        );

        Ok(Self {
            config,
            models,
            sessions: RefCell::new(IndexMap::new()),
            session_factory,
            saved_accounts,
            profile_cache: RefCell::new(HashMap::new()),
            profile_gate: ResourceGate::new(),
            send_gate: ResourceGate::new(),
            all_accounts,
            all_rooms,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn models(&self) -> &ModelStore<Item> {
        &self.models
    }

    pub fn all_accounts(&self) -> &Rc<ModelProxy<Item>> {
        &self.all_accounts
    }

    pub fn all_rooms(&self) -> &Rc<ModelProxy<Item>> {
        &self.all_rooms
    }

    pub fn is_registered(&self, user_id: &str) -> bool {
        self.sessions.borrow().contains_key(user_id)
    }

    // Session management

    /// Log in a new account and register its session. On success the user id
    /// is returned and the account is persisted for later resume.
    pub async fn login(
        &self,
        user: &str,
        password: &str,
        device_id: Option<&str>,
        homeserver: &str,
    ) -> Result<String> {
        let session = self.session_factory.create(homeserver);

        let info = match session.login(user, password, device_id).await {
            Ok(info) => info,
            Err(err) => {
                // Tear the half-open session down before reporting.
                let _ = session.logout().await;
                return Err(CoreError::session(user, err));
            }
        };

        self.register(&info.user_id, session)?;
        self.saved_accounts
            .save(
                &info.user_id,
                SavedAccount {
                    token: info.token,
                    device_id: info.device_id,
                    homeserver: homeserver.to_string(),
                },
            )
            .await?;

        tracing::info!(user_id = %info.user_id, "logged in");
        Ok(info.user_id)
    }

    /// Register a session from saved credentials, then resume it. The entry
    /// is registered first so lookups waiting on this account resolve even
    /// while the resume is still in flight; a failed resume leaves the entry
    /// in place for the UI to report on.
    pub async fn resume_session(
        &self,
        user_id: &str,
        token: &str,
        device_id: &str,
        homeserver: &str,
    ) -> Result<()> {
        let session = self.session_factory.create(homeserver);
        self.register(user_id, Rc::clone(&session))?;

        session
            .resume(user_id, token, device_id)
            .await
            .map_err(|err| CoreError::session(user_id, err))
    }

    /// Resume every saved account concurrently, collecting one outcome per
    /// account: no short-circuiting, no aggregate failure.
    pub async fn load_saved_accounts(&self) -> Result<Vec<ResumeOutcome>> {
        let saved = self.saved_accounts.read().await?;

        let resumes = saved.into_iter().map(|(user_id, account)| async move {
            let result = self
                .resume_session(
                    &user_id,
                    &account.token,
                    &account.device_id,
                    &account.homeserver,
                )
                .await;
            if let Err(ref err) = result {
                tracing::warn!(user_id = %user_id, %err, "account resume failed");
            }
            ResumeOutcome { user_id, result }
        });

        Ok(join_all(resumes).await)
    }

    /// Log an account out and unregister it. All collections scoped to the
    /// account are torn down, which propagates into the derived views.
    pub async fn logout(&self, user_id: &str) -> Result<()> {
        let session = self.sessions.borrow_mut().shift_remove(user_id);
        if let Some(session) = session {
            let accounts = self.models.get(&ModelId::of(ItemKind::Account))?;
            accounts.borrow_mut().remove(&ItemKey::id(user_id));
            self.models.discard_scope(user_id);

            session
                .logout()
                .await
                .map_err(|err| CoreError::session(user_id, err))?;
            tracing::info!(user_id, "logged out");
        }

        self.saved_accounts.delete(user_id).await
    }

    fn register(&self, user_id: &str, session: Rc<dyn Session>) -> Result<()> {
        self.sessions
            .borrow_mut()
            .insert(user_id.to_string(), session);

        // Session map and account collection stay in lockstep.
        let accounts = self.models.get(&ModelId::of(ItemKind::Account))?;
        accounts.borrow_mut().insert(
            ItemKey::id(user_id),
            Rc::new(Item::Account(Account::new(user_id))),
        );

        let rooms = self.models.get(&ModelId::of(ItemKind::Room).scoped(user_id))?;
        self.all_rooms.attach(&rooms);
        Ok(())
    }

    /// Wait until a session for `user_id` is registered and return it.
    /// Blocks the calling task, never the process; cancel by dropping.
    pub async fn session(&self, user_id: &str) -> Rc<dyn Session> {
        let context = format!("session {user_id}");
        gate::await_ready(
            || self.sessions.borrow().get(user_id).cloned(),
            WaitOptions::default(),
            &context,
        )
        .await
    }

    /// Any session currently syncing, first in registration order. No
    /// load-balancing is promised.
    pub async fn any_healthy_session(&self) -> Rc<dyn Session> {
        gate::await_ready(
            || {
                self.sessions
                    .borrow()
                    .values()
                    .find(|session| session.is_healthy())
                    .cloned()
            },
            WaitOptions::default().warn_after(300),
            "any healthy session",
        )
        .await
    }

    // Resource-scoped operations

    /// The profile of `user_id`, cached process-wide. The per-user lock
    /// guarantees at most one in-flight fetch per user id; concurrent
    /// callers queue and then hit the cache.
    pub async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        let lock = self.profile_gate.lock_for(user_id);
        let _guard = lock.lock().await;

        if let Some(profile) = self.profile_cache.borrow().get(user_id) {
            return Ok(profile.clone());
        }

        let session = self.any_healthy_session().await;
        let profile = session
            .fetch_profile(user_id)
            .await
            .map_err(|err| CoreError::session(user_id, err))?;

        self.profile_cache
            .borrow_mut()
            .insert(user_id.to_string(), profile.clone());
        Ok(profile)
    }

    /// The ordering lock for outgoing messages in `room_id`. Senders take it
    /// around the send itself, keeping one in-order send per room.
    pub fn send_lock(&self, room_id: &str) -> Arc<Mutex<()>> {
        self.send_gate.lock_for(room_id)
    }

    pub async fn thumbnail(
        &self,
        server_name: &str,
        media_id: &str,
        width: u32,
        height: u32,
    ) -> Result<MediaPayload> {
        let session = self.any_healthy_session().await;
        session
            .fetch_thumbnail(server_name, media_id, width, height)
            .await
            .map_err(|err| CoreError::session(format!("thumbnail {server_name}/{media_id}"), err))
    }

    pub async fn media(&self, server_name: &str, media_id: &str) -> Result<MediaPayload> {
        let session = self.any_healthy_session().await;
        session
            .fetch_media(server_name, media_id)
            .await
            .map_err(|err| CoreError::session(format!("media {server_name}/{media_id}"), err))
    }

    // UI projection

    /// Flatten the account view and, per account, its rooms, into the single
    /// ordered sequence the UI layer consumes.
    pub fn flat_mainpane(&self) -> Vec<MainPaneRow> {
        let mut rows = Vec::new();
        let accounts = self.all_accounts.model().borrow();
        let rooms = self.all_rooms.model().borrow();

        for item in accounts.sorted_items() {
            let Item::Account(account) = item.as_ref() else {
                continue;
            };
            rows.push(MainPaneRow {
                kind: ItemKind::Account,
                id: account.user_id.clone(),
                user_id: account.user_id.clone(),
                data: item.serialized(),
            });

            let mut account_rooms: Vec<Rc<Item>> = rooms
                .iter()
                .filter(|(key, _)| {
                    key.source()
                        .and_then(|source| source.first_scope())
                        .is_some_and(|scope| scope == account.user_id)
                })
                .map(|(_, room)| Rc::clone(room))
                .collect();
            account_rooms.sort();

            for room_item in account_rooms {
                let Item::Room(room) = room_item.as_ref() else {
                    continue;
                };
                rows.push(MainPaneRow {
                    kind: ItemKind::Room,
                    id: format!("{}/{}", account.user_id, room.room_id),
                    user_id: account.user_id.clone(),
                    data: room_item.serialized(),
                });
            }
        }

        rows
    }
}
