#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use postgram::{
    models::{
        media::SelectedFile,
        notification::{Severity, ToastId},
        posts::{NewPost, Post, POSTS_COLLECTION},
        query::{FeedOrder, SortDirection},
        users::CurrentUser,
    },
    repositories::{changes::CollectionChanges, posts_repo::PostsRepository, subscription::Subscription},
    services::{composer::PostComposer, notifications::Notifier, preview::MediaDecoder},
    storage::{ObjectStorage, StoredObject},
    Error, Result,
};
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDRfake-png-body";
pub const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0fake-jpeg-body";
pub const GIF: &[u8] = b"GIF89a fake-gif-body";

pub fn png(name: &str) -> SelectedFile {
    SelectedFile::new(name, Some("image/png".to_string()), PNG.to_vec())
}

pub fn jpeg(name: &str) -> SelectedFile {
    SelectedFile::new(name, Some("image/jpeg".to_string()), JPEG.to_vec())
}

pub fn user() -> CurrentUser {
    CurrentUser::new("anna", "Anna Karenina")
}

/// Ordered record of collaborator calls shared between fakes.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<&'static str>>>);

impl CallLog {
    pub fn push(&self, call: &'static str) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

pub struct FakeStorage {
    log: CallLog,
    pub keys: Mutex<Vec<String>>,
    pub fail_put: bool,
    pub fail_locator: bool,
    pub empty_locator: bool,
}

impl FakeStorage {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            keys: Mutex::new(Vec::new()),
            fail_put: false,
            fail_locator: false,
            empty_locator: false,
        }
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn put_bytes(&self, key: &str, bytes: Bytes) -> Result<StoredObject> {
        self.log.push("put_bytes");
        if self.fail_put {
            return Err(Error::Storage("bucket unavailable".to_string()));
        }
        self.keys.lock().unwrap().push(key.to_string());
        Ok(StoredObject {
            key: key.to_string(),
            size: bytes.len(),
        })
    }

    async fn locator(&self, object: &StoredObject) -> Result<String> {
        self.log.push("locator");
        if self.fail_locator {
            return Err(Error::Storage("cannot sign url".to_string()));
        }
        if self.empty_locator {
            return Ok(String::new());
        }
        Ok(format!("https://cdn.test/{}", object.key))
    }
}

/// Posts kept in memory; writes fan out through the real change channels.
pub struct MemoryPosts {
    log: CallLog,
    posts: Arc<Mutex<Vec<Post>>>,
    changes: CollectionChanges,
    pub fail_write: bool,
}

impl MemoryPosts {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            posts: Arc::new(Mutex::new(Vec::new())),
            changes: CollectionChanges::default(),
            fail_write: false,
        }
    }

    pub fn stored(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }

    fn snapshot(posts: &Mutex<Vec<Post>>, order: FeedOrder) -> Vec<Post> {
        let mut snapshot = posts.lock().unwrap().clone();
        snapshot.sort_by_key(|post| post.created_at);
        if order.direction == SortDirection::Descending {
            snapshot.reverse();
        }
        snapshot
    }
}

#[async_trait]
impl PostsRepository for MemoryPosts {
    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        self.log.push("write");
        if self.fail_write {
            return Err(Error::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        let created = post.clone().into_post(Utc::now());
        self.posts.lock().unwrap().push(created.clone());
        self.changes.publish(POSTS_COLLECTION, created.id).await;
        Ok(created)
    }

    async fn list_posts(&self, order: FeedOrder) -> Result<Vec<Post>> {
        Ok(Self::snapshot(&self.posts, order))
    }

    async fn subscribe_posts(&self, order: FeedOrder) -> Result<Subscription> {
        let changes = self.changes.subscribe(POSTS_COLLECTION).await;
        let posts = self.posts.clone();
        Subscription::refreshing(changes, 8, move || {
            std::future::ready(Ok(Self::snapshot(&posts, order)))
        })
        .await
    }
}

/// A live query whose snapshots are pushed by the test itself.
#[derive(Default)]
pub struct ManualFeed {
    sender: Mutex<Option<mpsc::Sender<Vec<Post>>>>,
}

impl ManualFeed {
    pub async fn deliver(&self, snapshot: Vec<Post>) -> bool {
        let sender = self.sender.lock().unwrap().clone();
        match sender {
            Some(sender) => sender.send(snapshot).await.is_ok(),
            None => false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.sender
            .lock()
            .unwrap()
            .as_ref()
            .map(|sender| sender.is_closed())
            .unwrap_or(true)
    }
}

#[async_trait]
impl PostsRepository for ManualFeed {
    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        Ok(post.clone().into_post(Utc::now()))
    }

    async fn list_posts(&self, _order: FeedOrder) -> Result<Vec<Post>> {
        Ok(Vec::new())
    }

    async fn subscribe_posts(&self, _order: FeedOrder) -> Result<Subscription> {
        let (sender, receiver) = mpsc::channel(8);
        *self.sender.lock().unwrap() = Some(sender);
        Ok(Subscription::new(receiver, None))
    }
}

pub fn post_by(username: &str) -> Post {
    let id = Uuid::new_v4();
    NewPost {
        id,
        image: format!("https://cdn.test/posts/{}.png", id),
        caption: String::new(),
        username: username.to_string(),
    }
    .into_post(Utc::now())
}

#[derive(Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<(Severity, String, ToastId)>>,
}

impl RecordingNotifier {
    pub fn shown(&self) -> Vec<(Severity, String, ToastId)> {
        self.shown.lock().unwrap().clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _, _)| *s == severity)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, severity: Severity, message: &str, replace: Option<ToastId>) -> ToastId {
        let id = replace.unwrap_or_default();
        self.shown
            .lock()
            .unwrap()
            .push((severity, message.to_string(), id));
        id
    }
}

/// Returns `preview:{file name}`. Names in `held` block until `release` fires,
/// names in `broken` fail. Every finished decode is reported on `decoded`.
pub struct ScriptedDecoder {
    pub held: HashSet<String>,
    pub broken: HashSet<String>,
    pub release: Arc<Notify>,
    decoded: mpsc::UnboundedSender<String>,
}

impl ScriptedDecoder {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (decoded, rx) = mpsc::unbounded_channel();
        (
            Self {
                held: HashSet::new(),
                broken: HashSet::new(),
                release: Arc::new(Notify::new()),
                decoded,
            },
            rx,
        )
    }
}

#[async_trait]
impl MediaDecoder for ScriptedDecoder {
    async fn decode(&self, file: &SelectedFile) -> Result<String> {
        if self.held.contains(&file.name) {
            self.release.notified().await;
        }
        let _ = self.decoded.send(file.name.clone());
        if self.broken.contains(&file.name) {
            return Err(Error::Decode(format!("cannot read {}", file.name)));
        }
        Ok(format!("preview:{}", file.name))
    }
}

/// A decoder that panics instead of returning.
pub struct PanickingDecoder;

#[async_trait]
impl MediaDecoder for PanickingDecoder {
    async fn decode(&self, file: &SelectedFile) -> Result<String> {
        panic!("decoder crashed on {}", file.name);
    }
}

pub struct Harness {
    pub log: CallLog,
    pub storage: Arc<FakeStorage>,
    pub posts: Arc<MemoryPosts>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(|_, _| {})
    }

    pub fn with(configure: impl FnOnce(&mut FakeStorage, &mut MemoryPosts)) -> Self {
        let log = CallLog::default();
        let mut storage = FakeStorage::new(log.clone());
        let mut posts = MemoryPosts::new(log.clone());
        configure(&mut storage, &mut posts);

        Self {
            log,
            storage: Arc::new(storage),
            posts: Arc::new(posts),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub fn composer(&self, decoder: impl MediaDecoder + 'static) -> PostComposer {
        PostComposer::new(
            user(),
            self.storage.clone(),
            self.posts.clone(),
            self.notifier.clone(),
            Arc::new(decoder),
        )
    }
}
