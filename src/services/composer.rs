use std::{mem, sync::Arc};

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    errors::PublishStage,
    models::{
        media::{MediaType, SelectedFile},
        posts::{NewPost, Post},
        users::CurrentUser,
    },
    repositories::posts_repo::PostsRepository,
    storage::ObjectStorage,
    Error, Result,
};

use super::{notifications::Notifier, preview::MediaDecoder};

pub const NO_FILE_MESSAGE: &str = "Please upload an image";
pub const UNSUPPORTED_FILE_MESSAGE: &str = "Only JPEG and PNG images can be posted";
pub const DECODE_FAILED_MESSAGE: &str = "Something is not working";
pub const PUBLISHING_MESSAGE: &str = "Post is published...";
pub const PUBLISHED_MESSAGE: &str = "Post published!";
pub const UPLOAD_FAILED_MESSAGE: &str = "Error loading post";
pub const WRITE_FAILED_MESSAGE: &str = "Post loading error";

/// Storage key for an upload: `posts/{id}-{file name}`.
pub fn object_key(id: Uuid, file_name: &str) -> String {
    format!("posts/{}-{}", id, file_name)
}

/// The in-progress composition. Never persisted.
#[derive(Debug, Clone)]
pub struct DraftMedia {
    pub file: SelectedFile,
    pub media_type: MediaType,
    pub preview: Option<String>,
    pub caption: String,
}

#[derive(Debug, Clone)]
pub enum ComposerState {
    Idle,
    Previewing(DraftMedia),
    Uploading,
}

#[derive(Debug)]
struct DecodeOutcome {
    generation: u64,
    result: Result<String>,
}

/// Turns a local file selection into a published [`Post`].
///
/// Decoding for the preview runs in the background. Every new selection (and
/// every cancel or publish) bumps a generation counter; decode results tagged
/// with an older generation are dropped on arrival.
pub struct PostComposer {
    user: CurrentUser,
    storage: Arc<dyn ObjectStorage>,
    posts: Arc<dyn PostsRepository>,
    notifier: Arc<dyn Notifier>,
    decoder: Arc<dyn MediaDecoder>,
    state: ComposerState,
    open: bool,
    generation: u64,
    pending_decode: Option<JoinHandle<()>>,
    decode_tx: mpsc::UnboundedSender<DecodeOutcome>,
    decode_rx: mpsc::UnboundedReceiver<DecodeOutcome>,
}

impl PostComposer {
    pub fn new(
        user: CurrentUser,
        storage: Arc<dyn ObjectStorage>,
        posts: Arc<dyn PostsRepository>,
        notifier: Arc<dyn Notifier>,
        decoder: Arc<dyn MediaDecoder>,
    ) -> Self {
        let (decode_tx, decode_rx) = mpsc::unbounded_channel();
        Self {
            user,
            storage,
            posts,
            notifier,
            decoder,
            state: ComposerState::Idle,
            open: false,
            generation: 0,
            pending_decode: None,
            decode_tx,
            decode_rx,
        }
    }

    pub fn state(&self) -> &ComposerState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ComposerState::Idle)
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.state, ComposerState::Uploading)
    }

    pub fn draft(&self) -> Option<&DraftMedia> {
        match &self.state {
            ComposerState::Previewing(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn preview(&self) -> Option<&str> {
        self.draft().and_then(|draft| draft.preview.as_deref())
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Replaces the current draft with `file` and starts decoding its preview.
    ///
    /// Files that are not JPEG or PNG are refused and leave the draft as it was.
    /// Must be called from within a Tokio runtime; the decode is spawned onto it.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<()> {
        let media_type = match file.media_type() {
            Ok(media_type) => media_type,
            Err(err) => {
                warn!(file = %file.name, error = %err, "rejected file selection");
                self.notifier.error(UNSUPPORTED_FILE_MESSAGE, None);
                return Err(err);
            }
        };

        let caption = match mem::replace(&mut self.state, ComposerState::Idle) {
            ComposerState::Previewing(draft) => draft.caption,
            _ => String::new(),
        };
        self.invalidate_decode();
        self.drain_stale_decodes();

        let generation = self.generation;
        let decoder = self.decoder.clone();
        let tx = self.decode_tx.clone();
        let target = file.clone();
        self.pending_decode = Some(tokio::spawn(async move {
            // A panicking decoder still has to report back, or the preview
            // would never settle.
            let result = match tokio::spawn(async move { decoder.decode(&target).await }).await
            {
                Ok(result) => result,
                Err(err) => Err(Error::Decode(err.to_string())),
            };
            // The composer may already be gone.
            let _ = tx.send(DecodeOutcome { generation, result });
        }));

        debug!(file = %file.name, %media_type, generation, "file selected");
        self.state = ComposerState::Previewing(DraftMedia {
            file,
            media_type,
            preview: None,
            caption,
        });

        Ok(())
    }

    /// Waits until the preview for the current selection is decoded.
    ///
    /// Returns `None` if nothing is selected or decoding failed, in which case
    /// the draft has been discarded.
    pub async fn settle_preview(&mut self) -> Option<String> {
        loop {
            match &self.state {
                ComposerState::Previewing(draft) if draft.preview.is_some() => {
                    return draft.preview.clone()
                }
                ComposerState::Previewing(_) => {}
                _ => return None,
            }

            let outcome = self.decode_rx.recv().await?;
            self.apply_decode(outcome);
        }
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        if let ComposerState::Previewing(draft) = &mut self.state {
            draft.caption = caption.into();
        }
    }

    /// Drops the current draft. Any decode still running is ignored.
    pub fn cancel(&mut self) {
        self.discard_draft();
        debug!("composition cancelled");
    }

    /// Uploads the selected file and writes the post that references it.
    ///
    /// Whatever the outcome, the draft is cleared and the panel closed. An
    /// upload is not rolled back when the later write fails.
    #[instrument(skip(self), fields(username = %self.user.username))]
    pub async fn publish(&mut self) -> Result<Post> {
        let draft = match mem::replace(&mut self.state, ComposerState::Uploading) {
            ComposerState::Previewing(draft) => draft,
            _ => {
                self.state = ComposerState::Idle;
                warn!("publish requested without a selected file");
                self.notifier.error(NO_FILE_MESSAGE, None);
                return Err(Error::Validation(NO_FILE_MESSAGE.to_string()));
            }
        };
        self.invalidate_decode();

        let toast = self.notifier.loading(PUBLISHING_MESSAGE);
        let result = self.upload_and_write(draft).await;

        match &result {
            Ok(post) => {
                info!(post_id = %post.id, "post published");
                self.notifier.success(PUBLISHED_MESSAGE, Some(toast));
            }
            Err(err) => {
                error!(error = %err, "publishing post failed");
                let message = match err.stage() {
                    Some(PublishStage::Write) => WRITE_FAILED_MESSAGE,
                    _ => UPLOAD_FAILED_MESSAGE,
                };
                self.notifier.error(message, Some(toast));
            }
        }

        self.discard_draft();
        self.open = false;
        result
    }

    async fn upload_and_write(&self, draft: DraftMedia) -> Result<Post> {
        let key = object_key(Uuid::new_v4(), &draft.file.file_name());

        let object = self
            .storage
            .put_bytes(&key, draft.file.bytes)
            .await
            .map_err(|err| err.at_stage(PublishStage::Upload))?;

        let locator = self
            .storage
            .locator(&object)
            .await
            .map_err(|err| err.at_stage(PublishStage::Upload))?;
        if locator.trim().is_empty() {
            return Err(Error::Storage(format!("empty locator for {}", object.key))
                .at_stage(PublishStage::Upload));
        }

        let post = NewPost::new(locator, draft.caption, self.user.username.clone());
        self.posts.create_post(&post).await.map_err(|err| {
            warn!(key = %object.key, "record write failed, uploaded object left in storage");
            err.at_stage(PublishStage::Write)
        })
    }

    /// Returns true if `outcome` belonged to the current selection.
    fn apply_decode(&mut self, outcome: DecodeOutcome) -> bool {
        if outcome.generation != self.generation {
            debug!(
                stale = outcome.generation,
                current = self.generation,
                "discarding stale preview"
            );
            return false;
        }
        self.pending_decode = None;

        match outcome.result {
            Ok(preview) => {
                if let ComposerState::Previewing(draft) = &mut self.state {
                    draft.preview = Some(preview);
                }
            }
            Err(err) => {
                error!(error = %err, "preview decoding failed");
                self.notifier.error(DECODE_FAILED_MESSAGE, None);
                self.discard_draft();
            }
        }
        true
    }

    fn invalidate_decode(&mut self) {
        self.generation += 1;
        if let Some(task) = self.pending_decode.take() {
            task.abort();
        }
    }

    /// Drops outcomes already queued for superseded selections.
    fn drain_stale_decodes(&mut self) {
        while let Ok(outcome) = self.decode_rx.try_recv() {
            self.apply_decode(outcome);
        }
    }

    fn discard_draft(&mut self) {
        self.invalidate_decode();
        self.state = ComposerState::Idle;
    }
}

impl Drop for PostComposer {
    fn drop(&mut self) {
        if let Some(task) = self.pending_decode.take() {
            task.abort();
        }
    }
}
