//! Post service: listings, creation and editing.

use std::collections::HashMap;
use std::io::Cursor;

use chrono::Utc;
use image::{ImageFormat, ImageReader};
use sea_orm::Set;
use tracing::{info, warn};
use validator::Validate;
use yatube_common::{
    AppError, AppResult, FieldErrors, IdGenerator, SharedStorage,
    storage::{sanitize_file_name, with_suffix},
};
use yatube_db::{
    entities::{group, post, user},
    repositories::{GroupRepository, PostRepository, PostScope, UserRepository},
};

use crate::pagination::{PAGE_SIZE, Page, resolve_page};

/// Storage key prefix for post images.
const IMAGE_PREFIX: &str = "posts";

/// Suffixed names tried after the plain file name is taken.
const STORE_ATTEMPTS: usize = 5;

const INVALID_GROUP: &str =
    "Select a valid choice. That choice is not one of the available choices.";

const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// A post with the rows it is shown with.
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: post::Model,
    pub author: user::Model,
    pub group: Option<group::Model>,
}

/// A file received from a form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-side file name.
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Submitted post form.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub text: String,
    /// Selected group ID; `None` or empty for no group.
    pub group: Option<String>,
    /// New image, if a file was chosen.
    pub image: Option<ImageUpload>,
}

#[derive(Validate)]
struct PostForm<'a> {
    #[validate(length(min = 1, message = "This field is required."))]
    text: &'a str,
}

/// Result of an edit attempt.
#[derive(Debug, Clone)]
pub enum EditOutcome {
    /// The post was saved.
    Updated(post::Model),
    /// The editor is not the author; nothing changed.
    NotAuthor(post::Model),
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    group_repo: GroupRepository,
    storage: SharedStorage,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        group_repo: GroupRepository,
        storage: SharedStorage,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            group_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Public URL of a stored image.
    #[must_use]
    pub fn image_url(&self, key: &str) -> String {
        self.storage.public_url(key)
    }

    /// Count the posts in a scope.
    pub async fn count(&self, scope: PostScope<'_>) -> AppResult<u64> {
        self.post_repo.count(scope).await
    }

    /// Resolve a raw page number for a scope; returns `(page, total)`.
    pub async fn locate_page(&self, scope: PostScope<'_>, raw: Option<&str>) -> AppResult<(u64, u64)> {
        let total = self.post_repo.count(scope).await?;
        Ok((resolve_page(raw, total, PAGE_SIZE), total))
    }

    /// Fetch an already-resolved page.
    pub async fn page(
        &self,
        scope: PostScope<'_>,
        number: u64,
        total: u64,
    ) -> AppResult<Page<PostView>> {
        let posts = self
            .post_repo
            .find_page(scope, Page::<PostView>::offset(number, PAGE_SIZE), PAGE_SIZE)
            .await?;
        let items = self.hydrate(posts).await?;

        Ok(Page::new(items, number, total, PAGE_SIZE))
    }

    /// Fetch the page a raw `?page=` value points at.
    pub async fn list(&self, scope: PostScope<'_>, raw: Option<&str>) -> AppResult<Page<PostView>> {
        let (number, total) = self.locate_page(scope, raw).await?;
        self.page(scope, number, total).await
    }

    /// Get a single post with its author and group.
    pub async fn get(&self, post_id: &str) -> AppResult<PostView> {
        let post = self.post_repo.get_by_id(post_id).await?;
        self.hydrate(vec![post])
            .await?
            .pop()
            .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))
    }

    /// Search posts for the admin listing.
    pub async fn search(
        &self,
        query: Option<&str>,
        group_id: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<PostView>> {
        let posts = self.post_repo.search(query, group_id, limit, offset).await?;
        self.hydrate(posts).await
    }

    /// Create a post authored by `author`.
    pub async fn create(&self, author: &user::Model, input: PostInput) -> AppResult<post::Model> {
        let (text, group_id) = self.clean(&input).await?;
        let image = match input.image {
            Some(upload) => Some(self.store_image(&upload).await?),
            None => None,
        };

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            text: Set(text),
            created_at: Set(Utc::now().into()),
            image: Set(image.clone()),
            author_id: Set(author.id.clone()),
            group_id: Set(group_id),
        };

        let post = match self.post_repo.create(model).await {
            Ok(post) => post,
            Err(e) => {
                if let Some(key) = image.as_deref() {
                    self.discard_image(key).await;
                }
                return Err(e);
            }
        };
        info!(post_id = %post.id, author = %author.username, "Post created");
        Ok(post)
    }

    /// Edit a post. Only its author may change it.
    pub async fn edit(
        &self,
        editor: &user::Model,
        post_id: &str,
        input: PostInput,
    ) -> AppResult<EditOutcome> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.author_id != editor.id {
            return Ok(EditOutcome::NotAuthor(post));
        }

        let (text, group_id) = self.clean(&input).await?;
        let image = match input.image {
            Some(upload) => Some(self.store_image(&upload).await?),
            None => None,
        };

        let mut active: post::ActiveModel = post.into();
        active.text = Set(text);
        active.group_id = Set(group_id);
        if let Some(key) = &image {
            active.image = Set(Some(key.clone()));
        }

        let post = match self.post_repo.update(active).await {
            Ok(post) => post,
            Err(e) => {
                if let Some(key) = image.as_deref() {
                    self.discard_image(key).await;
                }
                return Err(e);
            }
        };
        info!(post_id = %post.id, "Post edited");
        Ok(EditOutcome::Updated(post))
    }

    /// Move a post to another group, or out of any group.
    pub async fn set_group(&self, post_id: &str, group_id: Option<&str>) -> AppResult<PostView> {
        let post = self.post_repo.get_by_id(post_id).await?;

        let group_id = group_id.map(str::trim).filter(|id| !id.is_empty());
        if let Some(id) = group_id {
            if self.group_repo.find_by_id(id).await?.is_none() {
                return Err(AppError::InvalidForm(FieldErrors::single("group", INVALID_GROUP)));
            }
        }

        let mut active: post::ActiveModel = post.into();
        active.group_id = Set(group_id.map(str::to_string));
        let post = self.post_repo.update(active).await?;
        info!(post_id = %post.id, group_id = ?post.group_id, "Post group changed");

        self.hydrate(vec![post])
            .await?
            .pop()
            .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))
    }

    /// Delete a post, its comments and its image.
    pub async fn delete(&self, post_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;
        self.post_repo.delete(post_id).await?;

        if let Some(key) = post.image {
            if let Err(e) = self.storage.delete(&key).await {
                warn!(error = %e, key = %key, "Failed to delete post image");
            }
        }

        info!(post_id = %post_id, "Post deleted");
        Ok(())
    }

    /// Validate a submitted form; returns the trimmed text and group ID.
    async fn clean(&self, input: &PostInput) -> AppResult<(String, Option<String>)> {
        let text = input.text.trim();
        let mut errors = match (PostForm { text }).validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(&e),
        };

        let group_id = input
            .group
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        if let Some(id) = group_id {
            if self.group_repo.find_by_id(id).await?.is_none() {
                errors.add("group", INVALID_GROUP);
            }
        }

        if let Some(upload) = &input.image {
            if let Err(message) = check_image(upload) {
                errors.add("image", message);
            }
        }

        if errors.is_empty() {
            Ok((text.to_string(), group_id.map(str::to_string)))
        } else {
            Err(AppError::InvalidForm(errors))
        }
    }

    /// Store an uploaded image under `posts/`, keeping the client file name
    /// unless it is already taken.
    async fn store_image(&self, upload: &ImageUpload) -> AppResult<String> {
        let content_type = check_image(upload)
            .map_err(|message| AppError::BadRequest(message.to_string()))?;
        let file_name = sanitize_file_name(&upload.file_name);

        let mut key = format!("{IMAGE_PREFIX}/{file_name}");
        for _ in 0..STORE_ATTEMPTS {
            match self.storage.upload(&key, &upload.data, content_type).await {
                Ok(stored) => return Ok(stored.key),
                Err(AppError::Conflict(_)) => {
                    key = format!(
                        "{IMAGE_PREFIX}/{}",
                        with_suffix(&file_name, &self.id_gen.generate_suffix())
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Storage(format!("No free storage key for {file_name}")))
    }

    /// Remove an image whose post row was never written.
    async fn discard_image(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            warn!(error = %e, key = %key, "Failed to remove orphaned image");
        }
    }

    /// Attach authors and groups to posts, keeping the order.
    async fn hydrate(&self, posts: Vec<post::Model>) -> AppResult<Vec<PostView>> {
        let mut author_ids: Vec<String> = posts.iter().map(|p| p.author_id.clone()).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let mut group_ids: Vec<String> = posts.iter().filter_map(|p| p.group_id.clone()).collect();
        group_ids.sort_unstable();
        group_ids.dedup();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        let groups: HashMap<String, group::Model> = self
            .group_repo
            .find_by_ids(&group_ids)
            .await?
            .into_iter()
            .map(|g| (g.id.clone(), g))
            .collect();

        Ok(posts
            .into_iter()
            .filter_map(|post| {
                let Some(author) = authors.get(&post.author_id).cloned() else {
                    warn!(post_id = %post.id, "Post author is missing");
                    return None;
                };
                let group = post.group_id.as_ref().and_then(|id| groups.get(id)).cloned();
                Some(PostView {
                    post,
                    author,
                    group,
                })
            })
            .collect())
    }
}

/// Check that an upload is a readable JPEG, PNG, GIF or WebP image and
/// return its MIME type.
pub fn check_image(upload: &ImageUpload) -> Result<&'static str, &'static str> {
    if upload.data.is_empty() {
        return Err("The submitted file is empty.");
    }

    let format = image::guess_format(&upload.data).map_err(|_| INVALID_IMAGE)?;
    if !matches!(
        format,
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP
    ) {
        return Err(INVALID_IMAGE);
    }

    ImageReader::with_format(Cursor::new(upload.data.as_slice()), format)
        .into_dimensions()
        .map_err(|_| INVALID_IMAGE)?;

    Ok(format.to_mime_type())
}
