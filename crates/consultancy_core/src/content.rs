//! crates/consultancy_core/src/content.rs
//!
//! Testimonials, blog posts, the about page and contact messages. Public
//! submissions and reads, plus the admin-side create/update/list operations.

use crate::domain::{
    About, AdminIdentity, BlogPost, BlogPostDraft, ContactMessage, NewContactMessage,
    NewTestimonial, Testimonial,
};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{DatabaseService, FileStore, PortError};
use crate::seed::SeedContent;
use crate::uploads::discard_upload;
use crate::validation::{optional, parse_rating, parse_tags, required, slugify, validate_email};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Content of the about page until an administrator writes one.
pub const DEFAULT_ABOUT_CONTENT: &str =
    "Default About Us content. Please update via admin dashboard.";

//=========================================================================================
// Form Inputs
//=========================================================================================

#[derive(Debug, Clone, Default)]
pub struct TestimonialForm {
    pub name: Option<String>,
    pub org: Option<String>,
    pub rating: Option<String>,
    pub text: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BlogPostForm {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Comma-separated.
    pub tags: Option<String>,
    /// Newly uploaded image, if any.
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AboutForm {
    pub content: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

//=========================================================================================
// Content Service
//=========================================================================================

#[derive(Clone)]
pub struct ContentService {
    db: Arc<dyn DatabaseService>,
    files: Arc<dyn FileStore>,
    seed: Option<SeedContent>,
}

impl ContentService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        files: Arc<dyn FileStore>,
        seed: Option<SeedContent>,
    ) -> Self {
        Self { db, files, seed }
    }

    /// Passes `result` through, removing the upload first when it is an error.
    async fn or_discard<T>(
        &self,
        upload: Option<&str>,
        result: ServiceResult<T>,
    ) -> ServiceResult<T> {
        if result.is_err() {
            discard_upload(self.files.as_ref(), upload).await;
        }
        result
    }

    // --- Testimonials ---

    /// Stores a public testimonial submission. It stays hidden until approved.
    pub async fn submit_testimonial(&self, form: TestimonialForm) -> ServiceResult<Testimonial> {
        let photo = form.photo_url.clone();
        let result = async {
            let testimonial = NewTestimonial {
                name: required("name", form.name.as_deref())?,
                text: required("text", form.text.as_deref())?,
                org: optional(form.org.as_deref()),
                rating: parse_rating(form.rating.as_deref())?,
                photo: optional(form.photo_url.as_deref()),
            };
            Ok(self.db.create_testimonial(testimonial).await?)
        }
        .await;
        let testimonial = self.or_discard(photo.as_deref(), result).await?;
        info!("Testimonial {} submitted for review", testimonial.id);
        Ok(testimonial)
    }

    /// Approved testimonials, newest first, followed by seed entries.
    pub async fn approved_testimonials(&self) -> ServiceResult<Vec<Testimonial>> {
        let live = self.db.list_testimonials(true).await?;
        Ok(match &self.seed {
            Some(seed) => seed.merge_testimonials(live),
            None => live,
        })
    }

    // --- Blog ---

    pub async fn list_blog_posts(&self) -> ServiceResult<Vec<BlogPost>> {
        let live = self.db.list_blog_posts().await?;
        Ok(match &self.seed {
            Some(seed) => seed.merge_blog_posts(live),
            None => live,
        })
    }

    pub async fn blog_post(&self, slug: &str) -> ServiceResult<BlogPost> {
        match self.db.get_blog_post_by_slug(slug).await {
            Ok(post) => Ok(post),
            Err(PortError::NotFound(_)) => self
                .seed
                .as_ref()
                .and_then(|seed| seed.blog_post(slug))
                .ok_or_else(|| ServiceError::NotFound("Blog post not found".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// All live posts, without seed content.
    pub async fn admin_blog_posts(&self, _admin: &AdminIdentity) -> ServiceResult<Vec<BlogPost>> {
        Ok(self.db.list_blog_posts().await?)
    }

    pub async fn create_blog_post(
        &self,
        admin: &AdminIdentity,
        form: BlogPostForm,
    ) -> ServiceResult<BlogPost> {
        let image = form.image_url.clone();
        let result = async {
            let draft = blog_draft(&form, optional(form.image_url.as_deref()))?;
            self.db.create_blog_post(draft).await.map_err(duplicate_slug)
        }
        .await;
        let post = self.or_discard(image.as_deref(), result).await?;
        info!("{} published blog post {}", admin.email, post.slug);
        Ok(post)
    }

    /// Replaces a post's fields. Without a new upload the current image is kept;
    /// with one, the previous image is removed once the update has succeeded.
    pub async fn update_blog_post(
        &self,
        admin: &AdminIdentity,
        post_id: Uuid,
        form: BlogPostForm,
    ) -> ServiceResult<BlogPost> {
        let new_image = optional(form.image_url.as_deref());
        let result = async {
            let existing = self.db.get_blog_post(post_id).await?;
            let image = new_image.clone().or_else(|| existing.image.clone());
            let draft = blog_draft(&form, image)?;
            let updated = self
                .db
                .update_blog_post(post_id, draft)
                .await
                .map_err(duplicate_slug)?;
            Ok((existing, updated))
        }
        .await;
        let (existing, updated) = self.or_discard(new_image.as_deref(), result).await?;

        if new_image.is_some() && existing.image != updated.image {
            discard_upload(self.files.as_ref(), existing.image.as_deref()).await;
        }
        info!("{} updated blog post {}", admin.email, updated.slug);
        Ok(updated)
    }

    // --- About ---

    /// The about record, created with default content on first read.
    pub async fn about(&self) -> ServiceResult<About> {
        match self.db.get_about().await? {
            Some(about) => Ok(about),
            None => Ok(self.db.save_about(DEFAULT_ABOUT_CONTENT, None).await?),
        }
    }

    pub async fn update_about(&self, admin: &AdminIdentity, form: AboutForm) -> ServiceResult<About> {
        let new_image = optional(form.image_url.as_deref());
        let result = async {
            let existing = self.db.get_about().await?;
            let content = optional(form.content.as_deref())
                .or_else(|| existing.as_ref().map(|a| a.content.clone()))
                .unwrap_or_else(|| DEFAULT_ABOUT_CONTENT.to_string());
            let previous_image = existing.and_then(|a| a.image);
            let image = new_image.clone().or_else(|| previous_image.clone());
            let saved = self.db.save_about(&content, image.as_deref()).await?;
            Ok((previous_image, saved))
        }
        .await;
        let (previous_image, saved) = self.or_discard(new_image.as_deref(), result).await?;

        if new_image.is_some() && previous_image != saved.image {
            discard_upload(self.files.as_ref(), previous_image.as_deref()).await;
        }
        info!("{} updated the about page", admin.email);
        Ok(saved)
    }

    // --- Contact messages ---

    pub async fn submit_contact_message(&self, form: ContactForm) -> ServiceResult<ContactMessage> {
        let email = required("email", form.email.as_deref())?;
        validate_email(&email)?;
        let message = NewContactMessage {
            name: required("name", form.name.as_deref())?,
            email,
            phone: optional(form.phone.as_deref()),
            subject: required("subject", form.subject.as_deref())?,
            message: required("message", form.message.as_deref())?,
        };
        let saved = self.db.create_contact_message(message).await?;
        info!("Contact message {} received: {}", saved.id, saved.subject);
        Ok(saved)
    }

    pub async fn contact_messages(&self, _admin: &AdminIdentity) -> ServiceResult<Vec<ContactMessage>> {
        Ok(self.db.list_contact_messages().await?)
    }

    pub async fn contact_message(
        &self,
        _admin: &AdminIdentity,
        message_id: Uuid,
    ) -> ServiceResult<ContactMessage> {
        Ok(self.db.get_contact_message(message_id).await?)
    }
}

fn blog_draft(form: &BlogPostForm, image: Option<String>) -> ServiceResult<BlogPostDraft> {
    let title = required("title", form.title.as_deref())?;
    let content = required("content", form.content.as_deref())?;
    let slug = slugify(&title);
    if slug.is_empty() {
        return Err(ServiceError::Validation(
            "title must contain letters or digits".to_string(),
        ));
    }
    Ok(BlogPostDraft {
        title,
        slug,
        content,
        image,
        tags: parse_tags(form.tags.as_deref()),
    })
}

fn duplicate_slug(err: PortError) -> ServiceError {
    match err {
        PortError::Conflict(_) => {
            ServiceError::Validation("A blog post with this title already exists".to_string())
        }
        other => other.into(),
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Upload;
    use crate::mocks::{InMemoryDatabase, MemoryFileStore};
    use chrono::Utc;

    fn admin() -> AdminIdentity {
        AdminIdentity {
            admin_id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
        }
    }

    fn service(seed: Option<SeedContent>) -> (Arc<InMemoryDatabase>, Arc<MemoryFileStore>, ContentService) {
        let db = Arc::new(InMemoryDatabase::new());
        let files = Arc::new(MemoryFileStore::new());
        (db.clone(), files.clone(), ContentService::new(db, files, seed))
    }

    async fn upload(files: &MemoryFileStore, name: &str) -> String {
        files
            .save(&Upload {
                file_name: name.to_string(),
                content_type: "image/png".to_string(),
                bytes: vec![1],
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn submitted_testimonials_wait_for_approval() {
        let (db, _, content) = service(None);
        let t = content
            .submit_testimonial(TestimonialForm {
                name: Some("Chen".to_string()),
                text: Some("Calm under pressure".to_string()),
                rating: Some("5".to_string()),
                ..TestimonialForm::default()
            })
            .await
            .unwrap();
        assert!(!t.approved);
        assert!(content.approved_testimonials().await.unwrap().is_empty());

        db.approve_testimonial(t.id).await.unwrap();
        assert_eq!(content.approved_testimonials().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_testimonial_discards_photo() {
        let (_, files, content) = service(None);
        let photo = upload(&files, "me.png").await;
        let err = content
            .submit_testimonial(TestimonialForm {
                name: Some("Chen".to_string()),
                photo_url: Some(photo.clone()),
                ..TestimonialForm::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(!files.contains(&photo).await);
    }

    #[tokio::test]
    async fn seed_content_follows_live_content() {
        let (_, _, content) = service(Some(SeedContent::demonstration(Utc::now())));
        let live = content
            .create_blog_post(
                &admin(),
                BlogPostForm {
                    title: Some("Crisis Communication Best Practices".to_string()),
                    content: Some("Live version".to_string()),
                    tags: Some("Crisis, PR".to_string()),
                    image_url: None,
                },
            )
            .await
            .unwrap();
        let posts = content.list_blog_posts().await.unwrap();
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].id, live.id);
        assert_eq!(posts[0].tags, vec!["Crisis", "PR"]);

        let seeded = content
            .blog_post("building-authentic-brand-stories")
            .await
            .unwrap();
        assert_eq!(seeded.title, "Building Authentic Brand Stories");
        assert!(content.blog_post("nope").await.is_err());
    }

    #[tokio::test]
    async fn updating_post_image_replaces_old_file() {
        let (_, files, content) = service(None);
        let old = upload(&files, "old.png").await;
        let post = content
            .create_blog_post(
                &admin(),
                BlogPostForm {
                    title: Some("Hello World".to_string()),
                    content: Some("Body".to_string()),
                    tags: None,
                    image_url: Some(old.clone()),
                },
            )
            .await
            .unwrap();
        assert_eq!(post.slug, "hello-world");

        let kept = content
            .update_blog_post(
                &admin(),
                post.id,
                BlogPostForm {
                    title: Some("Hello Again".to_string()),
                    content: Some("Body 2".to_string()),
                    ..BlogPostForm::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(kept.image.as_deref(), Some(old.as_str()));
        assert_eq!(kept.slug, "hello-again");

        let new = upload(&files, "new.png").await;
        let replaced = content
            .update_blog_post(
                &admin(),
                post.id,
                BlogPostForm {
                    title: Some("Hello Again".to_string()),
                    content: Some("Body 3".to_string()),
                    tags: None,
                    image_url: Some(new.clone()),
                },
            )
            .await
            .unwrap();
        assert_eq!(replaced.image.as_deref(), Some(new.as_str()));
        assert!(!files.contains(&old).await);
        assert!(files.contains(&new).await);
    }

    #[tokio::test]
    async fn duplicate_title_is_a_validation_error_and_keeps_no_upload() {
        let (_, files, content) = service(None);
        let form = BlogPostForm {
            title: Some("Same".to_string()),
            content: Some("Body".to_string()),
            ..BlogPostForm::default()
        };
        content.create_blog_post(&admin(), form.clone()).await.unwrap();

        let image = upload(&files, "dup.png").await;
        let err = content
            .create_blog_post(
                &admin(),
                BlogPostForm {
                    image_url: Some(image.clone()),
                    ..form
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(!files.contains(&image).await);
    }

    #[tokio::test]
    async fn about_is_created_lazily_and_keeps_content_on_image_only_update() {
        let (_, files, content) = service(None);
        let about = content.about().await.unwrap();
        assert_eq!(about.content, DEFAULT_ABOUT_CONTENT);

        let updated = content
            .update_about(
                &admin(),
                AboutForm {
                    content: Some("We tell your story.".to_string()),
                    image_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, about.id);

        let image = upload(&files, "team.png").await;
        let with_image = content
            .update_about(
                &admin(),
                AboutForm {
                    content: None,
                    image_url: Some(image.clone()),
                },
            )
            .await
            .unwrap();
        assert_eq!(with_image.content, "We tell your story.");
        assert_eq!(with_image.image.as_deref(), Some(image.as_str()));
    }

    #[tokio::test]
    async fn contact_messages_require_fields_and_valid_email() {
        let (_, _, content) = service(None);
        let mut form = ContactForm {
            name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            phone: None,
            subject: Some("Media training".to_string()),
            message: Some("Do you run workshops?".to_string()),
        };
        let saved = content.submit_contact_message(form.clone()).await.unwrap();
        let fetched = content.contact_message(&admin(), saved.id).await.unwrap();
        assert_eq!(fetched, saved);

        form.email = Some("nope".to_string());
        assert!(content.submit_contact_message(form.clone()).await.is_err());
        form.email = Some("ada@example.com".to_string());
        form.subject = None;
        assert!(content.submit_contact_message(form).await.is_err());
        assert_eq!(content.contact_messages(&admin()).await.unwrap().len(), 1);
    }
}
