//! Poem service
//!
//! Public reads only ever see published poems. Admin writes follow the
//! shared mutation path: validate, resolve the slug, store, then replace the
//! bhav set when the body carries one.

use chrono::Utc;
use std::sync::Arc;

use crate::db::repositories::{BhavRepository, BookRepository, PoemQuery, PoemRepository};
use crate::models::{LikeResult, ListParams, PagedResult, Poem, PoemDetail, PoemFilter, PoemInput};
use crate::services::bhav::resolve_bhav_ids;
use crate::services::content::{
    optional_text, optional_url, require_slug, require_text, slug_conflict, ContentError, ContentResult,
};
use crate::services::slug::slug_or_title;

pub const MAX_CONTENT_LENGTH: usize = 50_000;

/// Visitor fingerprint for one-like-per-visitor: md5 of IP and user agent
pub fn fingerprint(ip: &str, user_agent: &str) -> String {
    let data = format!("{}:{}", ip, user_agent);
    format!("{:x}", md5::compute(data))
}

pub struct PoemService {
    repo: Arc<dyn PoemRepository>,
    bhav_repo: Arc<dyn BhavRepository>,
    book_repo: Arc<dyn BookRepository>,
}

impl PoemService {
    pub fn new(
        repo: Arc<dyn PoemRepository>,
        bhav_repo: Arc<dyn BhavRepository>,
        book_repo: Arc<dyn BookRepository>,
    ) -> Self {
        Self {
            repo,
            bhav_repo,
            book_repo,
        }
    }

    /// Published poems, newest first. Unknown bhav or book slugs match nothing.
    pub async fn list_published(&self, filter: &PoemFilter, params: &ListParams) -> ContentResult<PagedResult<Poem>> {
        let mut query = PoemQuery {
            featured: filter.featured,
            published_only: true,
            ..Default::default()
        };

        if let Some(slug) = filter.bhav.as_deref().filter(|s| !s.is_empty()) {
            match self.bhav_repo.get_by_slug(slug).await? {
                Some(bhav) => query.bhav_id = Some(bhav.id),
                None => return Ok(PagedResult::new(Vec::new(), 0, params)),
            }
        }
        if let Some(slug) = filter.book.as_deref().filter(|s| !s.is_empty()) {
            match self.book_repo.get_by_slug(slug).await? {
                Some(book) if book.is_published => query.book_id = Some(book.id),
                _ => return Ok(PagedResult::new(Vec::new(), 0, params)),
            }
        }

        self.page(&query, params).await
    }

    /// Featured published poems for the homepage
    pub async fn list_featured(&self, limit: u32) -> ContentResult<Vec<Poem>> {
        let query = PoemQuery {
            featured: Some(true),
            published_only: true,
            ..Default::default()
        };
        Ok(self.repo.list(&query, 0, limit as i64).await?)
    }

    pub async fn get_published_by_slug(&self, slug: &str) -> ContentResult<PoemDetail> {
        let poem = self.published(slug).await?;
        self.hydrate(poem, true).await
    }

    /// Every poem, drafts included
    pub async fn list_admin(&self, params: &ListParams) -> ContentResult<PagedResult<Poem>> {
        self.page(&PoemQuery::default(), params).await
    }

    pub async fn get(&self, id: i64) -> ContentResult<PoemDetail> {
        let poem = self.find(id).await?;
        self.hydrate(poem, false).await
    }

    pub async fn create(&self, input: PoemInput) -> ContentResult<PoemDetail> {
        let now = Utc::now();
        let mut poem = Poem {
            id: 0,
            title: String::new(),
            slug: String::new(),
            content: String::new(),
            excerpt: None,
            language: None,
            cover_image: None,
            book_id: None,
            is_featured: false,
            is_published: false,
            like_count: 0,
            view_count: 0,
            published_at: None,
            created_at: now,
            updated_at: now,
        };
        let bhav_ids = self.apply(&mut poem, input, None).await?;

        let created = self.repo.create(&poem).await.map_err(slug_conflict(&poem.slug))?;
        if let Some(ids) = bhav_ids {
            self.repo.set_bhavs(created.id, &ids).await?;
        }
        tracing::info!("Created poem '{}'", created.slug);
        self.hydrate(created, false).await
    }

    pub async fn update(&self, id: i64, input: PoemInput) -> ContentResult<PoemDetail> {
        let mut poem = self.find(id).await?;
        let bhav_ids = self.apply(&mut poem, input, Some(id)).await?;

        let updated = self.repo.update(&poem).await.map_err(slug_conflict(&poem.slug))?;
        if let Some(ids) = bhav_ids {
            self.repo.set_bhavs(id, &ids).await?;
        }
        self.hydrate(updated, false).await
    }

    pub async fn delete(&self, id: i64) -> ContentResult<()> {
        let poem = self.find(id).await?;
        self.repo.delete(id).await?;
        tracing::info!("Deleted poem '{}'", poem.slug);
        Ok(())
    }

    /// Like or unlike a published poem for one visitor
    pub async fn toggle_like(&self, slug: &str, fingerprint: &str) -> ContentResult<LikeResult> {
        let poem = self.published(slug).await?;
        Ok(self.repo.toggle_like(poem.id, fingerprint).await?)
    }

    /// Count a view; returns the new view count
    pub async fn record_view(&self, slug: &str) -> ContentResult<i64> {
        let poem = self.published(slug).await?;
        Ok(self.repo.increment_view(poem.id).await?)
    }

    pub async fn count(&self, published_only: bool) -> ContentResult<i64> {
        let query = PoemQuery {
            published_only,
            ..Default::default()
        };
        Ok(self.repo.count(&query).await?)
    }

    async fn page(&self, query: &PoemQuery, params: &ListParams) -> ContentResult<PagedResult<Poem>> {
        let items = self.repo.list(query, params.offset(), params.limit()).await?;
        let total = self.repo.count(query).await?;
        Ok(PagedResult::new(items, total, params))
    }

    async fn find(&self, id: i64) -> ContentResult<Poem> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ContentError::NotFound("Poem".into()))
    }

    async fn published(&self, slug: &str) -> ContentResult<Poem> {
        match self.repo.get_by_slug(slug).await? {
            Some(poem) if poem.is_published => Ok(poem),
            _ => Err(ContentError::NotFound("Poem".into())),
        }
    }

    async fn hydrate(&self, poem: Poem, public: bool) -> ContentResult<PoemDetail> {
        let bhavs = self.bhav_repo.list_for_poem(poem.id).await?;
        let book = match poem.book_id {
            Some(book_id) => self
                .book_repo
                .get_by_id(book_id)
                .await?
                .filter(|b| !public || b.is_published),
            None => None,
        };
        Ok(PoemDetail { poem, bhavs, book })
    }

    /// Validate `input` onto `poem`. Returns the bhav set to store, if any.
    async fn apply(&self, poem: &mut Poem, input: PoemInput, exclude_id: Option<i64>) -> ContentResult<Option<Vec<i64>>> {
        let title = require_text("Title", &input.title, 200)?;
        let slug = require_slug(slug_or_title(input.slug.as_deref(), &title))?;
        if self.repo.exists_by_slug(&slug, exclude_id).await? {
            return Err(ContentError::DuplicateSlug(slug));
        }

        let content = input.content.trim_end().to_string();
        if content.trim().is_empty() {
            return Err(ContentError::Validation("Content is required".into()));
        }
        if content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(ContentError::Validation(format!(
                "Content must be at most {} characters",
                MAX_CONTENT_LENGTH
            )));
        }

        if let Some(book_id) = input.book_id {
            if self.book_repo.get_by_id(book_id).await?.is_none() {
                return Err(ContentError::Validation(format!("Unknown book id: {}", book_id)));
            }
        }

        let bhav_ids = match input.bhav_ids {
            Some(ids) => Some(resolve_bhav_ids(self.bhav_repo.as_ref(), &ids).await?),
            None => None,
        };

        poem.title = title;
        poem.slug = slug;
        poem.content = content;
        poem.excerpt = optional_text("Excerpt", input.excerpt, 500)?;
        poem.language = optional_text("Language", input.language, 20)?;
        poem.cover_image = optional_url("Cover image", input.cover_image)?;
        poem.book_id = input.book_id;
        poem.is_featured = input.is_featured;
        poem.is_published = input.is_published;
        poem.published_at = input.published_at.or(poem.published_at);
        if poem.is_published && poem.published_at.is_none() {
            poem.published_at = Some(Utc::now());
        }
        Ok(bhav_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxBhavRepository, SqlxBookRepository, SqlxPoemRepository};
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::models::{BhavInput, BookInput};
    use crate::services::bhav::BhavService;
    use crate::services::book::BookService;

    struct Fixture {
        poems: PoemService,
        bhavs: BhavService,
        books: BookService,
    }

    async fn fixture() -> Fixture {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let poem_repo = SqlxPoemRepository::boxed(pool.clone());
        let bhav_repo = SqlxBhavRepository::boxed(pool.clone());
        let book_repo = SqlxBookRepository::boxed(pool);
        Fixture {
            poems: PoemService::new(poem_repo.clone(), bhav_repo.clone(), book_repo.clone()),
            bhavs: BhavService::new(bhav_repo),
            books: BookService::new(book_repo, poem_repo),
        }
    }

    fn input(title: &str) -> PoemInput {
        PoemInput {
            title: title.into(),
            content: "Rain on the roof\nand you, still away".into(),
            is_published: true,
            ..Default::default()
        }
    }

    async fn bhav(f: &Fixture, name: &str) -> i64 {
        f.bhavs
            .create(BhavInput {
                name: name.into(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_sets_slug_and_published_at() {
        let f = fixture().await;
        let poem = f.poems.create(input("Monsoon Letters")).await.unwrap();
        assert_eq!(poem.poem.slug, "monsoon-letters");
        assert!(poem.poem.published_at.is_some());

        let mut draft = input("Draft");
        draft.is_published = false;
        let draft = f.poems.create(draft).await.unwrap();
        assert!(draft.poem.published_at.is_none());
        assert!(matches!(
            f.poems.get_published_by_slug("draft").await,
            Err(ContentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let f = fixture().await;
        let first = f.poems.create(input("Monsoon Letters")).await.unwrap();
        assert!(matches!(
            f.poems.create(input("Monsoon  letters!")).await,
            Err(ContentError::DuplicateSlug(s)) if s == "monsoon-letters"
        ));
        // Updating a poem with its own slug is fine
        assert!(f.poems.update(first.poem.id, input("Monsoon Letters")).await.is_ok());
    }

    #[tokio::test]
    async fn test_validation() {
        let f = fixture().await;
        let mut empty = input("Empty");
        empty.content = " \n ".into();
        assert!(matches!(f.poems.create(empty).await, Err(ContentError::Validation(_))));
        assert!(f.poems.create(input("???")).await.is_err());

        let mut bad_book = input("Orphan");
        bad_book.book_id = Some(77);
        assert!(matches!(f.poems.create(bad_book).await, Err(ContentError::Validation(_))));

        let mut bad_bhav = input("Untagged");
        bad_bhav.bhav_ids = Some(vec![99]);
        assert!(matches!(f.poems.create(bad_bhav).await, Err(ContentError::Validation(_))));
    }

    #[tokio::test]
    async fn test_bhav_set_replaced_on_update() {
        let f = fixture().await;
        let a = bhav(&f, "Virah").await;
        let b = bhav(&f, "Shringar").await;
        let c = bhav(&f, "Karuna").await;

        let mut tagged = input("Tagged");
        tagged.bhav_ids = Some(vec![a, b]);
        let poem = f.poems.create(tagged).await.unwrap();
        assert_eq!(poem.bhavs.len(), 2);

        let mut retag = input("Tagged");
        retag.bhav_ids = Some(vec![c]);
        let poem = f.poems.update(poem.poem.id, retag).await.unwrap();
        assert_eq!(poem.bhavs.iter().map(|b| b.id).collect::<Vec<_>>(), vec![c]);

        // No bhav_ids leaves the set alone
        let poem = f.poems.update(poem.poem.id, input("Tagged")).await.unwrap();
        assert_eq!(poem.bhavs.len(), 1);
    }

    #[tokio::test]
    async fn test_filters() {
        let f = fixture().await;
        let a = bhav(&f, "Virah").await;
        let book = f
            .books
            .create(BookInput {
                title: "Baarish".into(),
                is_published: true,
                ..Default::default()
            })
            .await
            .unwrap();

        let mut one = input("One");
        one.bhav_ids = Some(vec![a]);
        one.is_featured = true;
        f.poems.create(one).await.unwrap();
        let mut two = input("Two");
        two.book_id = Some(book.id);
        f.poems.create(two).await.unwrap();

        let params = ListParams::default();
        let by_bhav = PoemFilter {
            bhav: Some("virah".into()),
            ..Default::default()
        };
        assert_eq!(f.poems.list_published(&by_bhav, &params).await.unwrap().total, 1);

        let by_book = PoemFilter {
            book: Some("baarish".into()),
            ..Default::default()
        };
        let page = f.poems.list_published(&by_book, &params).await.unwrap();
        assert_eq!(page.items[0].slug, "two");

        let unknown = PoemFilter {
            bhav: Some("nope".into()),
            ..Default::default()
        };
        assert_eq!(f.poems.list_published(&unknown, &params).await.unwrap().total, 0);
        assert_eq!(f.poems.list_featured(6).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_like_toggles_and_views_count() {
        let f = fixture().await;
        f.poems.create(input("Liked")).await.unwrap();
        let visitor = fingerprint("10.0.0.1", "Firefox");

        let liked = f.poems.toggle_like("liked", &visitor).await.unwrap();
        assert_eq!(liked, LikeResult { liked: true, like_count: 1 });
        let unliked = f.poems.toggle_like("liked", &visitor).await.unwrap();
        assert_eq!(unliked, LikeResult { liked: false, like_count: 0 });

        assert_eq!(f.poems.record_view("liked").await.unwrap(), 1);
        assert_eq!(f.poems.record_view("liked").await.unwrap(), 2);
        assert!(matches!(
            f.poems.toggle_like("missing", &visitor).await,
            Err(ContentError::NotFound(_))
        ));
    }

    #[test]
    fn test_fingerprint() {
        let a = fingerprint("10.0.0.1", "Firefox");
        assert_eq!(a.len(), 32);
        assert_eq!(a, fingerprint("10.0.0.1", "Firefox"));
        assert_ne!(a, fingerprint("10.0.0.2", "Firefox"));
    }
}
