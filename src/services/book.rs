//! Book service

use chrono::Utc;
use std::sync::Arc;

use crate::db::repositories::{BookRepository, PoemQuery, PoemRepository};
use crate::models::{Book, BookDetail, BookInput};
use crate::services::content::{
    is_http_url, optional_text, optional_url, require_slug, require_text, slug_conflict, ContentError,
    ContentResult,
};
use crate::services::slug::slug_or_title;

/// Upper bound on poems listed on a book page
const BOOK_POEM_LIMIT: i64 = 500;

pub struct BookService {
    repo: Arc<dyn BookRepository>,
    poem_repo: Arc<dyn PoemRepository>,
}

impl BookService {
    pub fn new(repo: Arc<dyn BookRepository>, poem_repo: Arc<dyn PoemRepository>) -> Self {
        Self { repo, poem_repo }
    }

    /// Published books in display order
    pub async fn list_published(&self) -> ContentResult<Vec<Book>> {
        Ok(self.repo.list(true).await?)
    }

    /// A published book with its published poems
    pub async fn get_published_by_slug(&self, slug: &str) -> ContentResult<BookDetail> {
        let book = match self.repo.get_by_slug(slug).await? {
            Some(book) if book.is_published => book,
            _ => return Err(ContentError::NotFound("Book".into())),
        };
        let query = PoemQuery {
            book_id: Some(book.id),
            published_only: true,
            ..Default::default()
        };
        let poems = self.poem_repo.list(&query, 0, BOOK_POEM_LIMIT).await?;
        Ok(BookDetail { book, poems })
    }

    pub async fn list_admin(&self) -> ContentResult<Vec<Book>> {
        Ok(self.repo.list(false).await?)
    }

    pub async fn get(&self, id: i64) -> ContentResult<Book> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ContentError::NotFound("Book".into()))
    }

    pub async fn create(&self, input: BookInput) -> ContentResult<Book> {
        let now = Utc::now();
        let mut book = Book {
            id: 0,
            title: String::new(),
            slug: String::new(),
            description: None,
            cover_image: None,
            purchase_url: None,
            publisher: None,
            published_year: None,
            is_published: false,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        };
        self.apply(&mut book, input, None).await?;
        let created = self.repo.create(&book).await.map_err(slug_conflict(&book.slug))?;
        tracing::info!("Created book '{}'", created.slug);
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: BookInput) -> ContentResult<Book> {
        let mut book = self.get(id).await?;
        self.apply(&mut book, input, Some(id)).await?;
        Ok(self.repo.update(&book).await.map_err(slug_conflict(&book.slug))?)
    }

    /// Delete a book. Its poems stay, detached from the book.
    pub async fn delete(&self, id: i64) -> ContentResult<()> {
        let book = self.get(id).await?;
        let detached = self.repo.delete(id).await?;
        tracing::info!("Deleted book '{}', detached {} poems", book.slug, detached);
        Ok(())
    }

    pub async fn count(&self) -> ContentResult<i64> {
        Ok(self.repo.count().await?)
    }

    async fn apply(&self, book: &mut Book, input: BookInput, exclude_id: Option<i64>) -> ContentResult<()> {
        let title = require_text("Title", &input.title, 200)?;
        let slug = require_slug(slug_or_title(input.slug.as_deref(), &title))?;
        if self.repo.exists_by_slug(&slug, exclude_id).await? {
            return Err(ContentError::DuplicateSlug(slug));
        }
        if let Some(year) = input.published_year {
            if !(1000..=9999).contains(&year) {
                return Err(ContentError::Validation(
                    "Published year must have four digits".into(),
                ));
            }
        }
        let purchase_url = optional_text("Purchase URL", input.purchase_url, 500)?;
        if let Some(ref url) = purchase_url {
            if !is_http_url(url) {
                return Err(ContentError::Validation(
                    "Purchase URL must be an http(s) URL".into(),
                ));
            }
        }

        book.title = title;
        book.slug = slug;
        book.description = optional_text("Description", input.description, 5000)?;
        book.cover_image = optional_url("Cover image", input.cover_image)?;
        book.purchase_url = purchase_url;
        book.publisher = optional_text("Publisher", input.publisher, 200)?;
        book.published_year = input.published_year;
        book.is_published = input.is_published;
        book.sort_order = input.sort_order;
        Ok(())
    }
}
