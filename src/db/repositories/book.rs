//! Book repository

use crate::db::DbPool;
use crate::models::Book;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Book repository trait
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn create(&self, book: &Book) -> Result<Book>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Book>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Book>>;

    async fn update(&self, book: &Book) -> Result<Book>;

    /// Delete a book, clearing `book_id` on its poems first
    async fn delete(&self, id: i64) -> Result<u64>;

    /// Books by `sort_order`, then newest first
    async fn list(&self, published_only: bool) -> Result<Vec<Book>>;

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}

/// SQLx-based book repository implementation
pub struct SqlxBookRepository {
    pool: DbPool,
}

impl SqlxBookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn BookRepository> {
        Arc::new(Self::new(pool))
    }
}

const BOOK_COLUMNS: &str = "id, title, slug, description, cover_image, purchase_url, publisher, \
     published_year, is_published, sort_order, created_at, updated_at";

#[async_trait]
impl BookRepository for SqlxBookRepository {
    async fn create(&self, book: &Book) -> Result<Book> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO books (title, slug, description, cover_image, purchase_url, publisher,
                published_year, is_published, sort_order, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&book.title)
        .bind(&book.slug)
        .bind(&book.description)
        .bind(&book.cover_image)
        .bind(&book.purchase_url)
        .bind(&book.publisher)
        .bind(book.published_year)
        .bind(book.is_published)
        .bind(book.sort_order)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create book")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .context("Book not found after creation")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Book>> {
        let row = sqlx::query(&format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get book by ID")?;
        Ok(row.map(|r| row_to_book(&r)))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Book>> {
        let row = sqlx::query(&format!("SELECT {} FROM books WHERE slug = ?", BOOK_COLUMNS))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get book by slug")?;
        Ok(row.map(|r| row_to_book(&r)))
    }

    async fn update(&self, book: &Book) -> Result<Book> {
        sqlx::query(
            r#"
            UPDATE books SET title = ?, slug = ?, description = ?, cover_image = ?,
                purchase_url = ?, publisher = ?, published_year = ?, is_published = ?,
                sort_order = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&book.title)
        .bind(&book.slug)
        .bind(&book.description)
        .bind(&book.cover_image)
        .bind(&book.purchase_url)
        .bind(&book.publisher)
        .bind(book.published_year)
        .bind(book.is_published)
        .bind(book.sort_order)
        .bind(Utc::now())
        .bind(book.id)
        .execute(&self.pool)
        .await
        .context("Failed to update book")?;

        self.get_by_id(book.id)
            .await?
            .context("Book not found after update")
    }

    async fn delete(&self, id: i64) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let detached = sqlx::query("UPDATE poems SET book_id = NULL WHERE book_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to detach poems from book")?
            .rows_affected();

        sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete book")?;

        tx.commit().await.context("Failed to commit book delete")?;
        Ok(detached)
    }

    async fn list(&self, published_only: bool) -> Result<Vec<Book>> {
        let sql = format!(
            "SELECT {} FROM books {} ORDER BY sort_order ASC, COALESCE(published_year, 0) DESC, id DESC",
            BOOK_COLUMNS,
            if published_only { "WHERE is_published = 1" } else { "" }
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list books")?;
        Ok(rows.iter().map(row_to_book).collect())
    }

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM books WHERE slug = ? AND id != ?")
            .bind(slug)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(&self.pool)
            .await
            .context("Failed to check book slug")?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM books")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count books")?;
        Ok(row.get("count"))
    }
}

fn row_to_book(row: &sqlx::sqlite::SqliteRow) -> Book {
    Book {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
        cover_image: row.get("cover_image"),
        purchase_url: row.get("purchase_url"),
        publisher: row.get("publisher"),
        published_year: row.get("published_year"),
        is_published: row.get("is_published"),
        sort_order: row.get("sort_order"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};

    fn book(slug: &str, sort_order: i32, published: bool) -> Book {
        let now = Utc::now();
        Book {
            id: 0,
            title: slug.to_string(),
            slug: slug.to_string(),
            description: None,
            cover_image: None,
            purchase_url: Some("https://books.example.com/buy".to_string()),
            publisher: Some("Rajkamal".to_string()),
            published_year: Some(2021),
            is_published: published,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_delete_detaches_poems() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqlxBookRepository::new(pool.clone());

        let b = repo.create(&book("pehli-kitaab", 0, true)).await.unwrap();
        for slug in ["p1", "p2"] {
            sqlx::query("INSERT INTO poems (title, slug, content, book_id) VALUES (?, ?, 'x', ?)")
                .bind(slug)
                .bind(slug)
                .bind(b.id)
                .execute(&pool)
                .await
                .unwrap();
        }

        assert_eq!(repo.delete(b.id).await.unwrap(), 2);
        assert!(repo.get_by_id(b.id).await.unwrap().is_none());

        let row = sqlx::query("SELECT COUNT(*) as count FROM poems WHERE book_id IS NULL")
            .fetch_one(&pool)
            .await
            .unwrap();
        let orphaned: i64 = row.get("count");
        assert_eq!(orphaned, 2);
    }

    #[tokio::test]
    async fn test_list_order_and_published_filter() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqlxBookRepository::new(pool);

        repo.create(&book("second", 2, true)).await.unwrap();
        repo.create(&book("first", 1, true)).await.unwrap();
        repo.create(&book("draft", 0, false)).await.unwrap();

        let published: Vec<_> = repo.list(true).await.unwrap().into_iter().map(|b| b.slug).collect();
        assert_eq!(published, vec!["first", "second"]);
        assert_eq!(repo.list(false).await.unwrap().len(), 3);
    }
}
