//! Database operations for posts and their tagged users.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, types::Type};
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    post::{CreatedPost, NewPost, Post, PostId, PostStore, UserTag},
    store::StoreErrorKind,
};

/// Initialize the post and post tag tables and indexes.
pub fn create_post_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS post (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            photo TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            author_id INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY(author_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_post_created_at ON post(created_at DESC, id DESC);

        CREATE TABLE IF NOT EXISTS post_tag (
            tag_id TEXT NOT NULL,
            post_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            uid INTEGER NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            PRIMARY KEY(post_id, tag_id),
            FOREIGN KEY(post_id) REFERENCES post(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_post_tag_post_id ON post_tag(post_id);",
    )?;

    Ok(())
}

/// Insert `post` with both timestamps set to `created_at`.
///
/// The post and its tags are written in one transaction.
pub fn insert_post(
    post: &NewPost,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<CreatedPost, Error> {
    let transaction = connection.unchecked_transaction()?;
    let timestamp = created_at.unix_timestamp();

    transaction.execute(
        "INSERT INTO post (title, photo, slug, description, author_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        (
            &post.title,
            &post.photo,
            &post.slug,
            &post.description,
            post.author_id.as_i64(),
            timestamp,
        ),
    )?;

    let id = transaction.last_insert_rowid();

    {
        let mut statement = transaction.prepare(
            "INSERT INTO post_tag (tag_id, post_id, position, uid, first_name, last_name)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;

        for (position, tag) in post.tagged_users.iter().enumerate() {
            statement.execute((
                &tag.tag_id,
                id,
                position as i64,
                tag.uid.as_i64(),
                &tag.first_name,
                &tag.last_name,
            ))?;
        }
    }

    transaction.commit()?;

    Ok(CreatedPost {
        id,
        created_at: from_timestamp(timestamp, 0)?,
    })
}

/// Retrieve a single post by ID.
pub fn get_post(post_id: PostId, connection: &Connection) -> Result<Post, Error> {
    let mut post = connection
        .prepare(
            "SELECT id, title, photo, slug, description, author_id, created_at, updated_at
            FROM post WHERE id = :id",
        )?
        .query_row(&[(":id", &post_id)], map_row)?;

    post.tagged_users = get_post_tags(post.id, connection)?;

    Ok(post)
}

/// Retrieve up to `page_size` posts, newest first, that come after the post
/// `cursor`.
///
/// Posts created in the same second are ordered by ID so the order is total
/// and pages never overlap.
///
/// # Errors
///
/// Returns [Error::NotFound] if `cursor` does not refer to a post.
pub fn get_posts_page(
    cursor: Option<PostId>,
    page_size: usize,
    connection: &Connection,
) -> Result<Vec<Post>, Error> {
    let limit = page_size as i64;

    let mut posts: Vec<Post> = match cursor {
        None => connection
            .prepare(
                "SELECT id, title, photo, slug, description, author_id, created_at, updated_at
                FROM post
                ORDER BY created_at DESC, id DESC
                LIMIT ?1",
            )?
            .query_map([limit], map_row)?
            .collect::<Result<_, _>>()?,
        Some(cursor) => {
            let cursor_created_at: i64 = connection.query_row(
                "SELECT created_at FROM post WHERE id = ?1",
                [cursor],
                |row| row.get(0),
            )?;

            connection
                .prepare(
                    "SELECT id, title, photo, slug, description, author_id, created_at, updated_at
                    FROM post
                    WHERE created_at < ?1 OR (created_at = ?1 AND id < ?2)
                    ORDER BY created_at DESC, id DESC
                    LIMIT ?3",
                )?
                .query_map((cursor_created_at, cursor, limit), map_row)?
                .collect::<Result<_, _>>()?
        }
    };

    for post in &mut posts {
        post.tagged_users = get_post_tags(post.id, connection)?;
    }

    Ok(posts)
}

/// Count the posts in the database.
pub fn count_posts(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM post;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

fn get_post_tags(post_id: PostId, connection: &Connection) -> Result<Vec<UserTag>, Error> {
    connection
        .prepare(
            "SELECT tag_id, uid, first_name, last_name FROM post_tag
            WHERE post_id = ?1 ORDER BY position ASC",
        )?
        .query_map([post_id], |row| {
            Ok(UserTag {
                tag_id: row.get(0)?,
                uid: UserID::new(row.get(1)?),
                first_name: row.get(2)?,
                last_name: row.get(3)?,
            })
        })?
        .map(|maybe_tag| maybe_tag.map_err(|error| error.into()))
        .collect()
}

fn map_row(row: &Row) -> Result<Post, rusqlite::Error> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        photo: row.get(2)?,
        slug: row.get(3)?,
        description: row.get(4)?,
        author_id: UserID::new(row.get(5)?),
        tagged_users: Vec::new(),
        created_at: from_timestamp(row.get(6)?, 6)?,
        updated_at: from_timestamp(row.get(7)?, 7)?,
    })
}

fn from_timestamp(timestamp: i64, column: usize) -> Result<OffsetDateTime, rusqlite::Error> {
    OffsetDateTime::from_unix_timestamp(timestamp).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(column, Type::Integer, Box::new(error))
    })
}

/// The SQLite implementation of [PostStore].
#[derive(Debug, Clone)]
pub struct SqlitePostStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqlitePostStore {
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn with_connection<T>(
        &self,
        operation: impl FnOnce(&Connection) -> Result<T, Error>,
    ) -> Result<T, StoreErrorKind> {
        let connection = self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            StoreErrorKind::from(Error::DatabaseLockError)
        })?;

        operation(&connection).map_err(StoreErrorKind::from)
    }
}

impl PostStore for SqlitePostStore {
    async fn create_post(&self, post: NewPost) -> Result<CreatedPost, StoreErrorKind> {
        self.with_connection(|connection| {
            insert_post(&post, OffsetDateTime::now_utc(), connection)
        })
    }

    async fn query_posts(
        &self,
        cursor: Option<PostId>,
        page_size: usize,
    ) -> Result<Vec<Post>, StoreErrorKind> {
        self.with_connection(|connection| get_posts_page(cursor, page_size, connection))
    }
}
