use async_trait::async_trait;
use uuid::Uuid;

use crate::posts::listing::{PostQuery, PostScope};
use crate::posts::repo_types::{Membership, NewPost, Post, PostRow, Reaction};
use crate::store::{PgStore, PostStore, StoreError};

const POST_COLUMNS: &str = "id, headline, location, message, level, created_at, created_by, \
                            num_of_likes, liked_by, saved_fav_by";

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl PostStore for PgStore {
    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO surf_posts (id, headline, location, message, level, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&post.headline)
            .bind(&post.location)
            .bind(&post.message)
            .bind(post.level.as_str())
            .bind(post.created_by)
            .fetch_one(&self.db)
            .await?;
        row.try_into()
    }

    async fn find_posts(&self, query: &PostQuery) -> Result<Vec<Post>, StoreError> {
        let (predicate, user) = match query.scope {
            PostScope::All => ("TRUE", None),
            PostScope::CreatedBy(owner) => ("created_by = $3", Some(owner)),
            PostScope::FavoritedBy(user) => ("$3 = ANY(saved_fav_by)", Some(user)),
        };
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM surf_posts
            WHERE {predicate}
            ORDER BY {order}
            LIMIT $1 OFFSET $2
            "#,
            order = query.sort.order_by_sql(),
        );
        let mut q = sqlx::query_as::<_, PostRow>(&sql)
            .bind(to_i64(query.limit))
            .bind(to_i64(query.skip));
        if let Some(user) = user {
            q = q.bind(user);
        }
        let rows = q.fetch_all(&self.db).await?;
        rows.into_iter().map(Post::try_from).collect()
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM surf_posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        row.map(Post::try_from).transpose()
    }

    async fn update_message(
        &self,
        id: Uuid,
        owner: Uuid,
        message: &str,
    ) -> Result<Option<Post>, StoreError> {
        let sql = format!(
            r#"
            UPDATE surf_posts SET message = $3
            WHERE id = $1 AND created_by = $2
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(owner)
            .bind(message)
            .fetch_optional(&self.db)
            .await?;
        row.map(Post::try_from).transpose()
    }

    async fn delete_post(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM surf_posts WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn apply_reaction(
        &self,
        id: Uuid,
        user: Uuid,
        reaction: Reaction,
        change: Membership,
    ) -> Result<bool, StoreError> {
        let set_clause = match (reaction, change) {
            (Reaction::Like, Membership::Add) => {
                "num_of_likes = num_of_likes + 1, \
                 liked_by = CASE WHEN $2 = ANY(liked_by) THEN liked_by \
                            ELSE array_append(liked_by, $2) END"
            }
            (Reaction::Like, Membership::Remove) => {
                "num_of_likes = num_of_likes - 1, liked_by = array_remove(liked_by, $2)"
            }
            (Reaction::Favorite, Membership::Add) => {
                "saved_fav_by = CASE WHEN $2 = ANY(saved_fav_by) THEN saved_fav_by \
                                ELSE array_append(saved_fav_by, $2) END"
            }
            (Reaction::Favorite, Membership::Remove) => {
                "saved_fav_by = array_remove(saved_fav_by, $2)"
            }
        };
        let sql = format!("UPDATE surf_posts SET {set_clause} WHERE id = $1");
        let res = sqlx::query(&sql)
            .bind(id)
            .bind(user)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
