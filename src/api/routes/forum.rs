//! Forum activity endpoints

use crate::api::routes::{internal_error, ErrorResponse};
use crate::api::server::AppState;
use crate::types::ForumActivity;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct ForumQuery {
    pub limit: Option<i64>,
}

/// Raw forum activity audit, newest first
pub async fn forum_feed(
    State(state): State<AppState>,
    Query(query): Query<ForumQuery>,
) -> Result<Json<Vec<ForumActivity>>, (StatusCode, Json<ErrorResponse>)> {
    let feed = state
        .db
        .forum_feed(query.limit.unwrap_or(50))
        .await
        .map_err(internal_error)?;
    Ok(Json(feed))
}

/// A post with its comments attached
#[derive(Debug, Serialize)]
pub struct Conversation {
    pub post_id: i64,
    pub post: Option<ForumActivity>,
    pub comments: Vec<ForumActivity>,
}

/// Group the flat activity audit into per-post conversations. Comments
/// without a recorded parent post still appear under their post id.
pub fn group_conversations(activity: &[ForumActivity]) -> Vec<Conversation> {
    let mut by_post: BTreeMap<i64, Conversation> = BTreeMap::new();

    for item in activity {
        let Some(post_id) = item.post_id else {
            continue;
        };
        let entry = by_post.entry(post_id).or_insert_with(|| Conversation {
            post_id,
            post: None,
            comments: Vec::new(),
        });

        match item.kind.as_str() {
            "post" => entry.post = Some(item.clone()),
            "comment" => entry.comments.push(item.clone()),
            _ => {}
        }
    }

    let mut conversations: Vec<_> = by_post.into_values().collect();
    // newest conversation first, by post creation (or first comment) time
    conversations.sort_by_key(|c| {
        std::cmp::Reverse(
            c.post
                .as_ref()
                .map(|p| p.created_at)
                .or_else(|| c.comments.first().map(|c| c.created_at)),
        )
    });
    conversations
}

/// Forum activity grouped into conversations
pub async fn forum_conversations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Conversation>>, (StatusCode, Json<ErrorResponse>)> {
    let feed = state.db.forum_feed(200).await.map_err(internal_error)?;
    Ok(Json(group_conversations(&feed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(id: i64, kind: &str, post_id: i64, secs: i64) -> ForumActivity {
        ForumActivity {
            id,
            kind: kind.to_string(),
            post_id: Some(post_id),
            comment_id: if kind == "comment" { Some(id) } else { None },
            content: format!("{kind} {id}"),
            created_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_groups_comments_under_posts() {
        let activity = vec![
            item(1, "post", 100, 0),
            item(2, "comment", 100, 10),
            item(3, "comment", 100, 20),
            item(4, "post", 200, 30),
        ];

        let conversations = group_conversations(&activity);
        assert_eq!(conversations.len(), 2);
        // newest post first
        assert_eq!(conversations[0].post_id, 200);
        assert_eq!(conversations[1].post_id, 100);
        assert_eq!(conversations[1].comments.len(), 2);
    }

    #[test]
    fn test_orphan_comment_keeps_post_id() {
        let conversations = group_conversations(&[item(9, "comment", 300, 0)]);
        assert_eq!(conversations.len(), 1);
        assert!(conversations[0].post.is_none());
        assert_eq!(conversations[0].comments.len(), 1);
    }
}
