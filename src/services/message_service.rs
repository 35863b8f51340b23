use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::messages::{ContactRequest, MessageList, ReplyMessageRequest, UpdateMessageStatusRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Message,
    response::{ApiResponse, Meta},
    routes::params::MessageListQuery,
};

pub async fn submit_message(
    pool: &DbPool,
    payload: ContactRequest,
) -> AppResult<ApiResponse<Message>> {
    let ContactRequest {
        name,
        email,
        subject,
        message,
    } = payload;

    if name.trim().is_empty()
        || email.trim().is_empty()
        || subject.trim().is_empty()
        || message.trim().is_empty()
    {
        return Err(AppError::BadRequest("All fields are required".into()));
    }

    let id = Uuid::new_v4();
    let created: Message = sqlx::query_as(
        r#"
        INSERT INTO messages (id, name, email, subject, message)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name.trim())
    .bind(email.trim())
    .bind(subject.trim())
    .bind(message.trim())
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        None,
        "message_submit",
        Some("messages"),
        Some(serde_json::json!({ "message_id": created.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Message sent",
        created,
        Some(Meta::empty()),
    ))
}

pub async fn list_messages(
    pool: &DbPool,
    user: &AuthUser,
    query: MessageListQuery,
) -> AppResult<ApiResponse<MessageList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let status = query.status.as_ref().filter(|s| !s.is_empty());

    let (items, total): (Vec<Message>, (i64,)) = match status {
        Some(status) => {
            let items = sqlx::query_as::<_, Message>(
                r#"
                SELECT * FROM messages
                WHERE status = $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
            let total = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE status = $1")
                .bind(status)
                .fetch_one(pool)
                .await?;
            (items, total)
        }
        None => {
            let items = sqlx::query_as::<_, Message>(
                "SELECT * FROM messages ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
            let total = sqlx::query_as("SELECT COUNT(*) FROM messages")
                .fetch_one(pool)
                .await?;
            (items, total)
        }
    };

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Messages",
        MessageList { items },
        Some(meta),
    ))
}

pub async fn update_message_status(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateMessageStatusRequest,
) -> AppResult<ApiResponse<Message>> {
    ensure_admin(user)?;
    validate_message_status(&payload.status)?;

    let updated: Option<Message> = sqlx::query_as(
        r#"
        UPDATE messages
        SET status = $2, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&payload.status)
    .fetch_optional(pool)
    .await?;

    let message = match updated {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "message_status_update",
        Some("messages"),
        Some(serde_json::json!({ "message_id": message.id, "status": message.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Message updated",
        message,
        Some(Meta::empty()),
    ))
}

pub async fn reply_message(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: ReplyMessageRequest,
) -> AppResult<ApiResponse<Message>> {
    ensure_admin(user)?;
    if payload.reply.trim().is_empty() {
        return Err(AppError::BadRequest("reply must not be empty".into()));
    }

    let updated: Option<Message> = sqlx::query_as(
        r#"
        UPDATE messages
        SET admin_reply = $2,
            replied_by = $3,
            replied_at = now(),
            status = 'replied',
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.reply.trim())
    .bind(user.user_id)
    .fetch_optional(pool)
    .await?;

    let message = match updated {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "message_reply",
        Some("messages"),
        Some(serde_json::json!({ "message_id": message.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Reply saved",
        message,
        Some(Meta::empty()),
    ))
}

fn validate_message_status(status: &str) -> Result<(), AppError> {
    const VALID: [&str; 3] = ["unread", "read", "replied"];
    if VALID.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid message status".into()))
    }
}
