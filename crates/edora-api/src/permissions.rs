//! Ownership and role predicates. Admins may act on anything; everyone else
//! only on what they own. Moderation endpoints also admit moderators.

use edora_db::models::{ChannelRow, CommentRow, PostRow};
use edora_types::models::Role;

use crate::error::ApiError;
use crate::middleware::CurrentUser;

fn is_admin_or_owner(user: &CurrentUser, owner_id: i64) -> bool {
    user.role == Role::Admin || user.id == owner_id
}

pub fn is_moderator(user: &CurrentUser) -> bool {
    matches!(user.role, Role::Moderator | Role::Admin)
}

pub fn can_edit_channel(user: &CurrentUser, channel: &ChannelRow) -> bool {
    is_admin_or_owner(user, channel.owner_id)
}

pub fn can_delete_channel(user: &CurrentUser, channel: &ChannelRow) -> bool {
    is_admin_or_owner(user, channel.owner_id)
}

pub fn can_edit_post(user: &CurrentUser, post: &PostRow) -> bool {
    is_admin_or_owner(user, post.author_id)
}

pub fn can_delete_post(user: &CurrentUser, post: &PostRow) -> bool {
    is_admin_or_owner(user, post.author_id)
}

pub fn can_edit_comment(user: &CurrentUser, comment: &CommentRow) -> bool {
    is_admin_or_owner(user, comment.author_id)
}

pub fn can_delete_comment(user: &CurrentUser, comment: &CommentRow) -> bool {
    is_admin_or_owner(user, comment.author_id)
}

/// Flagged posts are visible to their author and to moderators only.
pub fn can_view_post(user: &CurrentUser, post: &PostRow) -> bool {
    !post.is_flagged || post.author_id == user.id || is_moderator(user)
}

pub fn require_channel_edit_permission(user: &CurrentUser, channel: &ChannelRow) -> Result<(), ApiError> {
    if !can_edit_channel(user, channel) {
        return Err(ApiError::Forbidden("You don't have permission to edit this channel"));
    }
    Ok(())
}

pub fn require_channel_delete_permission(user: &CurrentUser, channel: &ChannelRow) -> Result<(), ApiError> {
    if !can_delete_channel(user, channel) {
        return Err(ApiError::Forbidden("You don't have permission to delete this channel"));
    }
    Ok(())
}

pub fn require_post_edit_permission(user: &CurrentUser, post: &PostRow) -> Result<(), ApiError> {
    if !can_edit_post(user, post) {
        return Err(ApiError::Forbidden("You don't have permission to edit this post"));
    }
    Ok(())
}

pub fn require_post_delete_permission(user: &CurrentUser, post: &PostRow) -> Result<(), ApiError> {
    if !can_delete_post(user, post) {
        return Err(ApiError::Forbidden("You don't have permission to delete this post"));
    }
    Ok(())
}

pub fn require_comment_edit_permission(user: &CurrentUser, comment: &CommentRow) -> Result<(), ApiError> {
    if !can_edit_comment(user, comment) {
        return Err(ApiError::Forbidden("You can only edit your own comments"));
    }
    Ok(())
}

pub fn require_comment_delete_permission(user: &CurrentUser, comment: &CommentRow) -> Result<(), ApiError> {
    if !can_delete_comment(user, comment) {
        return Err(ApiError::Forbidden("You can only delete your own comments"));
    }
    Ok(())
}

pub fn require_moderator(user: &CurrentUser) -> Result<(), ApiError> {
    if !is_moderator(user) {
        return Err(ApiError::Forbidden("Not enough permissions"));
    }
    Ok(())
}

pub fn require_admin(user: &CurrentUser) -> Result<(), ApiError> {
    if user.role != Role::Admin {
        return Err(ApiError::Forbidden("Admin only"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, role: Role) -> CurrentUser {
        CurrentUser {
            id,
            email: format!("u{id}@example.com"),
            username: None,
            role,
            points: 0,
        }
    }

    fn post(author_id: i64, is_flagged: bool) -> PostRow {
        PostRow {
            id: 1,
            title: "t".into(),
            content: "c".into(),
            channel_id: 1,
            author_id,
            is_flagged,
            flag_reason: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn channel(owner_id: i64) -> ChannelRow {
        ChannelRow {
            id: 1,
            name: "c".into(),
            bio: None,
            logo_filename: None,
            owner_id,
            member_count: 1,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn owner_or_admin_may_edit() {
        let owner = user(1, Role::User);
        let stranger = user(2, Role::User);
        let moderator = user(3, Role::Moderator);
        let admin = user(4, Role::Admin);

        assert!(can_edit_post(&owner, &post(1, false)));
        assert!(!can_edit_post(&stranger, &post(1, false)));
        assert!(!can_delete_post(&moderator, &post(1, false)));
        assert!(can_delete_post(&admin, &post(1, false)));

        assert!(can_edit_channel(&owner, &channel(1)));
        assert!(require_channel_delete_permission(&stranger, &channel(1)).is_err());
        assert!(require_channel_delete_permission(&admin, &channel(1)).is_ok());
    }

    #[test]
    fn moderation_roles() {
        assert!(require_moderator(&user(1, Role::User)).is_err());
        assert!(require_moderator(&user(1, Role::Moderator)).is_ok());
        assert!(require_moderator(&user(1, Role::Admin)).is_ok());
        assert!(require_admin(&user(1, Role::Moderator)).is_err());
    }

    #[test]
    fn flagged_visibility() {
        let flagged = post(1, true);
        assert!(can_view_post(&user(1, Role::User), &flagged));
        assert!(!can_view_post(&user(2, Role::User), &flagged));
        assert!(can_view_post(&user(2, Role::Moderator), &flagged));
        assert!(can_view_post(&user(2, Role::User), &post(1, false)));
    }
}
