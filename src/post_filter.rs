use chrono::{DateTime, Utc};

use crate::post::{Post, PostState};

/// Post states to keep. With every flag off nothing is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSelection {
    pub published: bool,
    pub private: bool,
    pub draft: bool,
    pub queued: bool,
}

impl StateSelection {
    pub fn all() -> StateSelection {
        StateSelection {
            published: true,
            private: true,
            draft: true,
            queued: true,
        }
    }

    pub fn contains(&self, state: PostState) -> bool {
        match state {
            PostState::Published => self.published,
            PostState::Private => self.private,
            PostState::Draft => self.draft,
            PostState::Queued => self.queued,
            PostState::Unknown => false,
        }
    }
}

/// The API does not filter its queries, so posts are read in full and selected here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub since: Option<DateTime<Utc>>,
    pub no_reblogs: bool,
    pub states: StateSelection,
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        if self.no_reblogs && (post.content.is_empty() || post.is_reblog()) {
            return false;
        }

        if let Some(since) = self.since {
            if post.date < since {
                return false;
            }
        }

        self.states.contains(post.state)
    }

    /// Keeps the matching posts, in their original order.
    pub fn apply(&self, posts: Vec<Post>) -> Vec<Post> {
        posts.into_iter()
            .filter(|post| self.matches(post))
            .collect()
    }
}

pub fn filter_posts(posts: Vec<Post>, since: Option<DateTime<Utc>>, no_reblogs: bool, states: StateSelection) -> Vec<Post> {
    let filter = PostFilter {
        since,
        no_reblogs,
        states,
    };
    filter.apply(posts)
}
