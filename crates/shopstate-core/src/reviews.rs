//! Product reviews written by the shopper, newest first.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ProductId, ReviewId};
use crate::store::{self, Listeners, MemoryRepository, Repository, SubscriptionId};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub product_image: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    /// Calendar date, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
}

/// Review as submitted; the log assigns the id and date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewReview {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub product_image: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

impl NewReview {
    pub fn new(product_id: impl Into<ProductId>, product_name: impl Into<String>, rating: u8) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            product_image: String::new(),
            rating,
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.product_image = image.into();
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewState {
    pub reviews: Vec<Review>,
}

pub struct ReviewLog {
    state: ReviewState,
    repo: Box<dyn Repository<ReviewState>>,
    listeners: Listeners<ReviewState>,
}

impl ReviewLog {
    pub fn new(repo: Box<dyn Repository<ReviewState>>) -> Self {
        Self {
            state: ReviewState::default(),
            repo,
            listeners: Listeners::new(),
        }
    }

    pub fn load(repo: Box<dyn Repository<ReviewState>>) -> Self {
        let mut state = store::load_or_default(repo.as_ref(), "reviews").unwrap_or_default();
        for review in &mut state.reviews {
            review.rating = clamp_rating(review.rating);
        }
        Self {
            state,
            repo,
            listeners: Listeners::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryRepository::new()))
    }

    /// Record a review dated today (UTC).
    pub fn add(&mut self, review: NewReview) -> ReviewId {
        self.add_dated(review, Utc::now().date_naive())
    }

    /// Record a review with an explicit date.
    pub fn add_dated(&mut self, review: NewReview, date: NaiveDate) -> ReviewId {
        let id = ReviewId::generate();
        let rating = clamp_rating(review.rating);
        if rating != review.rating {
            tracing::debug!(given = review.rating, rating, "clamped review rating");
        }

        self.state.reviews.insert(
            0,
            Review {
                id: id.clone(),
                product_id: review.product_id,
                product_name: review.product_name,
                product_image: review.product_image,
                rating,
                comment: review.comment,
                date,
            },
        );
        tracing::debug!(review = %id, "review recorded");
        self.commit();
        id
    }

    pub fn has_reviewed(&self, product_id: &ProductId) -> bool {
        self.state.reviews.iter().any(|r| &r.product_id == product_id)
    }

    /// Reviews, newest first.
    pub fn reviews(&self) -> &[Review] {
        &self.state.reviews
    }

    pub fn len(&self) -> usize {
        self.state.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.reviews.is_empty()
    }

    pub fn snapshot(&self) -> &ReviewState {
        &self.state
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&ReviewState) + Send + 'static,
    ) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn commit(&mut self) {
        store::save_best_effort(self.repo.as_ref(), &self.state, "reviews");
        self.listeners.notify(&self.state);
    }
}

impl std::fmt::Debug for ReviewLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewLog")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn clamp_rating(rating: u8) -> u8 {
    rating.clamp(MIN_RATING, MAX_RATING)
}
