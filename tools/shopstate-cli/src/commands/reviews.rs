//! Review commands.

use anyhow::{bail, Result};
use shopstate_core::reviews::{NewReview, MAX_RATING, MIN_RATING};
use shopstate_core::ProductId;

use super::{ReviewsArgs, ReviewsCommand};
use crate::context::Context;
use crate::output::stars;

/// Run the reviews command.
pub async fn run(args: ReviewsArgs, ctx: &Context) -> Result<()> {
    let mut store = ctx.open_store()?;

    match args.command {
        ReviewsCommand::List { product } => {
            let product = product.map(ProductId::new);
            let reviews: Vec<_> = store
                .reviews
                .reviews()
                .iter()
                .filter(|r| product.as_ref().map_or(true, |p| &r.product_id == p))
                .collect();

            if ctx.output.is_json() {
                ctx.output.json(&reviews);
                return Ok(());
            }
            ctx.output.header("My reviews");
            if reviews.is_empty() {
                ctx.output.info("No reviews yet");
            }
            for review in reviews {
                ctx.output.info(&format!(
                    "{}  {}  {}",
                    stars(review.rating),
                    review.product_name,
                    review.date
                ));
                if !review.comment.is_empty() {
                    ctx.output.kv("comment", &review.comment);
                }
            }
            Ok(())
        }
        ReviewsCommand::Add {
            product,
            name,
            rating,
            comment,
            image,
        } => {
            if !(MIN_RATING..=MAX_RATING).contains(&rating) {
                bail!("Rating must be between {} and {}", MIN_RATING, MAX_RATING);
            }
            let product_id = ProductId::new(product);
            if store.reviews.has_reviewed(&product_id) {
                ctx.output
                    .warn(&format!("You have already reviewed {}", product_id));
            }

            let id = store.reviews.add(
                NewReview::new(product_id, name, rating)
                    .with_comment(comment)
                    .with_image(image),
            );
            ctx.output.success(&format!("Saved review {}", id));
            Ok(())
        }
    }
}
