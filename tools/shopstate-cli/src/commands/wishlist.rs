//! Wishlist commands.

use anyhow::{bail, Result};
use shopstate_core::wishlist::WishlistEntry;
use shopstate_core::{LineId, ProductId};

use super::{parse_price, WishlistArgs, WishlistCommand};
use crate::context::Context;

/// Run the wishlist command.
pub async fn run(args: WishlistArgs, ctx: &Context) -> Result<()> {
    let mut store = ctx.open_store()?;
    let currency = store.config().currency;

    match args.command {
        WishlistCommand::List => {
            if ctx.output.is_json() {
                ctx.output.json(store.wishlist.snapshot());
                return Ok(());
            }
            ctx.output.header("Wishlist");
            if store.wishlist.is_empty() {
                ctx.output.info("Your wishlist is empty");
            }
            for entry in store.wishlist.entries() {
                let brand = entry
                    .brand
                    .as_deref()
                    .map(|b| format!(" by {}", b))
                    .unwrap_or_default();
                ctx.output.list_item(&format!(
                    "{}  {}{}  {}",
                    entry.id,
                    entry.name,
                    brand,
                    entry.price.display()
                ));
            }
            Ok(())
        }
        WishlistCommand::Add {
            product,
            name,
            price,
            brand,
            image,
        } => {
            let mut entry = WishlistEntry::new(product, name, parse_price(&price, currency)?);
            entry.brand = brand;
            entry.image = image;
            let id = entry.id.clone();
            if store.wishlist.add(entry) {
                ctx.output.success(&format!("Saved {}", id));
            } else {
                ctx.output.info(&format!("{} is already on your wishlist", id));
            }
            Ok(())
        }
        WishlistCommand::Remove { product } => {
            let id = ProductId::new(product);
            if !store.wishlist.remove(&id) {
                bail!("{} is not on your wishlist", id);
            }
            ctx.output.success(&format!("Removed {}", id));
            Ok(())
        }
        WishlistCommand::Clear => {
            store.wishlist.clear();
            ctx.output.success("Wishlist cleared");
            Ok(())
        }
        WishlistCommand::MoveSelected => {
            let moved = store.move_selected_to_wishlist();
            if ctx.output.is_json() {
                ctx.output.json(&moved);
                return Ok(());
            }
            if moved.is_empty() {
                ctx.output.info("No selected cart lines to move");
            } else {
                ctx.output.success(&format!(
                    "Moved {} line(s) to your wishlist",
                    moved.len()
                ));
            }
            Ok(())
        }
        WishlistCommand::MoveLine { line } => {
            let line = LineId::new(line);
            if !store.move_line_to_wishlist(&line) {
                bail!("No cart line with ID '{}'", line);
            }
            ctx.output.success(&format!("Moved {} to your wishlist", line));
            Ok(())
        }
    }
}
