//! Cart commands.

use anyhow::{bail, Result};
use dialoguer::Confirm;
use shopstate_core::cart::{Attributes, Cart, LineUpdate, NewLine};
use shopstate_core::LineId;

use super::{parse_price, CartArgs, CartCommand};
use crate::context::Context;
use crate::output::{selection_mark, truncate};

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let mut store = ctx.open_store()?;
    let cart = &mut store.cart;
    let currency = cart.currency();

    match args.command {
        CartCommand::List => list_cart(cart, ctx),
        CartCommand::Add {
            product,
            name,
            price,
            original_price,
            attributes,
            quantity,
            brand,
        } => {
            let mut line = NewLine::new(product, name, parse_price(&price, currency)?)
                .with_attributes(attributes.into_iter().collect())
                .with_quantity(quantity);
            if let Some(original) = original_price {
                line = line.with_original_price(parse_price(&original, currency)?);
            }
            if let Some(brand) = brand {
                line = line.with_brand(brand);
            }

            let line_id = cart.add(line);
            let quantity = cart.line(&line_id).map(|l| l.quantity).unwrap_or_default();
            if ctx.output.is_json() {
                ctx.output.json(&cart.line(&line_id));
            } else {
                ctx.output
                    .success(&format!("{} now has quantity {}", line_id, quantity));
            }
            Ok(())
        }
        CartCommand::Remove { line } => {
            let line = LineId::new(line);
            report(ctx, cart.remove(&line), &line, "Removed")
        }
        CartCommand::Inc { line } => {
            let line = LineId::new(line);
            report(ctx, cart.increase(&line), &line, "Increased")
        }
        CartCommand::Dec { line } => {
            let line = LineId::new(line);
            let before = cart.line(&line).map(|l| l.quantity);
            let changed = cart.decrease(&line);
            if before == Some(1) {
                ctx.output.warn("Quantity is already 1; use `cart remove` to drop the line");
                return Ok(());
            }
            report(ctx, changed, &line, "Decreased")
        }
        CartCommand::Toggle { line } => {
            let line = LineId::new(line);
            let changed = cart.toggle_selected(&line);
            let state = match cart.line(&line) {
                Some(l) if l.selected => "Selected",
                _ => "Deselected",
            };
            report(ctx, changed, &line, state)
        }
        CartCommand::SelectAll { none } => {
            cart.select_all(!none);
            ctx.output.success(&format!(
                "{} of {} lines selected",
                cart.selected_count(),
                cart.len()
            ));
            Ok(())
        }
        CartCommand::RemoveSelected => {
            let removed = cart.remove_selected();
            if ctx.output.is_json() {
                ctx.output.json(&removed);
            } else {
                ctx.output
                    .success(&format!("Removed {} selected line(s)", removed.len()));
            }
            Ok(())
        }
        CartCommand::Variant {
            line,
            attributes,
            quantity,
        } => {
            let line = LineId::new(line);
            if attributes.is_empty() && quantity.is_none() {
                bail!("Nothing to change: pass --attr and/or --quantity");
            }
            let update = LineUpdate {
                attributes: (!attributes.is_empty())
                    .then(|| attributes.into_iter().collect::<Attributes>()),
                quantity,
            };
            let Some(product) = cart.line(&line).map(|l| l.product_id.clone()) else {
                bail!("No cart line with ID '{}'", line);
            };

            cart.update_line(&line, update);

            // The line may have been re-keyed or merged; show where it landed.
            let current: Vec<_> = cart
                .lines()
                .iter()
                .filter(|l| l.product_id == product)
                .map(|l| format!("{} x{}", l.line_id, l.quantity))
                .collect();
            ctx.output.success("Line updated");
            for entry in &current {
                ctx.output.list_item(entry);
            }
            Ok(())
        }
        CartCommand::Clear { yes } => {
            if cart.is_empty() {
                ctx.output.info("Cart is already empty");
                return Ok(());
            }
            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Remove all {} line(s) from the cart?", cart.len()))
                    .default(false)
                    .interact()?;

                if !confirmed {
                    ctx.output.warn("Cancelled");
                    return Ok(());
                }
            }
            cart.clear();
            ctx.output.success("Cart cleared");
            Ok(())
        }
    }
}

fn list_cart(cart: &Cart, ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(cart.snapshot());
        return Ok(());
    }

    ctx.output.header("Cart");
    if cart.is_empty() {
        ctx.output.info("Your cart is empty");
        return Ok(());
    }

    let widths = [3, 28, 24, 16, 4, 12];
    ctx.output
        .table_row(&["", "LINE", "PRODUCT", "VARIANT", "QTY", "TOTAL"], &widths);
    for line in cart.lines() {
        let total = line
            .line_total()
            .map(|m| m.display())
            .unwrap_or_else(|| "overflow".to_string());
        let cols = [
            selection_mark(line.selected),
            truncate(line.line_id.as_str(), 28),
            truncate(&line.name, 24),
            line.variant_label().unwrap_or_default(),
            line.quantity.to_string(),
            total,
        ];
        let cols: Vec<&str> = cols.iter().map(String::as_str).collect();
        ctx.output.table_row(&cols, &widths);
    }

    println!();
    ctx.output.kv(
        "Selected",
        &format!("{} of {} lines", cart.selected_count(), cart.len()),
    );
    ctx.output.kv("Items", &cart.item_count().to_string());
    ctx.output.kv("Subtotal", &cart.selected_subtotal()?.display());
    let savings = cart.selected_savings()?;
    if savings.is_positive() {
        ctx.output.kv("You save", &savings.display());
    }
    Ok(())
}

fn report(ctx: &Context, changed: bool, line: &LineId, verb: &str) -> Result<()> {
    if changed {
        ctx.output.success(&format!("{} {}", verb, line));
        Ok(())
    } else {
        bail!("No cart line with ID '{}'", line)
    }
}
