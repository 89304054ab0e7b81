//! Comparison set commands.

use anyhow::{bail, Result};
use shopstate_core::compare::{CompareEntry, CompareToggle};
use shopstate_core::ProductId;

use super::{parse_price, CompareArgs, CompareCommand};
use crate::context::Context;
use crate::output::{stars, truncate};

/// Run the compare command.
pub async fn run(args: CompareArgs, ctx: &Context) -> Result<()> {
    let mut store = ctx.open_store()?;
    let currency = store.config().currency;

    match args.command {
        CompareCommand::List => {
            let compare = &store.compare;
            if ctx.output.is_json() {
                ctx.output.json(compare.snapshot());
                return Ok(());
            }
            ctx.output.header(&format!(
                "Comparing {} of {} products",
                compare.len(),
                compare.capacity()
            ));
            if compare.is_empty() {
                ctx.output.info("No products to compare");
                return Ok(());
            }
            let widths = [16, 28, 12, 8];
            ctx.output
                .table_row(&["PRODUCT", "NAME", "PRICE", "RATING"], &widths);
            for entry in compare.entries() {
                let cols = [
                    entry.id.to_string(),
                    truncate(&entry.name, 28),
                    entry.price.display(),
                    entry
                        .rating
                        .map(|r| stars(r.round().clamp(0.0, 5.0) as u8))
                        .unwrap_or_default(),
                ];
                let cols: Vec<&str> = cols.iter().map(String::as_str).collect();
                ctx.output.table_row(&cols, &widths);
            }
            Ok(())
        }
        CompareCommand::Toggle {
            product,
            name,
            price,
            image,
            original_price,
            rating,
            brand,
        } => {
            let mut entry = CompareEntry::new(product, name, parse_price(&price, currency)?, image);
            if let Some(original) = original_price {
                entry.original_price = Some(parse_price(&original, currency)?);
            }
            entry.rating = rating;
            entry.brand = brand;
            let id = entry.id.clone();

            match store.compare.toggle(entry) {
                CompareToggle::Added => ctx.output.success(&format!("Comparing {}", id)),
                CompareToggle::AddedWithEviction(evicted) => {
                    ctx.output.success(&format!("Comparing {}", id));
                    ctx.output.warn(&format!(
                        "Comparison is limited to {} products; dropped {}",
                        store.compare.capacity(),
                        evicted.id
                    ));
                }
                CompareToggle::Removed => {
                    ctx.output.success(&format!("Stopped comparing {}", id))
                }
            }
            Ok(())
        }
        CompareCommand::Remove { product } => {
            let id = ProductId::new(product);
            if !store.compare.remove(&id) {
                bail!("{} is not being compared", id);
            }
            ctx.output.success(&format!("Stopped comparing {}", id));
            Ok(())
        }
        CompareCommand::ToCart { product } => {
            let id = ProductId::new(product);
            let Some(line) = store.add_compare_to_cart(&id) else {
                bail!("{} is not being compared", id);
            };
            ctx.output.success(&format!("Added {} to the cart as {}", id, line));
            Ok(())
        }
        CompareCommand::Clear => {
            store.compare.clear();
            ctx.output.success("Comparison cleared");
            Ok(())
        }
    }
}
