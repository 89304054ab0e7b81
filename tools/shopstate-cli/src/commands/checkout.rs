//! Checkout commands.
//!
//! Wizard session fields are not persisted, so `place` walks every step in a
//! single process. Only the address book survives between invocations.

use anyhow::{anyhow, bail, Context as _, Result};
use dialoguer::Select;
use shopstate_core::checkout::{
    payment, AddressPatch, CheckoutStep, NewAddress, OrderSummary, ShippingMethod, Transition,
    PAYMENT_OPTIONS,
};
use shopstate_core::{AddressId, PaymentMethodId, Storefront};

use super::{AddressCommand, AddressFields, CheckoutArgs, CheckoutCommand};
use crate::context::Context;

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, ctx: &Context) -> Result<()> {
    let mut store = ctx.open_store()?;

    match args.command {
        CheckoutCommand::Preview { shipping } => preview(&mut store, shipping.as_deref(), ctx),
        CheckoutCommand::Place {
            address,
            shipping,
            payment,
            yes,
        } => place(
            &mut store,
            PlaceChoices {
                address,
                shipping,
                payment,
                interactive: !yes && ctx.output.is_interactive(),
            },
            ctx,
        ),
        CheckoutCommand::Address { command } => address(&mut store, command, ctx),
    }
}

fn parse_shipping(value: &str) -> Result<ShippingMethod> {
    ShippingMethod::parse(value)
        .ok_or_else(|| anyhow!("Unknown shipping method '{}': use regular or express", value))
}

fn preview(store: &mut Storefront, shipping: Option<&str>, ctx: &Context) -> Result<()> {
    store.checkout.enter();
    if let Some(shipping) = shipping {
        store.checkout.set_shipping_method(parse_shipping(shipping)?);
    }
    let summary = store.order_summary()?;

    // Walk as far as the durable state allows; payment is chosen at `place`.
    let blocked = loop {
        match store.advance_checkout() {
            Transition::Moved(CheckoutStep::Payment) => break None,
            Transition::Moved(_) => continue,
            Transition::Blocked(reason) => break Some(reason),
            Transition::Unchanged(_) => break None,
        }
    };
    store.checkout.enter();

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "summary": summary,
            "blocked": blocked.map(|r| r.to_string()),
        }));
        return Ok(());
    }

    ctx.output.header("Order summary");
    print_summary(&summary, store.checkout.shipping_method(), ctx);
    if let Some(address) = store.checkout.selected_address() {
        ctx.output.kv("Ship to", &format!("{} ({})", address.label, address.one_line()));
    }
    match blocked {
        Some(reason) => ctx.output.warn(&reason.to_string()),
        None => ctx.output.success("Ready for payment"),
    }
    Ok(())
}

struct PlaceChoices {
    address: Option<String>,
    shipping: Option<String>,
    payment: Option<String>,
    interactive: bool,
}

fn place(store: &mut Storefront, choices: PlaceChoices, ctx: &Context) -> Result<()> {
    store.checkout.enter();

    // Step 1: review
    ctx.output.step(CheckoutStep::Review, "Reviewing selected items");
    expect_moved(store.advance_checkout())?;

    // Step 2: address and shipping
    ctx.output.step(CheckoutStep::Shipping, "Choosing address and shipping");
    if let Some(id) = choices.address {
        store.checkout.select_address(&AddressId::new(id))?;
    } else if store.checkout.selected_address().is_none()
        && choices.interactive
        && !store.checkout.addresses().is_empty()
    {
        let items: Vec<String> = store
            .checkout
            .addresses()
            .iter()
            .map(|a| format!("{}: {}", a.label, a.one_line()))
            .collect();
        let selection = Select::new()
            .with_prompt("Ship to")
            .items(&items)
            .default(0)
            .interact()?;
        let id = store.checkout.addresses()[selection].id.clone();
        store.checkout.select_address(&id)?;
    }

    let shipping = match choices.shipping {
        Some(value) => parse_shipping(&value)?,
        None if choices.interactive => {
            let methods = [ShippingMethod::Regular, ShippingMethod::Express];
            let items: Vec<String> = methods
                .iter()
                .map(|m| {
                    format!(
                        "{} ({})",
                        m.display_name(),
                        m.cost(&store.config().shipping, store.config().currency)
                    )
                })
                .collect();
            let selection = Select::new()
                .with_prompt("Shipping")
                .items(&items)
                .default(0)
                .interact()?;
            methods[selection]
        }
        None => ShippingMethod::default(),
    };
    store.checkout.set_shipping_method(shipping);
    expect_moved(store.advance_checkout())?;

    // Step 3: payment
    ctx.output.step(CheckoutStep::Payment, "Choosing payment method");
    let payment_id = match choices.payment {
        Some(value) => {
            let id = PaymentMethodId::new(value);
            if payment::payment_option(&id).is_none() {
                let known: Vec<&str> = PAYMENT_OPTIONS.iter().map(|o| o.id).collect();
                bail!("Unknown payment method '{}': use one of {}", id, known.join(", "));
            }
            Some(id)
        }
        None if choices.interactive => {
            let items: Vec<String> = PAYMENT_OPTIONS
                .iter()
                .map(|o| format!("{} - {}", o.name, o.description))
                .collect();
            let selection = Select::new()
                .with_prompt("Pay with")
                .items(&items)
                .default(0)
                .interact()?;
            Some(PaymentMethodId::new(PAYMENT_OPTIONS[selection].id))
        }
        None => None,
    };
    if let Some(id) = payment_id {
        store.checkout.set_payment_method(id);
    }

    let summary = store.order_summary()?;
    let address = store
        .checkout
        .selected_address()
        .cloned()
        .context("No address selected")?;
    let payment_method = store.checkout.payment_method().cloned();

    // Step 4: place
    expect_moved(store.finalize_checkout())?;
    ctx.output.step(CheckoutStep::Complete, "Order placed");

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "summary": summary,
            "address": address,
            "shipping": shipping,
            "payment": payment_method,
        }));
        return Ok(());
    }

    print_summary(&summary, shipping, ctx);
    ctx.output.kv("Ship to", &format!("{} ({})", address.label, address.one_line()));
    if let Some(option) = payment_method.as_ref().and_then(payment::payment_option) {
        ctx.output.kv("Payment", option.name);
    }
    ctx.output.success("Thank you for your order");
    Ok(())
}

/// Turn a refused transition into a command failure.
fn expect_moved(transition: Transition) -> Result<()> {
    match transition {
        Transition::Moved(_) => Ok(()),
        Transition::Blocked(reason) => bail!("{}", reason),
        Transition::Unchanged(step) => bail!("Checkout cannot continue from the {} step", step),
    }
}

fn print_summary(summary: &OrderSummary, shipping: ShippingMethod, ctx: &Context) {
    ctx.output.kv(
        "Items",
        &format!("{} ({} lines)", summary.item_count, summary.selected_lines),
    );
    ctx.output.kv("Subtotal", &summary.subtotal.display());
    if summary.savings.is_positive() {
        ctx.output.kv("You save", &summary.savings.display());
    }
    ctx.output.kv(
        "Shipping",
        &format!("{} ({})", summary.shipping.display(), shipping.display_name()),
    );
    ctx.output.kv("Total", &summary.total.display());
}

fn address(store: &mut Storefront, command: AddressCommand, ctx: &Context) -> Result<()> {
    let book = &mut store.checkout;
    match command {
        AddressCommand::List => {
            if ctx.output.is_json() {
                ctx.output.json(&serde_json::json!({
                    "addresses": book.addresses(),
                    "selected": book.selected_address_id(),
                }));
                return Ok(());
            }
            ctx.output.header("Saved addresses");
            if book.addresses().is_empty() {
                ctx.output.info("No saved addresses");
            }
            let selected = book.selected_address_id();
            for a in book.addresses() {
                let marker = if Some(&a.id) == selected { "*" } else { " " };
                ctx.output.list_item(&format!(
                    "{} {}  {}  {}  {}",
                    marker,
                    a.id,
                    a.label,
                    a.phone,
                    a.one_line()
                ));
            }
            Ok(())
        }
        AddressCommand::Add { fields } => {
            let address = new_address(fields)?;
            let id = book.add_address(address);
            if ctx.output.is_json() {
                ctx.output.json(&book.address(&id));
            } else {
                ctx.output.success(&format!("Added and selected address {}", id));
            }
            Ok(())
        }
        AddressCommand::Edit { id, fields } => {
            let id = AddressId::new(id);
            let patch = address_patch(fields);
            if patch.is_empty() {
                bail!("Nothing to change: pass at least one address field");
            }
            if !book.edit_address(&id, patch) {
                bail!("No saved address with ID '{}'", id);
            }
            ctx.output.success(&format!("Updated address {}", id));
            Ok(())
        }
        AddressCommand::Delete { id } => {
            let id = AddressId::new(id);
            if !book.delete_address(&id) {
                bail!("No saved address with ID '{}'", id);
            }
            ctx.output.success(&format!("Deleted address {}", id));
            Ok(())
        }
        AddressCommand::Select { id } => {
            let id = AddressId::new(id);
            book.select_address(&id)?;
            ctx.output.success(&format!("Shipping to address {}", id));
            Ok(())
        }
    }
}

fn new_address(fields: AddressFields) -> Result<NewAddress> {
    let required = |value: Option<String>, flag: &str| {
        value
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("--{} is required", flag))
    };
    let location = location(fields.lat, fields.lng);
    Ok(NewAddress {
        label: required(fields.label, "label")?,
        phone: required(fields.phone, "phone")?,
        full_address: required(fields.full_address, "full-address")?,
        region: fields.region.unwrap_or_default(),
        district: fields.district.unwrap_or_default(),
        area: fields.area.unwrap_or_default(),
        location,
    })
}

fn address_patch(fields: AddressFields) -> AddressPatch {
    let location = location(fields.lat, fields.lng).map(Some);
    AddressPatch {
        label: fields.label,
        phone: fields.phone,
        region: fields.region,
        district: fields.district,
        area: fields.area,
        full_address: fields.full_address,
        location,
    }
}

fn location(lat: Option<f64>, lng: Option<f64>) -> Option<shopstate_core::checkout::GeoPoint> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Some(shopstate_core::checkout::GeoPoint { lat, lng }),
        _ => None,
    }
}
