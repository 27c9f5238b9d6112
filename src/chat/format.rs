use crate::models::courier::GeoPoint;
use crate::models::order::{Order, PaymentMethod};

pub fn maps_link(point: &GeoPoint) -> String {
    format!("https://maps.google.com/?q={},{}", point.lat, point.lng)
}

fn payment_summary(order: &Order) -> String {
    if order.payments.is_empty() {
        return format!("{}", order.total_amount);
    }

    let parts: Vec<String> = order
        .payments
        .iter()
        .map(|p| {
            let method = match p.method {
                PaymentMethod::Cash => "cash",
                PaymentMethod::Card => "card",
                PaymentMethod::Online => "online",
            };
            match p.cash_tendered {
                Some(tendered) => format!("{} {} (from {})", p.amount, method, tendered),
                None => format!("{} {}", p.amount, method),
            }
        })
        .collect();

    parts.join(", ")
}

fn order_summary(order: &Order) -> String {
    let mut lines = vec![
        format!("Order {}", order.id),
        format!("Payment: {}", payment_summary(order)),
        maps_link(&order.dropoff),
    ];
    if let Some(km) = order.distance_km {
        lines.push(format!("Distance: {km:.1} km"));
    }
    if let Some(min) = order.duration_min {
        lines.push(format!("ETA: {min} min"));
    }
    lines.join("\n")
}

/// Offer shown to each candidate while the order is searching.
pub fn offer_text(order: &Order) -> String {
    format!("New delivery\n{}", order_summary(order))
}

/// Broadcast shown in the branch dispatch channel.
pub fn branch_text(order: &Order) -> String {
    format!("Looking for a courier\n{}", order_summary(order))
}

pub fn branch_assigned_text(order: &Order, courier_name: &str) -> String {
    format!("Courier {courier_name} took order {}", order.id)
}

/// Private message for the courier who holds the order.
pub fn assigned_text(order: &Order) -> String {
    format!("You have the order\n{}", order_summary(order))
}

pub fn en_route_text(order: &Order) -> String {
    format!("On the way\n{}", order_summary(order))
}
