//! Order card model: what the presentation layer renders.

use serde::{Deserialize, Serialize};

use crate::config::LookupConfig;
use crate::identity::EmailAddress;
use crate::orders::{AggregatedResult, Order};

/// Card title shown above every lookup.
pub const CARD_TITLE: &str = "Order lookup";

/// Card header: title plus the customer the orders belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardHeader {
    pub title: String,
    pub subtitle: String,
}

/// One line of card body content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CardWidget {
    /// A paragraph of text.
    Text { text: String },
    /// A button opening `url` full-size.
    OpenLink { label: String, url: String },
}

/// A rendered lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCard {
    pub header: CardHeader,
    pub widgets: Vec<CardWidget>,
}

impl OrderCard {
    /// Build the card for `customer` from a lookup result.
    ///
    /// Body is one error line, one "no orders" line, or a text line and a
    /// link per order.
    pub fn build(customer: &EmailAddress, result: &AggregatedResult, config: &LookupConfig) -> Self {
        let header = CardHeader {
            title: CARD_TITLE.to_string(),
            subtitle: format!("Customer: {customer}"),
        };

        let widgets = match result {
            AggregatedResult::Error(msg) => vec![CardWidget::Text {
                text: format!("An error occurred: {msg}"),
            }],
            AggregatedResult::Orders(orders) if orders.is_empty() => vec![CardWidget::Text {
                text: format!("No orders for {customer}"),
            }],
            AggregatedResult::Orders(orders) => orders
                .iter()
                .flat_map(|order| order_widgets(order, config))
                .collect(),
        };

        Self { header, widgets }
    }

    /// Plain-text rendering, one widget per line.
    pub fn render_text(&self) -> String {
        let mut lines = vec![self.header.title.clone(), self.header.subtitle.clone(), String::new()];
        for widget in &self.widgets {
            match widget {
                CardWidget::Text { text } => lines.push(text.clone()),
                CardWidget::OpenLink { label, url } => lines.push(format!("  [{label}] {url}")),
            }
        }
        lines.join("\n")
    }
}

fn order_widgets(order: &Order, config: &LookupConfig) -> Vec<CardWidget> {
    let status = order.status_name().unwrap_or("no status");
    let date = order.date_text().unwrap_or_else(|| "no date".to_string());
    match order.id_text() {
        Some(id) => vec![
            CardWidget::Text {
                text: format!("Order #{id} ({status}), date: {date}"),
            },
            CardWidget::OpenLink {
                label: "View order".to_string(),
                url: config.order_admin_url(&id),
            },
        ],
        // Nothing to link to.
        None => vec![CardWidget::Text {
            text: format!("Order without id ({status}), date: {date}"),
        }],
    }
}
