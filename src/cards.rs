//! Result card rendering: price-comparison products and nearby stores
//! formatted as styled transcript lines.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::api::{Product, Store};

const SOURCE_COLOR: Color = Color::Rgb(101, 150, 243);
const TITLE_COLOR: Color = Color::Rgb(240, 240, 245);
const PRICE_COLOR: Color = Color::Rgb(131, 179, 102);
const BADGE_COLOR: Color = Color::Rgb(216, 180, 169);
const ESTIMATE_COLOR: Color = Color::Rgb(234, 208, 148);
const LINK_COLOR: Color = Color::Rgb(86, 182, 194);
const MUTED_COLOR: Color = Color::Rgb(105, 116, 133);
const WARN_COLOR: Color = Color::Rgb(204, 92, 68);
const OPEN_COLOR: Color = Color::Rgb(131, 179, 102);
const CLOSED_COLOR: Color = Color::Rgb(204, 92, 68);
const STOCK_OK_COLOR: Color = Color::Rgb(131, 179, 102);
const STOCK_LOW_COLOR: Color = Color::Rgb(164, 103, 38);
const CARD_BORDER: Color = Color::Rgb(45, 50, 60);

/// Stock badge classification, by substring match on the backend label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockClass {
    InStock,
    LowStock,
}

pub fn classify_stock(label: &str) -> StockClass {
    if label.to_lowercase().contains("in stock") {
        StockClass::InStock
    } else {
        StockClass::LowStock
    }
}

/// Call-to-action label: estimates point at a store search, direct listings
/// at the deal itself.
pub fn product_action_label(product: &Product) -> &'static str {
    if product.is_estimate { "Search Store" } else { "View Deal" }
}

fn card_rule(width: usize) -> Line<'static> {
    Line::from(Span::styled(
        "─".repeat(width.min(60)),
        Style::default().fg(CARD_BORDER),
    ))
}

pub fn render_products(products: &[Product], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for product in products {
        lines.push(card_rule(width));
        lines.push(Line::from(Span::styled(
            product.source.clone(),
            Style::default().fg(SOURCE_COLOR).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            product.title.clone(),
            Style::default().fg(TITLE_COLOR),
        )));

        let mut price_spans = vec![Span::styled(
            product.price.clone(),
            Style::default().fg(PRICE_COLOR).add_modifier(Modifier::BOLD),
        )];
        if product.is_estimate {
            price_spans.push(Span::styled(
                "  [Market Est.]",
                Style::default().fg(ESTIMATE_COLOR),
            ));
        }
        if let Some(approx) = &product.approx_price {
            price_spans.push(Span::styled(
                format!("  [Approx {}]", approx),
                Style::default().fg(BADGE_COLOR),
            ));
        }
        lines.push(Line::from(price_spans));

        if let Some(shipping) = &product.shipping {
            lines.push(Line::from(Span::styled(
                shipping.clone(),
                Style::default().fg(MUTED_COLOR),
            )));
        }

        lines.push(Line::from(vec![
            Span::styled(
                format!("↗ {}: ", product_action_label(product)),
                Style::default().fg(LINK_COLOR).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                product.link.clone(),
                Style::default().fg(LINK_COLOR).add_modifier(Modifier::UNDERLINED),
            ),
        ]));
    }

    if !products.is_empty() {
        lines.push(card_rule(width));
    }
    lines
}

fn demo_banner() -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            "⚠ Demo Mode: showing simulated stores.",
            Style::default().fg(WARN_COLOR).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Addresses are random. Configure Google Places API for real data.",
            Style::default().fg(WARN_COLOR),
        )),
    ]
}

pub fn render_stores(stores: &[Store], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    // One banner for the whole result set when the backend flags it as simulated
    let simulated = stores.first().is_some_and(|s| !s.is_real_data);
    if simulated {
        lines.extend(demo_banner());
    }

    for store in stores {
        lines.push(card_rule(width));
        lines.push(Line::from(vec![
            Span::styled(
                store.name.clone(),
                Style::default().fg(TITLE_COLOR).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  ⚲ {} km away", store.distance),
                Style::default().fg(BADGE_COLOR),
            ),
        ]));
        lines.push(Line::from(Span::styled(
            store.address.clone(),
            Style::default().fg(MUTED_COLOR),
        )));

        if store.rating > 0.0 {
            lines.push(Line::from(vec![
                Span::styled(format!("★ {}", store.rating), Style::default().fg(ESTIMATE_COLOR)),
                Span::styled(
                    format!(" ({} reviews)", store.total_ratings),
                    Style::default().fg(MUTED_COLOR),
                ),
            ]));
        }

        if let Some(price) = &store.price {
            lines.push(Line::from(Span::styled(
                format!("Price: {}", price),
                Style::default().fg(PRICE_COLOR),
            )));
        }

        let mut badges = Vec::new();
        if let Some(stock) = &store.stock_level {
            let color = match classify_stock(stock) {
                StockClass::InStock => STOCK_OK_COLOR,
                StockClass::LowStock => STOCK_LOW_COLOR,
            };
            badges.push(Span::styled(format!("[{}]", stock), Style::default().fg(color)));
        }
        if let Some(open) = store.open_now {
            if !badges.is_empty() {
                badges.push(Span::raw("  "));
            }
            badges.push(if open {
                Span::styled("[Open Now]", Style::default().fg(OPEN_COLOR))
            } else {
                Span::styled("[Closed]", Style::default().fg(CLOSED_COLOR))
            });
        }
        if !badges.is_empty() {
            lines.push(Line::from(badges));
        }

        lines.push(Line::from(vec![
            Span::styled("Map: ", Style::default().fg(LINK_COLOR).add_modifier(Modifier::BOLD)),
            Span::styled(
                store.map_url(),
                Style::default().fg(LINK_COLOR).add_modifier(Modifier::UNDERLINED),
            ),
        ]));
        if let Some(phone) = &store.phone {
            lines.push(Line::from(vec![
                Span::styled("Call: ", Style::default().fg(LINK_COLOR).add_modifier(Modifier::BOLD)),
                Span::styled(phone.clone(), Style::default().fg(LINK_COLOR)),
            ]));
        }
        if let Some(website) = &store.website {
            lines.push(Line::from(vec![
                Span::styled("Web: ", Style::default().fg(LINK_COLOR).add_modifier(Modifier::BOLD)),
                Span::styled(
                    website.clone(),
                    Style::default().fg(LINK_COLOR).add_modifier(Modifier::UNDERLINED),
                ),
            ]));
        }
    }

    if !stores.is_empty() {
        lines.push(card_rule(width));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.to_string()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn product(is_estimate: bool) -> Product {
        serde_json::from_str(&format!(
            r#"{{
                "source": "Amazon",
                "title": "Sony WH-1000XM5",
                "price": "$348.00",
                "link": "https://amazon.example/item",
                "is_estimate": {}
            }}"#,
            is_estimate
        ))
        .unwrap()
    }

    fn store(json: &str) -> Store {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_classify_stock() {
        assert_eq!(classify_stock("In Stock"), StockClass::InStock);
        assert_eq!(classify_stock("likely in stock"), StockClass::InStock);
        assert_eq!(classify_stock("Low Stock"), StockClass::LowStock);
        assert_eq!(classify_stock("Call to Verify"), StockClass::LowStock);
    }

    #[test]
    fn test_product_action_labels() {
        assert_eq!(product_action_label(&product(false)), "View Deal");
        assert_eq!(product_action_label(&product(true)), "Search Store");
    }

    #[test]
    fn test_product_card_shows_source_title_price() {
        let text = text_of(&render_products(&[product(false)], 80));

        assert!(text.contains("Amazon"));
        assert!(text.contains("Sony WH-1000XM5"));
        assert!(text.contains("$348.00"));
        assert!(text.contains("View Deal"));
        assert!(!text.contains("Market Est."));
    }

    #[test]
    fn test_estimate_card_shows_badge() {
        let text = text_of(&render_products(&[product(true)], 80));

        assert!(text.contains("Market Est."));
        assert!(text.contains("Search Store"));
    }

    #[test]
    fn test_one_card_per_product() {
        let lines = render_products(&[product(false), product(true), product(false)], 80);
        let text = text_of(&lines);

        assert_eq!(text.matches("Sony WH-1000XM5").count(), 3);
    }

    #[test]
    fn test_store_hides_missing_contacts() {
        let s = store(
            r#"{"name": "A", "address": "B", "distance": 1.0,
                "phone": "N/A", "website": "N/A", "latitude": 1.0, "longitude": 2.0}"#,
        );
        let text = text_of(&render_stores(&[s], 80));

        assert!(text.contains("Map: "));
        assert!(!text.contains("Call: "));
        assert!(!text.contains("Web: "));
    }

    #[test]
    fn test_store_shows_valid_contacts() {
        let s = store(
            r#"{"name": "A", "address": "B", "distance": 1.0,
                "phone": "+1 555 0100", "website": "https://a.example",
                "latitude": 1.0, "longitude": 2.0}"#,
        );
        let text = text_of(&render_stores(&[s], 80));

        assert!(text.contains("Call: +1 555 0100"));
        assert!(text.contains("Web: https://a.example"));
    }

    #[test]
    fn test_simulated_set_renders_one_banner() {
        let simulated = store(
            r#"{"name": "A", "address": "B", "distance": 1.0,
                "latitude": 1.0, "longitude": 2.0, "is_real_data": false}"#,
        );
        let text = text_of(&render_stores(&[simulated.clone(), simulated], 80));

        assert_eq!(text.matches("Demo Mode").count(), 1);
    }

    #[test]
    fn test_real_set_has_no_banner() {
        let real = store(
            r#"{"name": "A", "address": "B", "distance": 1.0,
                "latitude": 1.0, "longitude": 2.0}"#,
        );
        let text = text_of(&render_stores(&[real], 80));

        assert!(!text.contains("Demo Mode"));
    }

    #[test]
    fn test_open_badge_only_when_known() {
        let unknown = store(
            r#"{"name": "A", "address": "B", "distance": 1.0,
                "latitude": 1.0, "longitude": 2.0}"#,
        );
        let open = store(
            r#"{"name": "A", "address": "B", "distance": 1.0, "open_now": true,
                "latitude": 1.0, "longitude": 2.0}"#,
        );
        let closed = store(
            r#"{"name": "A", "address": "B", "distance": 1.0, "open_now": false,
                "latitude": 1.0, "longitude": 2.0}"#,
        );

        assert!(!text_of(&render_stores(&[unknown], 80)).contains("Open Now"));
        assert!(text_of(&render_stores(&[open], 80)).contains("[Open Now]"));
        assert!(text_of(&render_stores(&[closed], 80)).contains("[Closed]"));
    }
}
