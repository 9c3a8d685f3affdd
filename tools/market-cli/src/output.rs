//! Output formatting for the CLI.

use console::style;
use market_cart::LineItem;

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("ℹ").blue(), msg);
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    /// Print a debug message (only in verbose mode).
    pub fn debug(&self, msg: &str) {
        if !self.verbose || self.json {
            return;
        }
        eprintln!("{} {}", style("→").dim(), style(msg).dim());
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a table row.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let formatted: Vec<String> = cols
            .iter()
            .zip(widths.iter())
            .map(|(col, width)| format!("{:width$}", col, width = width))
            .collect();
        println!("  {}", formatted.join("  "));
    }

    /// Print the cart as a table with totals.
    pub fn cart(&self, items: &[LineItem]) {
        if self.json {
            self.json(&items);
            return;
        }
        if items.is_empty() {
            self.info("Cart is empty");
            return;
        }

        let widths = column_widths(items);
        self.table_row(&["ID", "TITLE", "PRICE", "QTY", "TOTAL"], &widths);
        for item in items {
            let price = format_price(item.price);
            let quantity = item.quantity.to_string();
            let total = format_price(item.total());
            self.table_row(
                &[
                    item.id.as_str(),
                    item.title.as_str(),
                    price.as_str(),
                    quantity.as_str(),
                    total.as_str(),
                ],
                &widths,
            );
        }

        let count: u64 = items.iter().map(|i| u64::from(i.quantity)).sum();
        let subtotal: f64 = items.iter().map(LineItem::total).sum();
        println!();
        self.kv("items", &count.to_string());
        self.kv("subtotal", &format_price(subtotal));
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Format a price with two decimals.
pub fn format_price(amount: f64) -> String {
    format!("{:.2}", amount)
}

fn column_widths(items: &[LineItem]) -> Vec<usize> {
    let mut widths = vec![2, 5, 5, 3, 5];
    for item in items {
        widths[0] = widths[0].max(item.id.as_str().chars().count());
        widths[1] = widths[1].max(item.title.chars().count());
        widths[2] = widths[2].max(format_price(item.price).len());
        widths[3] = widths[3].max(item.quantity.to_string().len());
        widths[4] = widths[4].max(format_price(item.total()).len());
    }
    widths
}
