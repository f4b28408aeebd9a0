//! Output formatting for comparison reports (table, JSON, markdown, CSV).

use crate::compare::ComparisonReport;
use crate::config::OutputFormat;
use crate::marketplaces::Offer;

/// Formats reports for terminal output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a full report.
    pub fn format_report(&self, report: &ComparisonReport) -> String {
        match self.format {
            OutputFormat::Json => self.json_report(report),
            OutputFormat::Table => self.table_report(report),
            OutputFormat::Markdown => self.markdown_report(report),
            OutputFormat::Csv => self.csv_offers(&report.offers),
        }
    }

    // JSON formatting

    fn json_report(&self, report: &ComparisonReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    // Table formatting

    fn table_report(&self, report: &ComparisonReport) -> String {
        let country_width = 7;
        let market_width = 18;
        let price_width = 16;
        let usd_width = 10;
        let title_width = 45;

        let mut lines = Vec::new();

        lines.push(format!("Query: {}  ({})", report.query, report.ts));
        lines.push(String::new());

        if report.offers.is_empty() {
            lines.push("No offers found.".to_string());
        } else {
            lines.push(format!(
                "{:<country_width$}  {:<market_width$}  {:<price_width$}  {:<usd_width$}  {}",
                "Country", "Marketplace", "Price", "USD", "Title"
            ));
            lines.push(format!(
                "{:-<country_width$}  {:-<market_width$}  {:-<price_width$}  {:-<usd_width$}  {:-<title_width$}",
                "", "", "", "", ""
            ));

            for offer in &report.offers {
                lines.push(format!(
                    "{:<country_width$}  {:<market_width$}  {:>price_width$}  {:>usd_width$}  {}",
                    offer.country,
                    truncate(&offer.marketplace, market_width),
                    native_price(offer),
                    usd_price(offer.price_usd),
                    truncate(&offer.title, title_width)
                ));
            }
        }

        lines.push(String::new());
        lines.push("Best by country:".to_string());
        for (country, best) in &report.summary.best_by_country {
            match best {
                Some(best) => lines.push(format!(
                    "  {}  {} USD  {}  {}",
                    country,
                    usd_price(Some(best.price_usd)),
                    best.marketplace,
                    best.url
                )),
                None => lines.push(format!("  {}  no convertible offers", country)),
            }
        }

        lines.push(String::new());
        lines.push(format!("Total: {} offers", report.offers.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_report(&self, report: &ComparisonReport) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## {}", report.query));
        lines.push(String::new());
        lines.push("| Country | Marketplace | Price | USD | Title |".to_string());
        lines.push("|---------|-------------|-------|-----|-------|".to_string());

        for offer in &report.offers {
            lines.push(format!(
                "| {} | {} | {} | {} | [{}]({}) |",
                offer.country,
                offer.marketplace,
                native_price(offer),
                usd_price(offer.price_usd),
                truncate(&offer.title, 40),
                offer.url
            ));
        }

        lines.push(String::new());
        lines.push("### Best by country".to_string());
        lines.push(String::new());
        for (country, best) in &report.summary.best_by_country {
            match best {
                Some(best) => lines.push(format!(
                    "- **{}:** {:.2} USD at {} ([{}]({}))",
                    country, best.price_usd, best.marketplace, best.title, best.url
                )),
                None => lines.push(format!("- **{}:** N/A", country)),
            }
        }

        lines.push(String::new());
        lines.push(format!("*{} offers found*", report.offers.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        "country,marketplace,title,seller,price,currency,price_usd,url".to_string()
    }

    fn csv_offers(&self, offers: &[Offer]) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        for offer in offers {
            lines.push(format!(
                "{},{},{},{},{},{},{},{}",
                offer.country,
                Self::csv_escape(&offer.marketplace),
                Self::csv_escape(&offer.title),
                Self::csv_escape(&offer.seller),
                offer.price.map(|p| p.to_string()).unwrap_or_default(),
                offer.currency,
                offer.price_usd.map(|p| p.to_string()).unwrap_or_default(),
                offer.url
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

fn native_price(offer: &Offer) -> String {
    match offer.price {
        Some(p) => format!("{} {:.2}", offer.currency, p),
        None => "N/A".to_string(),
    }
}

fn usd_price(price: Option<f64>) -> String {
    price.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "N/A".to_string())
}

/// Shortens on character boundaries; titles are frequently non-ASCII.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
