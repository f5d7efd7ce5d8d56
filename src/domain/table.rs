use scraper::{Html, Selector};

/// One data row of an embedded HTML table, keyed by lowercase header text in
/// column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow(Vec<(String, String)>);

impl TableRow {
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(h, c)| (h.as_str(), c.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableParse {
    Rows(Vec<TableRow>),
    Passthrough(String),
}

/// Turns a field holding `<table>` markup into rows keyed by the first row's
/// headers. Anything that isn't a table with at least one data row comes back
/// untouched.
pub fn parse_table(html: &str) -> TableParse {
    if !html.contains("</table>") {
        return TableParse::Passthrough(html.to_string());
    }

    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td, th").unwrap();

    let fragment = Html::parse_fragment(html);
    let rows: Vec<Vec<String>> = fragment
        .select(&row_selector)
        .map(|row| {
            row.select(&cell_selector)
                .map(|cell| clean_cell(&cell.text().collect::<String>()))
                .collect()
        })
        .collect();

    match rows.split_first() {
        Some((header, data)) if !data.is_empty() => {
            let header: Vec<String> = header.iter().map(|h| h.to_lowercase()).collect();

            TableParse::Rows(
                data.iter()
                    .map(|cells| {
                        TableRow(
                            header
                                .iter()
                                .enumerate()
                                .map(|(i, h)| {
                                    (h.clone(), cells.get(i).cloned().unwrap_or_default())
                                })
                                .collect(),
                        )
                    })
                    .collect(),
            )
        }
        _ => TableParse::Passthrough(html.to_string()),
    }
}

fn clean_cell(text: &str) -> String {
    // html5ever decodes &nbsp; to U+00A0
    text.replace('\u{a0}', " ")
        .replace("&nbsp;", " ")
        .trim()
        .to_string()
}
