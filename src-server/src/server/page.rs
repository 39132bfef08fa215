//! Rendering of the prediction page.

const TEMPLATE: &str = include_str!("../../templates/car_price.html");

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// The form with `car_names` as options, plus the price when one was predicted.
pub fn render_page(car_names: &[String], prediction: Option<f64>) -> String {
    let options = car_names
        .iter()
        .map(|name| {
            let name = escape_html(name);
            format!("        <option value=\"{name}\">{name}</option>")
        })
        .collect::<Vec<_>>()
        .join("\n");
    let result = prediction
        .map(|price| format!("  <p class=\"result\">Predicted price: {price:.2}</p>"))
        .unwrap_or_default();

    TEMPLATE
        .replace("{{car_options}}", &options)
        .replace("{{prediction}}", &result)
}
