//! Snapshot label -> valor y resumen HTML del ticket.
use indexmap::IndexMap;
use ticket_domain::{Entry, Form, Snapshot};

/// Snapshot con una fila por cada campo del formulario, en orden de
/// declaración. Filas ausentes se muestran como `""`.
pub fn build_snapshot(form: &Form, entry: &Entry) -> Snapshot {
    let rows: IndexMap<String, String> =
        form.fields_in_order()
            .into_iter()
            .map(|f| (f.label.clone(), entry.display_value(f.id).unwrap_or_default().to_string()))
            .collect();
    Snapshot(rows)
}

/// Escapa texto para insertarlo en HTML.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

/// Tabla de dos columnas label/valor con todos los campos del formulario.
pub fn summary_html(form: &Form, entry: Option<&Entry>) -> String {
    let Some(entry) = entry else {
        return "<p><em>No data yet</em></p>".to_string();
    };
    let rows: String = form.fields_in_order()
                           .into_iter()
                           .map(|f| {
                               format!("<tr><th style='text-align:left;padding:4px 8px'>{}</th><td style='padding:4px 8px'>{}</td></tr>",
                                       escape_html(&f.label),
                                       escape_html(entry.display_value(f.id).unwrap_or_default()))
                           })
                           .collect();
    format!("<table border='1' cellpadding='0' cellspacing='0' style='border-collapse:collapse'>{rows}</table>")
}
