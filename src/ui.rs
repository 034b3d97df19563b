use crate::calc::{preview, CalculationResult, PlatformFeePreview};
use crate::form::{FormField, GatheringForm};
use crate::format::{format_amount, format_number};
use crate::history::HistoryEntry;
use crate::session::{Notice, NoticeKind, Session};
use std::fmt::Write;

pub fn render_index(session: &Session, notice: Option<&Notice>) -> String {
    let form = &session.form;
    let preview = preview(form);
    let platform_hint = match preview.platform_fee {
        PlatformFeePreview::None => "Platform fee: 0".to_string(),
        PlatformFeePreview::NeedsInputs => {
            "Enter participants and fee per person first".to_string()
        }
        PlatformFeePreview::Amount(amount) => format!("Platform fee: {}", format_amount(amount)),
    };
    let platform_hint_class = match preview.platform_fee {
        PlatformFeePreview::NeedsInputs => "hint warn",
        _ => "hint",
    };

    INDEX_HTML
        .replace("{{NOTICE}}", &render_notice(notice))
        .replace("{{TITLE}}", &escape(&form.title))
        .replace("{{DATE}}", &escape(&form.date))
        .replace("{{LOCATION}}", &escape(&form.location))
        .replace("{{PARTICIPANTS}}", &numeric_value(form, FormField::ParticipantCount))
        .replace("{{FEE}}", &numeric_value(form, FormField::FeePerPerson))
        .replace("{{MATERIALS}}", &render_materials(form, &preview.line_totals))
        .replace("{{MATERIALS_TOTAL}}", &format_amount(preview.materials_total))
        .replace("{{VENUE_FEE}}", &numeric_value(form, FormField::VenueFee))
        .replace("{{PLATFORM_FEE}}", &numeric_value(form, FormField::PlatformFeePercent))
        .replace("{{PLATFORM_HINT_CLASS}}", platform_hint_class)
        .replace("{{PLATFORM_HINT}}", &platform_hint)
        .replace("{{TARGET}}", &numeric_value(form, FormField::TargetProfit))
        .replace("{{RESULT}}", &session.result().map(render_result).unwrap_or_default())
        .replace("{{HISTORY}}", &render_history(session))
}

fn numeric_value(form: &GatheringForm, field: FormField) -> String {
    escape(&format_number(form.field(field)))
}

fn render_notice(notice: Option<&Notice>) -> String {
    match notice {
        Some(notice) => {
            let kind = match notice.kind {
                NoticeKind::Success => "ok",
                NoticeKind::Error => "error",
            };
            format!(
                r#"<div class="status" data-type="{kind}" role="status">{}</div>"#,
                escape(&notice.message)
            )
        }
        None => String::new(),
    }
}

fn render_materials(form: &GatheringForm, line_totals: &[i64]) -> String {
    let mut html = String::new();
    for (idx, line) in form.materials.iter().enumerate() {
        let total = line_totals.get(idx).copied().unwrap_or_default();
        let _ = write!(
            html,
            r#"<div class="material-row">
          <input name="materials[{idx}].name" placeholder="Item" value="{name}" />
          <input name="materials[{idx}].unitPrice" inputmode="numeric" placeholder="Unit price" value="{price}" />
          <input name="materials[{idx}].quantity" inputmode="numeric" placeholder="Qty" value="{quantity}" />
          <span class="line-total">{total}</span>
          <button class="btn-ghost" type="submit" name="action" value="removeMaterial:{idx}" aria-label="Remove item">&times;</button>
        </div>
"#,
            name = escape(&line.name),
            price = escape(&format_number(&line.unit_price)),
            quantity = escape(&format_number(&line.quantity)),
            total = format_amount(total),
        );
    }
    html
}

fn render_result(result: &CalculationResult) -> String {
    let suggestion = result
        .suggested_fee_per_person
        .map(|fee| {
            format!(
                r#"<p class="suggestion">Fee per person needed for the target: <strong>{}</strong></p>"#,
                format_amount(fee)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<section class="result">
      <h2>Result</h2>
      <div class="panel">
        {revenue}
        {materials}
        {platform}
        {venue}
        {net}
      </div>
      {suggestion}
      <button class="btn-save" type="submit" name="action" value="save">Save result</button>
    </section>"#,
        revenue = stat("Total revenue", result.total_revenue, ""),
        materials = stat("Materials", result.materials_cost, ""),
        platform = stat("Platform fee", result.platform_fee_amount, ""),
        venue = stat("Venue fee", result.venue_fee, ""),
        net = stat("Net profit", result.net_profit, net_class(result.net_profit)),
    )
}

fn stat(label: &str, amount: i64, class: &str) -> String {
    format!(
        r#"<div class="stat"><span class="label">{label}</span><span class="value {class}">{}</span></div>"#,
        format_amount(amount)
    )
}

fn net_class(net_profit: i64) -> &'static str {
    if net_profit >= 0 { "net" } else { "loss" }
}

fn render_history(session: &Session) -> String {
    if session.history.is_empty() {
        return r#"<p class="hint">No saved calculations yet.</p>"#.to_string();
    }

    let mut html = String::new();
    for (idx, entry) in session.history.iter().enumerate() {
        let _ = write!(
            html,
            r#"<article class="entry">
        <header>
          <div>
            <h3>{title}</h3>
            <p class="subtitle">{date} &middot; saved {saved}{location}</p>
          </div>
          <form method="post" action="/history/{idx}/delete">
            <button class="btn-ghost" type="submit" aria-label="Delete entry">Delete</button>
          </form>
        </header>
        <div class="panel">
          {revenue}
          {net}
        </div>
        <p class="detail">{participants} participants &times; {fee}</p>
        <ul class="expenses">
          {materials}
          {venue}
          {platform}
        </ul>
      </article>
"#,
            title = escape(&entry.title),
            date = entry.date,
            saved = entry.timestamp.format("%Y-%m-%d %H:%M"),
            location = if entry.location.is_empty() {
                String::new()
            } else {
                format!(" &middot; {}", escape(&entry.location))
            },
            revenue = stat("Total revenue", entry.total_revenue, ""),
            net = stat("Net profit", entry.net_profit, net_class(entry.net_profit)),
            participants = format_amount(entry.participant_count),
            fee = format_amount(entry.fee_per_person),
            materials = render_entry_materials(idx, entry, session.is_expanded(idx)),
            venue = expense_line("Venue fee", entry.venue_fee),
            platform = expense_line("Platform fee", entry.platform_fee_amount),
        );
    }
    html
}

fn render_entry_materials(idx: usize, entry: &HistoryEntry, expanded: bool) -> String {
    if entry.materials.is_empty() {
        return String::new();
    }

    let mut html = format!(
        r#"<li>
            <form method="post" action="/history/{idx}/toggle">
              <button class="btn-link" type="submit" aria-expanded="{expanded}">{arrow} Materials</button>
            </form>
            <span>- {cost}</span>"#,
        arrow = if expanded { "&#9652;" } else { "&#9662;" },
        cost = format_amount(entry.materials_cost),
    );
    if expanded {
        html.push_str(r#"<ul class="material-detail">"#);
        for line in &entry.materials {
            let _ = write!(
                html,
                "<li><span>{} ({})</span><span>{}</span></li>",
                escape(&line.name),
                format_amount(line.quantity),
                format_amount(line.line_total()),
            );
        }
        html.push_str("</ul>");
    }
    html.push_str("</li>");
    html
}

fn expense_line(label: &str, amount: i64) -> String {
    if amount > 0 {
        format!("<li><span>{label}</span><span>- {}</span></li>", format_amount(amount))
    } else {
        String::new()
    }
}

/// HTML-escape user text. Braces are escaped too so input can never look
/// like a template slot.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '{' => escaped.push_str("&#123;"),
            '}' => escaped.push_str("&#125;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Gathering Profit Calculator</title>
  <style>
    :root {
      --bg: #f5f5f5;
      --ink: #2b2a28;
      --accent: #2196f3;
      --accent-2: #1976d2;
      --loss: #f44336;
      --card: #ffffff;
      --shadow: 0 8px 32px rgba(0, 0, 0, 0.08);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      justify-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      display: grid;
      gap: 24px;
    }

    h1 {
      margin: 0;
      text-align: center;
      color: var(--accent-2);
    }

    .card {
      background: var(--card);
      border-radius: 20px;
      box-shadow: var(--shadow);
      padding: 28px;
      display: grid;
      gap: 18px;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
      gap: 14px;
    }

    label {
      display: grid;
      gap: 6px;
      font-size: 0.9rem;
      color: #555;
    }

    input {
      font: inherit;
      padding: 10px 12px;
      border: 1px solid #d8dde3;
      border-radius: 10px;
    }

    .material-row {
      display: grid;
      grid-template-columns: 2fr 1fr 1fr auto auto;
      gap: 8px;
      align-items: center;
    }

    .line-total {
      min-width: 80px;
      text-align: right;
      color: #666;
    }

    .section-head {
      display: flex;
      justify-content: space-between;
      align-items: center;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(150px, 1fr));
      gap: 12px;
    }

    .stat {
      border-radius: 14px;
      padding: 14px;
      border: 1px solid #edf2f7;
      display: grid;
      gap: 6px;
    }

    .stat .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: #8b857d;
    }

    .stat .value {
      font-size: 1.4rem;
      font-weight: 600;
    }

    .value.net {
      color: var(--accent);
    }

    .value.loss {
      color: var(--loss);
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 12px 18px;
      font: inherit;
      font-weight: 600;
      cursor: pointer;
    }

    .btn-primary {
      background: linear-gradient(45deg, var(--accent), var(--accent-2));
      color: white;
    }

    .btn-save {
      background: #f50057;
      color: white;
    }

    .btn-ghost {
      background: transparent;
      color: #777;
      padding: 8px 12px;
    }

    .btn-link {
      background: none;
      padding: 0;
      color: var(--accent-2);
    }

    .btn-default {
      position: absolute;
      left: -9999px;
    }

    .hint {
      margin: 0;
      color: #666;
      font-size: 0.875rem;
      text-align: right;
    }

    .hint.warn {
      color: var(--loss);
    }

    .status {
      padding: 12px 16px;
      border-radius: 12px;
      background: #e3f2fd;
    }

    .status[data-type="error"] {
      background: #fdecea;
      color: #c63b2b;
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }

    .suggestion {
      margin: 0;
      color: var(--accent-2);
    }

    .entry {
      border: 1px solid #edf2f7;
      border-radius: 16px;
      padding: 18px;
      display: grid;
      gap: 10px;
    }

    .entry header {
      display: flex;
      justify-content: space-between;
      align-items: start;
    }

    .entry h3 {
      margin: 0;
    }

    .subtitle,
    .detail {
      margin: 0;
      color: #777;
      font-size: 0.9rem;
    }

    .expenses,
    .material-detail {
      list-style: none;
      margin: 0;
      padding: 0;
      display: grid;
      gap: 6px;
    }

    .expenses > li,
    .material-detail > li {
      display: flex;
      justify-content: space-between;
      gap: 12px;
    }

    .material-detail {
      padding-left: 16px;
      color: #666;
    }
  </style>
</head>
<body>
  <main class="app">
    <h1>Gathering Profit Calculator</h1>
    {{NOTICE}}

    <form class="card" method="post" action="/form">
      <button class="btn-default" type="submit" name="action" value="calculate" tabindex="-1" aria-hidden="true">Calculate</button>

      <div class="grid">
        <label>Title *
          <input name="title" value="{{TITLE}}" placeholder="What is the gathering called?" />
        </label>
        <label>Date *
          <input name="date" type="date" value="{{DATE}}" />
        </label>
        <label>Location
          <input name="location" value="{{LOCATION}}" placeholder="Where is it held?" />
        </label>
      </div>

      <div class="grid">
        <label>Participants *
          <input name="participantCount" inputmode="numeric" value="{{PARTICIPANTS}}" />
        </label>
        <label>Fee per person *
          <input name="feePerPerson" inputmode="numeric" value="{{FEE}}" />
        </label>
      </div>

      <div class="section-head">
        <strong>Materials</strong>
        <button class="btn-ghost" type="submit" name="action" value="addMaterial">+ Add item</button>
      </div>
      {{MATERIALS}}
      <p class="hint">Materials total: {{MATERIALS_TOTAL}}</p>

      <div class="grid">
        <label>Venue fee
          <input name="venueFee" inputmode="numeric" value="{{VENUE_FEE}}" />
        </label>
        <label>Platform fee (%)
          <input name="platformFeePercent" inputmode="decimal" value="{{PLATFORM_FEE}}" />
          <span class="{{PLATFORM_HINT_CLASS}}">{{PLATFORM_HINT}}</span>
        </label>
        <label>Target profit
          <input name="targetProfit" inputmode="numeric" value="{{TARGET}}" />
        </label>
      </div>

      <button class="btn-primary" type="submit" name="action" value="calculate">Calculate</button>
      {{RESULT}}
    </form>

    <section class="card">
      <h2>History</h2>
      {{HISTORY}}
    </section>
  </main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::MaterialField;
    use crate::storage::{HistoryRepository, MemoryStore};
    use chrono::Utc;
    use std::sync::Arc;

    fn filled_session() -> Session {
        let mut session = Session::new(Vec::new());
        let form = &mut session.form;
        form.set_field(FormField::Title, "Tea & <cake> {{HISTORY}}");
        form.set_field(FormField::Date, "2026-05-02");
        form.set_field(FormField::ParticipantCount, "10");
        form.set_field(FormField::FeePerPerson, "5000");
        form.add_material();
        form.update_material(0, MaterialField::Name, "scones");
        form.update_material(0, MaterialField::UnitPrice, "1000");
        form.update_material(0, MaterialField::Quantity, "3");
        session
    }

    #[test]
    fn renders_grouped_inputs_and_escapes_text() {
        let session = filled_session();
        let html = render_index(&session, None);
        assert!(html.contains(r#"value="5,000""#));
        assert!(html.contains("Tea &amp; &lt;cake&gt; &#123;&#123;HISTORY&#125;&#125;"));
        assert!(html.contains("Materials total: 3,000"));
        assert!(html.contains("No saved calculations yet."));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn platform_hint_asks_for_inputs() {
        let mut session = Session::new(Vec::new());
        session.form.set_field(FormField::PlatformFeePercent, "10");
        let html = render_index(&session, None);
        assert!(html.contains("Enter participants and fee per person first"));
    }

    #[tokio::test]
    async fn renders_result_and_history() {
        let repository = HistoryRepository::new(Arc::new(MemoryStore::default()));
        let mut session = filled_session();
        session.form.set_field(FormField::TargetProfit, "50000");
        session.calculate().unwrap();

        let html = render_index(&session, None);
        assert!(html.contains("Net profit"));
        assert!(html.contains("47,000"));
        assert!(html.contains("<strong>5,300</strong>"));

        session.save(&repository, Utc::now()).await.unwrap();
        let notice = session.take_notice();
        let html = render_index(&session, notice.as_ref());
        assert!(html.contains(r#"data-type="ok""#));
        assert!(html.contains(r#"action="/history/0/delete""#));
        assert!(html.contains(r#"aria-expanded="false""#));
        assert!(!html.contains("scones (3)"));

        session.toggle_expanded(0);
        let html = render_index(&session, None);
        assert!(html.contains("scones (3)"));
    }
}
