//! Self-contained HTML dashboard.
//!
//! One output file, no external assets: styles and the filter/sort script are
//! inlined, findings are embedded as a JSON blob and rendered client-side.

use std::path::Path;

use crate::audit::types::Severity;
use crate::audit::AuditOutcome;

const STYLE: &str = r#"
  :root { --err: #c0392b; --warn: #b7791f; --info: #2b6cb0; }
  body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 70rem; color: #222; }
  h1 { font-size: 1.4rem; }
  .cards { display: flex; gap: 1rem; margin: 1rem 0; }
  .card { border: 1px solid #ddd; border-radius: 6px; padding: 0.8rem 1.2rem; min-width: 7rem; }
  .card .num { font-size: 1.6rem; font-weight: 700; }
  .card.err .num { color: var(--err); }
  .card.warn .num { color: var(--warn); }
  .card.info .num { color: var(--info); }
  .filters { margin: 1rem 0; }
  .filters label { margin-right: 1rem; }
  table { border-collapse: collapse; width: 100%; }
  th, td { text-align: left; padding: 0.4rem 0.6rem; border-bottom: 1px solid #eee; }
  th { cursor: pointer; user-select: none; background: #fafafa; }
  td.sev-error { color: var(--err); font-weight: 600; }
  td.sev-warning { color: var(--warn); }
  td.sev-info { color: var(--info); }
  td .sugg { color: #666; font-size: 0.85rem; }
  .meta { color: #666; font-size: 0.9rem; }
"#;

const SCRIPT: &str = r#"
  const data = JSON.parse(document.getElementById('findings-data').textContent);
  let sortKey = null, sortAsc = true;

  function activeSeverities() {
    return [...document.querySelectorAll('input[data-sev]:checked')].map(cb => cb.dataset.sev);
  }
  function activeKind() {
    return document.getElementById('kind-filter').value;
  }
  function render() {
    const sevs = activeSeverities();
    const kind = activeKind();
    let rows = data.filter(f => sevs.includes(f.severity) && (kind === 'all' || f.kind === kind));
    if (sortKey) {
      rows = rows.slice().sort((a, b) => {
        const x = a[sortKey], y = b[sortKey];
        const c = typeof x === 'number' ? x - y : String(x).localeCompare(String(y));
        return sortAsc ? c : -c;
      });
    }
    const body = document.getElementById('rows');
    body.innerHTML = '';
    for (const f of rows) {
      const tr = document.createElement('tr');
      const cells = [
        { text: f.severity, cls: 'sev-' + f.severity },
        { text: f.kind },
        { text: f.line > 0 ? f.file + ':' + f.line : f.file },
        { text: f.message, sugg: f.suggestion },
      ];
      for (const c of cells) {
        const td = document.createElement('td');
        if (c.cls) td.className = c.cls;
        td.textContent = c.text;
        if (c.sugg) {
          const div = document.createElement('div');
          div.className = 'sugg';
          div.textContent = 'fix: ' + c.sugg;
          td.appendChild(div);
        }
        tr.appendChild(td);
      }
      body.appendChild(tr);
    }
    document.getElementById('shown').textContent = rows.length;
  }
  for (const cb of document.querySelectorAll('input[data-sev]')) cb.addEventListener('change', render);
  document.getElementById('kind-filter').addEventListener('change', render);
  for (const th of document.querySelectorAll('th[data-key]')) {
    th.addEventListener('click', () => {
      const key = th.dataset.key;
      sortAsc = sortKey === key ? !sortAsc : true;
      sortKey = key;
      render();
    });
  }
  render();
"#;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render the dashboard document.
pub fn render_dashboard(path: &str, outcome: &AuditOutcome) -> anyhow::Result<String> {
    let mut kinds: Vec<&str> = outcome.findings.iter().map(|f| f.kind.as_str()).collect();
    kinds.sort_unstable();
    kinds.dedup();
    let kind_options: String = kinds
        .iter()
        .map(|k| format!("<option value=\"{0}\">{0}</option>", k))
        .collect();

    // `</` must not appear inside the embedded JSON script block.
    let data = serde_json::to_string(&outcome.findings)?.replace("</", "<\\/");

    Ok(format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>stackaudit: {path}</title>
<style>{style}</style>
</head>
<body>
<h1>stackaudit report</h1>
<p class="meta">{path} &middot; v{version} &middot; auditors: {auditors}</p>
<div class="cards">
  <div class="card err"><div class="num">{errors}</div>errors</div>
  <div class="card warn"><div class="num">{warnings}</div>warnings</div>
  <div class="card info"><div class="num">{infos}</div>info</div>
</div>
<div class="filters">
  <label><input type="checkbox" data-sev="error" checked> errors</label>
  <label><input type="checkbox" data-sev="warning" checked> warnings</label>
  <label><input type="checkbox" data-sev="info" checked> info</label>
  <label>auditor
    <select id="kind-filter"><option value="all">all</option>{kind_options}</select>
  </label>
  <span class="meta">showing <span id="shown">0</span> of {total}</span>
</div>
<table>
  <thead><tr>
    <th data-key="severity">severity</th>
    <th data-key="kind">auditor</th>
    <th data-key="file">location</th>
    <th data-key="message">message</th>
  </tr></thead>
  <tbody id="rows"></tbody>
</table>
<script type="application/json" id="findings-data">{data}</script>
<script>{script}</script>
</body>
</html>
"#,
        path = escape(path),
        version = env!("CARGO_PKG_VERSION"),
        auditors = escape(&outcome.auditors_run.join(", ")),
        errors = outcome.count(Severity::Error),
        warnings = outcome.count(Severity::Warning),
        infos = outcome.count(Severity::Info),
        total = outcome.findings.len(),
        kind_options = kind_options,
        data = data,
        style = STYLE,
        script = SCRIPT,
    ))
}

/// Render and write the dashboard to a file.
pub fn write_dashboard(out: &Path, path: &str, outcome: &AuditOutcome) -> anyhow::Result<()> {
    let html = render_dashboard(path, outcome)?;
    std::fs::write(out, html)?;
    Ok(())
}
