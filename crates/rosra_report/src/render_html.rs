//! Self-contained HTML rendering (no external assets).
//!
//! The template is named `*.html`, so minijinja auto-escapes every
//! interpolated value, titles and category-derived text included.

use minijinja::{context, Environment};

use crate::{ReportError, ReportModel};

static TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{{ m.cover.title }}</title></head>
<body>
<h1>{{ m.cover.title }}</h1>
{% if m.cover.period_label %}<p class="period">{{ m.cover.period_label }}</p>
{% endif %}<p class="overall">{{ m.cover.overall }}</p>

<h2>Summary</h2>
<table class="totals">
<tr><th>Actual revenue</th><td>{{ m.totals.actual }}</td></tr>
<tr><th>Potential revenue</th><td>{{ m.totals.potential }}</td></tr>
<tr><th>Total gap</th><td>{{ m.totals.combined_gap }}</td></tr>
<tr><th>Potential leveraged</th><td>{{ m.totals.potential_leveraged }} ({{ m.totals.band }})</td></tr>
</table>
<table class="components">
{% for c in m.totals.components %}<tr><th>{{ c.name }} gap</th><td>{{ c.amount }}</td></tr>
{% endfor %}<tr><th>Combined gaps</th><td>{{ m.totals.combined_residual }}</td></tr>
</table>

<h2>Key findings</h2>
<p>{{ m.findings.largest_stream }}</p>
<p>{{ m.findings.largest_gap_type }}</p>

<h2>Revenue streams</h2>
{% for s in m.streams %}<section id="{{ s.code }}">
<h3>{{ s.label }}</h3>
<p>{{ s.category_count }} categories. Actual {{ s.actual }}, potential {{ s.potential }}, gap {{ s.gap }}. Potential leveraged {{ s.potential_leveraged }} ({{ s.band }}).</p>
<ul>
{% for c in s.components %}<li>{{ c.name }}: {{ c.amount }}</li>
{% endfor %}</ul>
{% if s.illustrative_rate_gap %}<p class="note">Illustrative rate gap, not included in totals: {{ s.illustrative_rate_gap }}</p>
{% endif %}<p>{{ s.narrative }}</p>
</section>
{% endfor %}
<h2>Integrity</h2>
<p>Result {{ m.integrity.result_id }}<br>Run {{ m.integrity.run_id }} at {{ m.integrity.timestamp_utc }}</p>
<p>Engine {{ m.integrity.engine_vendor }}/{{ m.integrity.engine_name }} v{{ m.integrity.engine_version }} ({{ m.integrity.engine_build }}), rate gap policy {{ m.integrity.rate_gap_policy }}, {{ m.integrity.validation_warnings }} validation warning(s)</p>
</body>
</html>
"#;

pub fn render_html(model: &ReportModel) -> Result<String, ReportError> {
    let mut env = Environment::new();
    env.add_template("report.html", TEMPLATE)
        .map_err(|e| ReportError::Template(format!("add_template: {e}")))?;
    let tmpl = env
        .get_template("report.html")
        .map_err(|e| ReportError::Template(format!("get_template: {e}")))?;
    tmpl.render(context! { m => model })
        .map_err(|e| ReportError::Template(format!("render_html: {e}")))
}
