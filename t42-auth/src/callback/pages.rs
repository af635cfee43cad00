const STYLE: &str = r#"
        body {
            margin: 0;
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
            background: #101418;
            display: flex;
            justify-content: center;
            align-items: center;
            height: 100vh;
        }
        .card {
            background: #ffffff;
            border-radius: 12px;
            padding: 40px 48px;
            box-shadow: 0 8px 32px rgba(0, 0, 0, 0.35);
            text-align: center;
            max-width: 420px;
        }
        .badge {
            width: 56px;
            height: 56px;
            border-radius: 50%;
            color: #ffffff;
            display: inline-flex;
            align-items: center;
            justify-content: center;
            font-size: 28px;
            margin-bottom: 20px;
        }
        .ok { background: #00babc; }
        .fail { background: #e4505a; }
        h1 { color: #1f2937; margin: 0 0 12px 0; font-size: 22px; }
        p { color: #6b7280; margin: 0 0 16px 0; line-height: 1.5; }
        code {
            display: block;
            background: #fdecee;
            border-radius: 8px;
            padding: 12px;
            color: #8a1c24;
            font-size: 13px;
            word-break: break-word;
        }
"#;

pub fn success_page() -> String {
    render(
        "Login complete",
        r#"<div class="badge ok">&#10003;</div>
        <h1>t42 is authorized</h1>
        <p>You can close this tab and return to your terminal.</p>"#,
    )
}

pub fn error_page(message: &str) -> String {
    render(
        "Login failed",
        &format!(
            r#"<div class="badge fail">&#10007;</div>
        <h1>Authorization failed</h1>
        <code>{}</code>
        <p>Close this tab and run <b>t42 auth login</b> again.</p>"#,
            escape(message)
        ),
    )
}

fn render(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
    <div class="card">
        {body}
    </div>
</body>
</html>"#
    )
}

fn escape(text: &str) -> String {
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
