use crate::{
    model::{project::TokenStatus, service_node::ICONS_CDN},
    services::dashboard_service::{DashboardView, DisplayNode, QueryState},
};

pub fn escape(raw: &str) -> String
{
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars()
    {
        match c
        {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String
{
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body style=\"background:#13111c;color:#fff\">\n{}\n</body>\n</html>\n",
        escape(title),
        body
    )
}

pub fn landing_page() -> String
{
    layout(
        "Botway",
        "<main>\n<section>\n<h3>Botway 🤖</h3>\n<p>Create, build and deploy your bots, then watch them run from one dashboard.</p>\n</section>\n</main>",
    )
}

pub fn loading_page() -> String
{
    layout("Botway", "<div class=\"loading\" aria-busy=\"true\">Loading…</div>")
}

pub fn error_page(status: u16, message: &str) -> String
{
    let body = format!(
        "<main>\n<h2>{}</h2>\n<p role=\"alert\">{}</p>\n<a href=\"/\">Back to Botway</a>\n</main>",
        status,
        escape(message),
    );
    layout("Botway", &body)
}

fn token_indicator(status: TokenStatus) -> &'static str
{
    match status
    {
        TokenStatus::Ok => "<span class=\"token-status ok\" title=\"Tokens Status\">✔</span>",
        TokenStatus::Error => "<span class=\"token-status error\" title=\"Tokens Status\">✖</span>",
    }
}

fn node_row(out: &mut String, node: &DisplayNode)
{
    let kind = node.node.kind().as_str();
    out.push_str(&format!(
        "<tr>\n<td><img src=\"{}\" width=\"20\"></td>\n<td>{}</td>\n<td><span class=\"badge\">{}</span></td>\n<td><a href=\"{}\" title=\"Open at Railway\"><img src=\"{}/railway.svg\" width=\"20\"></a></td>\n</tr>\n",
        escape(&node.icon),
        escape(&node.display_name),
        kind,
        escape(&node.open_url),
        ICONS_CDN,
    ));
}

fn services_table(services: &QueryState<Vec<DisplayNode>>) -> String
{
    let mut rows = String::new();

    match services
    {
        QueryState::Loading => rows.push_str("<tr><td colspan=\"4\" aria-busy=\"true\">Loading…</td></tr>\n"),
        QueryState::Ready(nodes) if nodes.is_empty() => rows.push_str("<tr><td colspan=\"4\">No containers yet.</td></tr>\n"),
        QueryState::Ready(nodes) => nodes.iter().for_each(|node| node_row(&mut rows, node)),
        QueryState::Failed { error, retryable } =>
        {
            let hint = if *retryable { " It will be retried automatically." } else { "" };
            rows.push_str(&format!("<tr><td colspan=\"4\" role=\"alert\">{}{}</td></tr>\n", escape(error), hint));
        }
    }

    format!(
        "<table>\n<thead><tr><th></th><th>Name</th><th>Type</th><th></th></tr></thead>\n<tbody>\n{}</tbody>\n</table>",
        rows
    )
}

const INFO_PANELS: &str = "<div class=\"panels\">\n\
<a href=\"https://docker.com\" target=\"_blank\"><h4>Docker is your Container Builder</h4><p>Docker is a platform for developing, shipping, and running applications 🐳</p></a>\n\
<a href=\"https://railway.app\" target=\"_blank\"><h4>Railway is your Host Service</h4><p>Railway is a canvas for shipping your apps, databases, and more 🚄</p></a>\n\
</div>";

pub fn dashboard_page(view: &DashboardView) -> String
{
    let project = &view.project;

    let repo = match &view.repo_url
    {
        Some(url) => format!("<a href=\"{}\" target=\"_blank\">{}</a>", escape(url), escape(&project.repo)),
        None => "<span>No repository linked</span>".to_string(),
    };

    let body = format!(
        "<h1>My Bot</h1>\n<header>\n<h2>{name}</h2>\n<p>Bot Project</p>\n</header>\n\
<div class=\"repo\" data-project=\"{id}\">{repo} {status}</div>\n\
<h3>Containers</h3>\n{table}\n<h3>Infrastructure</h3>\n{panels}",
        name = escape(&project.name),
        repo = repo,
        status = token_indicator(view.token_status),
        id = escape(&project.id),
        table = services_table(&view.services),
        panels = INFO_PANELS,
    );

    layout(&project.name, &body)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::model::project::{sample_project, ProjectResponse};
    use crate::model::service_node::{NodeId, ServiceNode};

    fn view(services: QueryState<Vec<DisplayNode>>) -> DashboardView
    {
        let project = sample_project();
        DashboardView
        {
            project: ProjectResponse::from(&project),
            token_status: project.token_status(),
            repo_url: project.repo_url(),
            services,
        }
    }

    #[test]
    fn escapes_markup()
    {
        assert_eq!(escape("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
    }

    #[test]
    fn renders_rows_with_badges_and_links()
    {
        let node = DisplayNode
        {
            node: ServiceNode::Volume { id: NodeId::Text("v1".into()), name: "data".into() },
            display_name: "<data>".into(),
            icon: format!("{}/volume.svg", ICONS_CDN),
            open_url: "/api/projects/abc/open/volume/v1".into(),
        };

        let html = dashboard_page(&view(QueryState::Ready(vec![node])));

        assert!(html.contains("&lt;data&gt;"));
        assert!(html.contains("<span class=\"badge\">volume</span>"));
        assert!(html.contains("/api/projects/abc/open/volume/v1"));
        assert!(html.contains("token-status ok"));
        assert!(html.contains("https://github.com/abdfnx/my-bot"));
        assert!(html.contains("Railway is your Host Service"));
    }

    #[test]
    fn failed_services_render_a_banner_instead_of_rows()
    {
        let html = dashboard_page(&view(QueryState::Failed { error: "Not Authorized".into(), retryable: true }));
        assert!(html.contains("role=\"alert\">Not Authorized It will be retried automatically."));
        assert!(!html.contains("class=\"badge\""));

        let html = dashboard_page(&view(QueryState::Loading));
        assert!(html.contains("aria-busy"));
    }

    #[test]
    fn error_page_escapes_the_message()
    {
        let html = error_page(404, "Project <x> not found.");
        assert!(html.contains("<h2>404</h2>"));
        assert!(html.contains("Project &lt;x&gt; not found."));
    }
}
