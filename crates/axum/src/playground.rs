use ramhorns::{Content, Template};
use serde_json::Value;

const TEMPLATE: &str = include_str!("../templates/playground.html");

#[derive(Content)]
struct PlaygroundPage {
    playground_options: String,
}

/// Renders the GraphQL Playground page served on `GET`, initialized with `options`.
pub(crate) fn render(options: &Value) -> Result<String, ramhorns::Error> {
    let template = Template::new(TEMPLATE)?;
    let page = PlaygroundPage {
        playground_options: options.to_string(),
    };

    Ok(template.render(&page))
}
