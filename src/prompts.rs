pub const CAPTION: &str = include_str!("../data/prompts/caption.txt");
pub const WELCOME: &str = include_str!("../data/prompts/welcome.md");
pub const CAPTION_SVG: &str = include_str!("../data/templates/caption.svg");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}
