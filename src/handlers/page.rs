use minijinja::{context, Environment};

use crate::models::Result;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

/// Renders the single upload/result page.
///
/// The `.html` template name turns on HTML auto-escaping.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("index.html", INDEX_TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn render_index(&self, result_image: Option<&str>, flower_name: Option<&str>) -> Result<String> {
        let tmpl = self.env.get_template("index.html")?;
        Ok(tmpl.render(context! {
            result_image => result_image,
            flower_name => flower_name,
        })?)
    }
}
