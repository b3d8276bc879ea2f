//! HTML pages, embedded at compile time and rendered with minijinja.

use minijinja::{context, Environment};

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("chat.html", include_str!("../templates/chat.html")),
];

pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// Parse every page up front so a broken template fails at startup.
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    /// Upload form, optionally with an error line.
    pub fn index(&self, error: Option<&str>) -> Result<String, minijinja::Error> {
        self.env.get_template("index.html")?.render(context! { error })
    }

    /// Chat page, optionally with the last answer.
    pub fn chat(&self, response: Option<&str>) -> Result<String, minijinja::Error> {
        self.env.get_template("chat.html")?.render(context! { response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_shows_error() {
        let t = Templates::new().unwrap();
        let html = t.index(Some("No files uploaded.")).unwrap();
        assert!(html.contains("No files uploaded."));
        assert!(html.contains(r#"name="pdf_files""#));
        assert!(!t.index(None).unwrap().contains(r#"class="error""#));
    }

    #[test]
    fn chat_escapes_answers() {
        let t = Templates::new().unwrap();
        let html = t.chat(Some("<script>alert(1)</script>")).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains(r#"name="user_question""#));
    }
}
