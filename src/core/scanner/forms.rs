// src/core/scanner/forms.rs

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub name: String,
    /// Lower-cased `type` attribute, `text` when absent.
    pub input_type: String,
}

impl FormInput {
    /// Whether a payload should be written into this input. Buttons and hidden
    /// fields are submitted untouched.
    pub fn is_fillable(&self) -> bool {
        !matches!(self.input_type.as_str(), "submit" | "button" | "hidden")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlForm {
    /// Raw `action` attribute. `None` when the form has no action.
    pub action: Option<String>,
    /// Upper-cased `method` attribute, `GET` when absent.
    pub method: String,
    pub inputs: Vec<FormInput>,
}

impl HtmlForm {
    pub fn is_post(&self) -> bool {
        self.method == "POST"
    }
}

/// Extracts every `<form>` and its named `<input>` elements from an HTML page.
///
/// The parsed document never crosses an `.await`; callers get plain owned data.
pub fn extract_forms(html: &str) -> Vec<HtmlForm> {
    let (Ok(form_selector), Ok(input_selector)) =
        (Selector::parse("form"), Selector::parse("input[name]"))
    else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let forms: Vec<HtmlForm> = document
        .select(&form_selector)
        .map(|form| {
            let inputs = form
                .select(&input_selector)
                .filter_map(|input| {
                    let name = input.value().attr("name")?;
                    Some(FormInput {
                        name: name.to_string(),
                        input_type: input
                            .value()
                            .attr("type")
                            .unwrap_or("text")
                            .to_lowercase(),
                    })
                })
                .collect();
            HtmlForm {
                action: form.value().attr("action").map(str::to_string),
                method: form.value().attr("method").unwrap_or("GET").to_uppercase(),
                inputs,
            }
        })
        .collect();

    debug!(count = forms.len(), "Extracted HTML forms.");
    forms
}

/// Resolves a form action the way the injection tester submits it: absolute
/// URLs are kept, `/path` is joined to the origin, anything else is appended to
/// the page URL after a slash.
pub fn resolve_action(page: &Url, action: &str) -> Option<Url> {
    if action.starts_with("http") {
        return Url::parse(action).ok();
    }
    if action.starts_with('/') {
        return page.join(action).ok();
    }
    let base = page.as_str().trim_end_matches('/');
    Url::parse(&format!("{}/{}", base, action)).ok()
}
