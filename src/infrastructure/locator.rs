//! Element locators
//!
//! A `Locator` is a serializable query resolved in the page by a small JS
//! prelude. Matching mirrors what a person sees: visible text, accessible
//! names, form labels and placeholders, with plain CSS as the last resort.

use anyhow::Result;
use serde::Serialize;
use std::fmt;

/// Case-insensitive JS regex
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextPattern {
    source: String,
    flags: &'static str,
}

impl TextPattern {
    /// Raw regex source (JS syntax)
    pub fn regex(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            flags: "i",
        }
    }

    /// Whole text equals `text`, surrounding whitespace ignored
    pub fn exact(text: &str) -> Self {
        Self::regex(format!(r"^\s*{}\s*$", regex::escape(text.trim())))
    }

    /// Text contains `text` literally
    pub fn contains(text: &str) -> Self {
        Self::regex(regex::escape(text))
    }

    /// Matches any text
    pub fn any() -> Self {
        Self::regex("")
    }

    /// Whole text equals `text` with vowels and `n` accent-tolerant and any
    /// whitespace run between words
    pub fn folded_exact(text: &str) -> Self {
        Self::regex(format!(r"^\s*{}\s*$", accent_tolerant(text)))
    }

    /// Text contains `text`, accent-tolerant like `folded_exact`
    pub fn folded_contains(text: &str) -> Self {
        Self::regex(accent_tolerant(text))
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

fn accent_tolerant(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .map(|c| match c.to_lowercase().next().unwrap_or(c) {
                    'a' | 'á' | 'à' | 'ä' => "[aáàä]".to_string(),
                    'e' | 'é' | 'è' | 'ë' => "[eéèë]".to_string(),
                    'i' | 'í' | 'ì' | 'ï' => "[iíìï]".to_string(),
                    'o' | 'ó' | 'ò' | 'ö' => "[oóòö]".to_string(),
                    'u' | 'ú' | 'ù' | 'ü' => "[uúùü]".to_string(),
                    'n' | 'ñ' => "[nñ]".to_string(),
                    _ => regex::escape(&c.to_string()),
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(r"\s+")
}

impl fmt::Display for TextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

/// ARIA role subset the portal uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Button,
    Link,
    Dialog,
}

/// How elements are matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Strategy {
    Css { selector: String },
    /// Innermost elements whose text matches
    Text { pattern: TextPattern },
    /// Elements of a role whose accessible name matches
    Role { role: Role, name: TextPattern },
    /// Form controls whose label matches
    Label { pattern: TextPattern },
    Placeholder { pattern: TextPattern },
    /// CSS matches whose text matches
    HasText { selector: String, pattern: TextPattern },
    /// Innermost elements containing `needle`, accents and case folded
    FoldedText { needle: String },
}

/// Which match an action targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Pick {
    First,
    Last,
}

/// Serializable element query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Locator {
    strategy: Strategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    within: Option<Box<Locator>>,
    pick: Pick,
    #[serde(rename = "visible", skip_serializing_if = "std::ops::Not::not")]
    visible_only: bool,
}

impl Locator {
    fn from_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            within: None,
            pick: Pick::First,
            visible_only: false,
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::from_strategy(Strategy::Css {
            selector: selector.into(),
        })
    }

    pub fn text(pattern: TextPattern) -> Self {
        Self::from_strategy(Strategy::Text { pattern })
    }

    pub fn role(role: Role, name: TextPattern) -> Self {
        Self::from_strategy(Strategy::Role { role, name })
    }

    pub fn label(pattern: TextPattern) -> Self {
        Self::from_strategy(Strategy::Label { pattern })
    }

    pub fn placeholder(pattern: TextPattern) -> Self {
        Self::from_strategy(Strategy::Placeholder { pattern })
    }

    pub fn has_text(selector: impl Into<String>, pattern: TextPattern) -> Self {
        Self::from_strategy(Strategy::HasText {
            selector: selector.into(),
            pattern,
        })
    }

    pub fn folded_text(needle: impl Into<String>) -> Self {
        Self::from_strategy(Strategy::FoldedText {
            needle: needle.into(),
        })
    }

    /// Restrict matches to descendants of the element `parent` picks
    pub fn within(mut self, parent: &Locator) -> Self {
        self.within = Some(Box::new(parent.clone()));
        self
    }

    /// Target the last match instead of the first
    pub fn last(mut self) -> Self {
        self.pick = Pick::Last;
        self
    }

    /// Ignore matches that are not rendered
    pub fn visible(mut self) -> Self {
        self.visible_only = true;
        self
    }

    /// Wrap `body` in a script where `els` holds every match and `el` the
    /// picked one (or `null`). `body` must `return` a JSON-able value.
    pub fn script(&self, body: &str) -> Result<String> {
        Ok(format!(
            "(() => {{\n{}\nconst spec = {};\nconst els = resolve(spec);\nconst el = pick(spec, els);\n{}\n}})()",
            LOCATOR_PRELUDE,
            serde_json::to_string(self)?,
            body
        ))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.strategy {
            Strategy::Css { selector } => write!(f, "css({})", selector)?,
            Strategy::Text { pattern } => write!(f, "text({})", pattern)?,
            Strategy::Role { role, name } => write!(f, "role({:?}, {})", role, name)?,
            Strategy::Label { pattern } => write!(f, "label({})", pattern)?,
            Strategy::Placeholder { pattern } => write!(f, "placeholder({})", pattern)?,
            Strategy::HasText { selector, pattern } => write!(f, "{}:has-text({})", selector, pattern)?,
            Strategy::FoldedText { needle } => write!(f, "folded({})", needle)?,
        }
        if self.visible_only {
            write!(f, ":visible")?;
        }
        if let Some(parent) = &self.within {
            write!(f, " in {}", parent)?;
        }
        Ok(())
    }
}

/// Ordered fallback cascade; the first locator with a match wins
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocatorChain {
    candidates: Vec<Locator>,
}

impl LocatorChain {
    pub fn new(candidates: Vec<Locator>) -> Self {
        Self { candidates }
    }

    /// Scope every candidate to `parent`
    pub fn within(self, parent: &Locator) -> Self {
        Self {
            candidates: self.candidates.into_iter().map(|l| l.within(parent)).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Locator> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl fmt::Display for LocatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.candidates.iter().map(|l| l.to_string()).collect();
        write!(f, "[{}]", parts.join(" | "))
    }
}

/// Resolver injected in front of every locator script
const LOCATOR_PRELUDE: &str = r#"
const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
const fold = (s) => norm(s).normalize('NFD').replace(/[\u0300-\u036f]/g, '').toLowerCase();
const rx = (p) => new RegExp(p.source, p.flags);
const SKIP = new Set(['HTML', 'HEAD', 'BODY', 'SCRIPT', 'STYLE', 'TITLE', 'NOSCRIPT', 'TEMPLATE']);
const ROLES = {
  button: "button, [role='button'], input[type='button'], input[type='submit'], input[type='reset']",
  link: "a[href], [role='link']",
  dialog: "dialog[open], [role='dialog'], [role='alertdialog'], [aria-modal='true']",
};
const all = (scope, css) => Array.from(scope.querySelectorAll(css));
const textOf = (el) => norm(el.textContent);
const nameOf = (el) => norm(el.getAttribute('aria-label') || el.textContent || el.value || el.getAttribute('title'));
const innermost = (els, test) => {
  const hits = els.filter((el) => !SKIP.has(el.tagName) && test(el));
  return hits.filter((el) => !hits.some((other) => other !== el && el.contains(other)));
};
const controlFor = (label) => label.control
  || (label.htmlFor ? document.getElementById(label.htmlFor) : null)
  || label.querySelector('input, select, textarea');
const visible = (el) => {
  if (!el || !el.isConnected) return false;
  const st = getComputedStyle(el);
  if (st.visibility === 'hidden' || st.display === 'none') return false;
  const r = el.getBoundingClientRect();
  return r.width > 0 && r.height > 0;
};
const actionPoint = (el) => {
  if (!visible(el) || el.disabled) return null;
  el.scrollIntoView({ block: 'center', inline: 'center' });
  const r = el.getBoundingClientRect();
  const x = r.left + r.width / 2;
  const y = r.top + r.height / 2;
  const hit = document.elementFromPoint(x, y);
  if (!hit || !(hit === el || el.contains(hit))) return null;
  return { x, y };
};
const find = (s, scope) => {
  switch (s.kind) {
    case 'css':
      return all(scope, s.selector);
    case 'text': {
      const re = rx(s.pattern);
      return innermost(all(scope, '*'), (el) => re.test(textOf(el)));
    }
    case 'role': {
      const re = rx(s.name);
      return all(scope, ROLES[s.role] || '*').filter((el) => re.test(nameOf(el)));
    }
    case 'label': {
      const re = rx(s.pattern);
      const out = [];
      for (const label of all(scope, 'label')) {
        if (!re.test(textOf(label))) continue;
        const ctl = controlFor(label);
        if (ctl && !out.includes(ctl)) out.push(ctl);
      }
      for (const el of all(scope, 'input[aria-label], select[aria-label], textarea[aria-label]')) {
        if (re.test(norm(el.getAttribute('aria-label'))) && !out.includes(el)) out.push(el);
      }
      return out;
    }
    case 'placeholder': {
      const re = rx(s.pattern);
      return all(scope, '[placeholder]').filter((el) => re.test(el.getAttribute('placeholder')));
    }
    case 'has_text': {
      const re = rx(s.pattern);
      return all(scope, s.selector).filter((el) => re.test(textOf(el)));
    }
    case 'folded_text': {
      const needle = fold(s.needle);
      return innermost(all(scope, '*'), (el) => fold(el.textContent).includes(needle));
    }
    default:
      return [];
  }
};
const pick = (spec, els) => {
  if (!els.length) return null;
  return spec.pick === 'last' ? els[els.length - 1] : els[0];
};
const resolve = (spec) => {
  let scopes = [document];
  if (spec.within) {
    const parent = pick(spec.within, resolve(spec.within));
    scopes = parent ? [parent] : [];
  }
  const out = [];
  for (const scope of scopes) {
    for (const el of find(spec.strategy, scope)) {
      if (!out.includes(el)) out.push(el);
    }
  }
  return spec.visible ? out.filter(visible) : out;
};
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exact_pattern_escapes_and_anchors() {
        let p = TextPattern::exact(" EDIFICIO A.1 ");
        assert_eq!(p.source(), r"^\s*EDIFICIO A\.1\s*$");
        assert_eq!(p.to_string(), r"/^\s*EDIFICIO A\.1\s*$/i");
    }

    #[test]
    fn test_folded_patterns_tolerate_accents() {
        assert_eq!(
            TextPattern::folded_exact("Clínica Dávila").source(),
            r"^\s*Cl[iíìï][nñ][iíìï]c[aáàä]\s+D[aáàä]v[iíìï]l[aáàä]\s*$"
        );
        assert_eq!(TextPattern::folded_contains("Sí").source(), "S[iíìï]");
    }

    #[test]
    fn test_locator_serializes_for_the_prelude() {
        let row = Locator::has_text("#tabla tr", TextPattern::contains("1-9"));
        let check = Locator::css("input[type='checkbox']").within(&row).last();

        let value = serde_json::to_value(&check).unwrap();
        assert_eq!(
            value,
            json!({
                "strategy": { "kind": "css", "selector": "input[type='checkbox']" },
                "within": {
                    "strategy": {
                        "kind": "has_text",
                        "selector": "#tabla tr",
                        "pattern": { "source": "1\\-9", "flags": "i" }
                    },
                    "pick": "first"
                },
                "pick": "last"
            })
        );
    }

    #[test]
    fn test_role_serialization() {
        let value = serde_json::to_value(Locator::role(Role::Button, TextPattern::regex("^OK$"))).unwrap();
        assert_eq!(value["strategy"]["kind"], "role");
        assert_eq!(value["strategy"]["role"], "button");
        assert!(value.get("within").is_none());
    }

    #[test]
    fn test_visible_flag_only_serialized_when_set() {
        let plain = serde_json::to_value(Locator::css(".swal2-close")).unwrap();
        assert!(plain.get("visible").is_none());

        let shown = Locator::css(".swal2-close").visible();
        assert_eq!(serde_json::to_value(&shown).unwrap()["visible"], true);
        assert_eq!(shown.to_string(), "css(.swal2-close):visible");
    }

    #[test]
    fn test_script_embeds_spec_and_body() {
        let script = Locator::css("#enviar_asistencia").script("return els.length;").unwrap();
        assert!(script.starts_with("(() => {"));
        assert!(script.contains(r##"const spec = {"strategy":{"kind":"css","selector":"#enviar_asistencia"},"pick":"first"};"##));
        assert!(script.trim_end().ends_with("return els.length;\n})()"));
    }

    #[test]
    fn test_chain_within_scopes_every_candidate() {
        let dialog = Locator::role(Role::Dialog, TextPattern::regex("."));
        let chain = LocatorChain::new(vec![Locator::css("#a"), Locator::css("#b")]).within(&dialog);
        assert_eq!(chain.len(), 2);
        assert!(chain.iter().all(|l| l.to_string().ends_with(&format!(" in {}", dialog))));
    }
}
