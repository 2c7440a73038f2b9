#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Unable to fill url template to make a request. Missing variable: {0}")]
    MissingVariable(String),
    #[error("Unclosed placeholder in url template: {0}")]
    Unclosed(String),
    #[error("Single '}}' in url template: {0}")]
    UnmatchedBrace(String),
}

pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '{' if chars.peek().is_some_and(|&(_, next)| next == '{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek().is_some_and(|&(_, next)| next == '}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let rest = &template[start + 1..];
                let end = rest
                    .find('}')
                    .ok_or_else(|| TemplateError::Unclosed(template.to_string()))?;
                let name = &rest[..end];

                if name.is_empty() {
                    out.push_str("{}");
                } else {
                    let value = vars
                        .iter()
                        .find(|(key, _)| *key == name)
                        .map(|(_, value)| *value)
                        .ok_or_else(|| TemplateError::MissingVariable(name.to_string()))?;
                    out.push_str(value);
                }

                // skip the placeholder body and its closing brace
                for _ in 0..=name.chars().count() {
                    chars.next();
                }
            }
            '}' => return Err(TemplateError::UnmatchedBrace(template.to_string())),
            _ => out.push(c),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_substitutes_placeholders() {
        let cases: [(&str, &[(&str, &str)], &str); 4] = [
            ("fizz{a}buzz", &[("a", "qwerty")], "fizzqwertybuzz"),
            (
                "some{a}text{a}",
                &[("a", "qwerty"), ("b", "123")],
                "someqwertytextqwerty",
            ),
            (
                "lorem {a_placeholder} dolor://{other_placeholder_11}",
                &[
                    ("a_placeholder", "ipsum"),
                    ("other_placeholder_11", "sit"),
                    ("redundant_var", "false"),
                ],
                "lorem ipsum dolor://sit",
            ),
            ("{} no placeholders", &[("fizz", "buzz")], "{} no placeholders"),
        ];

        for (template, vars, expected) in cases {
            assert_eq!(fill_template(template, vars).unwrap(), expected);
        }
    }

    #[test]
    fn test_fill_template_repertoire_url() {
        let url = fill_template(
            "https://www.cinema-city.pl/#/buy-tickets-by-cinema?in-cinema={cinema_venue_id}&at={repertoire_date}",
            &[("cinema_venue_id", "1097"), ("repertoire_date", "2023-04-01")],
        )
        .unwrap();
        assert_eq!(
            url,
            "https://www.cinema-city.pl/#/buy-tickets-by-cinema?in-cinema=1097&at=2023-04-01"
        );
    }

    #[test]
    fn test_fill_template_escaped_braces() {
        assert_eq!(
            fill_template("{{literal}} {a}", &[("a", "x")]).unwrap(),
            "{literal} x"
        );
    }

    #[test]
    fn test_fill_template_non_ascii_text_is_preserved() {
        assert_eq!(
            fill_template("łódź/{kino}/żółw", &[("kino", "Manufaktura")]).unwrap(),
            "łódź/Manufaktura/żółw"
        );
    }

    #[test]
    fn test_fill_template_missing_variable() {
        let err = fill_template("{missing_variable}", &[("a", "sth"), ("b", "text")]).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingVariable("missing_variable".to_string())
        );
    }

    #[test]
    fn test_fill_template_single_closing_brace() {
        for template in ["a}b", "https://example.com/{id}}", "}"] {
            assert_eq!(
                fill_template(template, &[("id", "1")]),
                Err(TemplateError::UnmatchedBrace(template.to_string())),
                "template: {template:?}"
            );
        }
        assert_eq!(
            TemplateError::UnmatchedBrace("a}b".to_string()).to_string(),
            "Single '}' in url template: a}b"
        );
    }

    #[test]
    fn test_fill_template_unclosed_placeholder() {
        assert!(matches!(
            fill_template("https://example.com/{oops", &[]),
            Err(TemplateError::Unclosed(_))
        ));
    }
}
