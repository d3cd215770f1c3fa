use jobmon_model::Params;

/// Substitute every `$key` token in `template` with its parameter value.
///
/// Keys are applied one after another, longest first (ties in lexicographic order),
/// so `$name` is never clobbered by a shorter `$n`. Tokens without a parameter stay verbatim.
pub fn render(template: &str, params: &Params) -> String {
    let mut keys: Vec<(&String, &String)> = params.iter().collect();
    keys.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    keys.into_iter()
        .fold(template.to_string(), |text, (key, value)| {
            text.replace(&format!("${key}"), value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_every_occurrence() {
        let out = render("a=$x b=$x", &params(&[("x", "5")]));
        assert_eq!(out, "a=5 b=5");
    }

    #[test]
    fn unmatched_tokens_pass_through() {
        let out = render("cmd=$cmd --level=$level", &params(&[("cmd", "run")]));
        assert_eq!(out, "cmd=run --level=$level");
    }

    #[test]
    fn longer_keys_win_over_prefixes() {
        let out = render("$n $name", &params(&[("n", "1"), ("name", "nightly")]));
        assert_eq!(out, "1 nightly");
    }

    #[test]
    fn keeps_line_structure() {
        let out = render("a=$a\r\nb=$b\n", &params(&[("a", "1"), ("b", "2")]));
        assert_eq!(out, "a=1\r\nb=2\n");
    }
}
