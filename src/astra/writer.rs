// astra/writer.rs
//! Renders new astra.conf statements for `ConfigStore::append`.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern"));

const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Names the statement parser accepts as a binding
pub fn is_valid_variable(name: &str) -> bool {
    IDENTIFIER.is_match(name) && !LUA_KEYWORDS.contains(&name)
}

/// A new T2MI decap feeding a local http output
#[derive(Debug, Clone)]
pub struct NewDecap<'a> {
    pub variable: &'a str,
    pub name: &'a str,
    pub pid: u16,
    pub plp: Option<u8>,
    /// Source stream, usually the receiver's own http stream of the tuned service
    pub input: &'a str,
    pub output: &'a str,
}

/// A piped channel from an input url straight to an output url
#[derive(Debug, Clone)]
pub struct NewPassThrough<'a> {
    pub name: &'a str,
    pub input: &'a str,
    pub output: &'a str,
    pub command: &'a str,
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Decap statement plus the channel that routes it
pub fn render_decap(decap: &NewDecap<'_>) -> Result<String> {
    if !is_valid_variable(decap.variable) {
        return Err(Error::InvalidVariable(decap.variable.to_string()));
    }
    let mut out = format!(
        "{} = make_t2mi_decap({{\n    name = {},\n    input = {},\n",
        decap.variable,
        quote(decap.name),
        quote(decap.input)
    );
    if let Some(plp) = decap.plp {
        out.push_str(&format!("    plp = {plp},\n"));
    }
    out.push_str(&format!("    pid = {},\n}})\n\n", decap.pid));
    out.push_str(&render_channel(
        decap.name,
        &format!("t2mi://{}", decap.variable),
        decap.output,
    ));
    Ok(out)
}

pub fn render_channel(name: &str, input: &str, output: &str) -> String {
    format!(
        "make_channel({{\n    name = {},\n    input = {{ {}, }},\n    output = {{ {}, }},\n}})\n",
        quote(name),
        quote(input),
        quote(output)
    )
}

pub fn render_pass_through(channel: &NewPassThrough<'_>) -> String {
    format!(
        "make_channel({{\n    name = {},\n    input = {{ {}, }},\n    output = {{ {}, }},\n    transform = {{\n        {{\n            format = \"pipe\",\n            command = {},\n        }},\n    }},\n}})\n",
        quote(channel.name),
        quote(channel.input),
        quote(channel.output),
        quote(channel.command)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astra::ConfigParser;

    #[test]
    fn test_rendered_decap_resolves() {
        let text = render_decap(&NewDecap {
            variable: "t2mi_4096",
            name: "Feed \"B\"",
            pid: 4096,
            plp: Some(2),
            input: "http://127.0.0.1:8001/1:0:1:1:2:3:0:0:0:0:",
            output: "http://0.0.0.0:9999/t2mi4096",
        })
        .unwrap();
        assert!(text.contains("plp = 2,"));
        let cfg = ConfigParser::default().parse(&text);
        let block = &cfg.decap_routed["t2mi_4096"];
        assert_eq!(block.display_name, "Feed \"B\"");
        assert_eq!(block.marker_id, "4096");
        assert_eq!(block.output_url, "http://0.0.0.0:9999/t2mi4096");
    }

    #[test]
    fn test_invalid_variable_rejected() {
        for variable in ["t2mi-4096", "4096", "", "local", "a b"] {
            let result = render_decap(&NewDecap {
                variable,
                name: "X",
                pid: 1,
                plp: None,
                input: "http://h/in",
                output: "http://h/out",
            });
            assert!(matches!(result, Err(Error::InvalidVariable(ref v)) if v == variable), "{variable:?}");
        }
        assert!(is_valid_variable("_t2mi_4096"));
    }

    #[test]
    fn test_every_accepted_variable_parses_back() {
        for variable in ["d", "_x", "decap10", "T2MI_feed_2"] {
            let text = render_decap(&NewDecap {
                variable,
                name: "X",
                pid: 7,
                plp: None,
                input: "http://h/in",
                output: "http://h/out",
            })
            .unwrap();
            let cfg = ConfigParser::default().parse(&text);
            assert_eq!(cfg.decap_routed[variable].marker_id, "7");
        }
    }

    #[test]
    fn test_rendered_pass_through_resolves() {
        let text = render_pass_through(&NewPassThrough {
            name: "Abertis 801",
            input: "http://127.0.0.1:8001/1:0:1:3:4:5:0:0:0:0:",
            output: "http://0.0.0.0:9999/abertis/pid801",
            command: "abertis-unpack --pid 801",
        });
        let cfg = ConfigParser::default().parse(&text);
        let block = cfg.pass_through.values().next().unwrap();
        assert_eq!(block.marker_id, "801");
        assert_eq!(block.display_name, "Abertis 801");
    }
}
