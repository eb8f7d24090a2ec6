pub mod ast;
pub mod content;
pub mod cookies;
pub mod id_generator;
pub mod outline;
pub mod parser;
pub mod serializer;
pub mod timestamp;

#[cfg(test)]
mod tests_parser;
#[cfg(test)]
mod tests_serializer;

pub use content::{attributed_string_to_raw_text, parse_inline_markup, parse_markup};
pub use cookies::recompute_cookies_at;
pub use id_generator::IdGenerator;
pub use parser::{parse, parse_headings, parse_title_line};
pub use serializer::serialize;
pub use timestamp::{parse_timestamp, render_timestamp};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_smoke() {
        let doc = parse("* Heading\n");
        assert_eq!(doc.headings.len(), 1);
        assert_eq!(doc.todo_keyword_sets.len(), 1);
    }
}
