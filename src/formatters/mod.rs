use crate::clock::Clock;
use crate::error::FormatError;
use crate::pipeline::context::LineEvent;
use crate::values::Values;

pub mod template;

pub use template::Template;

/// Turns one raw line into its annotated output
pub struct LineFormatter<C: Clock> {
    template: Template,
    stream: String,
    timestamp_pattern: String,
    clock: C,
}

impl<C: Clock> LineFormatter<C> {
    pub fn new(template: Template, stream: &str, timestamp_pattern: &str, clock: C) -> Self {
        LineFormatter {
            template,
            stream: stream.to_string(),
            timestamp_pattern: timestamp_pattern.to_string(),
            clock,
        }
    }

    /// Capture the line's metadata, merge it into `values` and render.
    /// The template decides the line ending.
    pub fn format(&self, raw_line: &str, values: &mut Values) -> Result<String, FormatError> {
        let event = LineEvent::capture(&self.stream, raw_line, &self.clock, &self.timestamp_pattern);
        event.merge_into(values);
        self.template.render(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Value;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now_epoch(&self) -> i64 {
            0
        }

        fn now_clock(&self) -> f64 {
            1.5
        }
    }

    fn formatter(src: &str, stream: &str) -> LineFormatter<FixedClock> {
        LineFormatter::new(Template::parse(src).unwrap(), stream, "%s", FixedClock)
    }

    #[test]
    fn test_format_annotates_line() {
        let f = formatter("{timestamp} {epoch} {clock} [{stdout}]\n", "stdout");
        let mut values = Values::new();
        assert_eq!(f.format("hello", &mut values).unwrap(), "0 0 1.5 [hello]\n");
        assert_eq!(values.get("stdout"), Some(&Value::Text("hello".into())));
        assert_eq!(values.get("clock"), Some(&Value::Float(1.5)));
    }

    #[test]
    fn test_no_line_ending_added() {
        let f = formatter("{input}", "input");
        let mut values = Values::new();
        assert_eq!(f.format("x", &mut values).unwrap(), "x");
    }

    #[test]
    fn test_values_persist_between_lines() {
        let f = formatter("{input}\n", "input");
        let mut values = Values::new();
        values.insert("extra", "kept");
        f.format("a", &mut values).unwrap();
        f.format("b", &mut values).unwrap();
        assert_eq!(values.get("input"), Some(&Value::Text("b".into())));
        assert_eq!(values.get("extra"), Some(&Value::Text("kept".into())));
    }

    #[test]
    fn test_other_stream_field_is_unknown() {
        let f = formatter("{stdout}\n", "stderr");
        let mut values = Values::new();
        assert_eq!(
            f.format("oops", &mut values),
            Err(FormatError::UnknownField {
                field: "stdout".to_string()
            })
        );
    }
}
